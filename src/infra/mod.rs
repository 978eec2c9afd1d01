pub mod confluence;
pub mod jira;
