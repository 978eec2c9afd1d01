pub mod issue_tracker;
pub mod wiki;

pub use issue_tracker::IssueTrackerService;
pub use wiki::WikiService;
