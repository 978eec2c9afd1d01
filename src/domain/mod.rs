pub mod page;
pub mod pull_request;
pub mod status;
pub mod ticket;
