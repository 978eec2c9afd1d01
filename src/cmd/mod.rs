pub mod call;
pub mod config;
pub mod sign;
pub mod tools;
