pub mod report;
pub mod request;
pub mod user;
