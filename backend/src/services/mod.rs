pub mod reports;
pub mod requests;
