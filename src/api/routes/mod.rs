pub mod catalog;
pub mod queries;
