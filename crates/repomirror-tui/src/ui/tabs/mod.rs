pub mod dashboard;
pub mod repositories;
