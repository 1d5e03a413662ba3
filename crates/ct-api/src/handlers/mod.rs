pub mod candidates;
pub mod health;
pub mod metrics;
pub mod pagination;
pub mod reports;
