//! Application use cases. Orchestrate domain logic via ports.

pub mod data_service;
pub mod retention;
pub mod seed;

pub use data_service::DataService;
pub use retention::{RetentionPolicy, RetentionSweeper, SweepReport};
pub use seed::seed_demo_data;
