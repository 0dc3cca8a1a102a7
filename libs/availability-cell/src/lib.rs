pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

// Re-export the models and services for external use
pub use models::*;
pub use repository::{RepositoryError, ScheduleRepository, SupabaseScheduleRepository};
pub use services::*;
