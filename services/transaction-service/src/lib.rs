pub mod config;
pub mod coordinator;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod publisher;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use coordinator::{Committed, IngestionCoordinator};
pub use errors::ServiceError;
pub use handlers::{create_router, AppState};
pub use publisher::EventPublisher;
