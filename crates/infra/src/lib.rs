//! Infrastructure layer: configuration and storage adapters for the engine.

pub mod assignment_store;
pub mod config;
pub mod directory;

pub use assignment_store::{InMemoryAssignmentStore, PostgresAssignmentStore};
pub use config::{ConfigError, EngineConfig};
pub use directory::{InMemoryProjectDirectory, InMemoryTenantDirectory};
