//! Role assignment storage adapters.

pub mod in_memory;
mod invalidation;
pub mod postgres;

pub use in_memory::InMemoryAssignmentStore;
pub use postgres::PostgresAssignmentStore;
