//! Tenant and project directories backing context resolution and the gate.

pub mod projects;
pub mod tenants;

pub use projects::InMemoryProjectDirectory;
pub use tenants::InMemoryTenantDirectory;
