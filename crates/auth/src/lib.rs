//! `scopegate-auth` — scope-aware role/permission authorization engine.
//!
//! This crate is intentionally decoupled from HTTP and storage: stores and
//! the tenant resolution service are traits implemented by `scopegate-infra`,
//! and the transport mapping lives in `scopegate-api`.

pub mod authorize;
pub mod cache;
pub mod catalog;
pub mod claims;
pub mod context;
pub mod decision;
pub mod guard;
pub mod isolation;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod scope;
pub mod store;

#[cfg(test)]
mod testing;

pub use authorize::{Authorizer, PermissionResolver, ResolveError};
pub use cache::{CacheKey, DecisionCache, Generation, RequestCache, SharedDecisionCache};
pub use catalog::{CatalogError, RoleCatalog, RoleDefinition, SharedRoleCatalog, StaticRoleCatalog};
pub use claims::{Session, SessionClaims, TokenValidationError, validate_claims};
pub use context::{AuthContext, ContextError, ContextRequest, ContextResolver};
pub use decision::{AuthorizationFailure, Decision, ReasonCode};
pub use guard::Guard;
pub use isolation::{TenantOwned, check_isolation, check_isolation_of};
pub use permissions::{Permission, perms};
pub use resolver::{EffectivePermissionSet, ProjectScopedPermissions, resolve, system_admin_override};
pub use roles::Role;
pub use scope::{AssignmentScope, RoleAssignment, Scope};
pub use store::{AssignmentStore, ProjectDirectory, StoreError, TenantResolutionService};
