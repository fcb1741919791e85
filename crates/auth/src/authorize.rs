//! Permission checks: resolution service plus the per-request [`Authorizer`].
//!
//! - No panics
//! - Fail-closed: any store failure produces a denying decision
//! - No business logic (pure policy evaluation over read interfaces)

use std::sync::Arc;

use thiserror::Error;

use scopegate_core::TenantId;

use crate::cache::{DecisionCache, RequestCache, SharedDecisionCache};
use crate::isolation::{check_isolation, check_isolation_of, TenantOwned};
use crate::resolver::{resolve, EffectivePermissionSet, ProjectScopedPermissions};
use crate::{
    AssignmentStore, AuthContext, AuthorizationFailure, Decision, Permission, ReasonCode, RoleCatalog,
    StoreError,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("assignment store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Expands assignments into effective permission sets and answers checks.
///
/// Shared process-wide behind an `Arc`; holds no per-request state.
pub struct PermissionResolver {
    assignments: Arc<dyn AssignmentStore>,
    catalog: Arc<dyn RoleCatalog>,
    project_scoped: ProjectScopedPermissions,
    shared_cache: Option<Arc<SharedDecisionCache>>,
}

impl PermissionResolver {
    pub fn new(assignments: Arc<dyn AssignmentStore>, catalog: Arc<dyn RoleCatalog>) -> Self {
        Self {
            assignments,
            catalog,
            project_scoped: ProjectScopedPermissions::default(),
            shared_cache: None,
        }
    }

    pub fn with_project_scoped(mut self, project_scoped: ProjectScopedPermissions) -> Self {
        self.project_scoped = project_scoped;
        self
    }

    /// Enable cross-request caching. Off unless configured.
    pub fn with_shared_cache(mut self, cache: Arc<SharedDecisionCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    pub fn requires_project(&self, permission: &Permission) -> bool {
        self.project_scoped.requires_project(permission)
    }

    /// Effective permission set for `context`, consulting `cache` (and the
    /// shared cache, when configured) before reading the assignment store.
    pub async fn effective_permissions(
        &self,
        context: &AuthContext,
        cache: &dyn DecisionCache,
    ) -> Result<Arc<EffectivePermissionSet>, ResolveError> {
        let key = context.cache_key();

        if let Some(set) = cache.get(&key) {
            return Ok(set);
        }

        if let Some(shared) = &self.shared_cache {
            if let Some(set) = shared.get(&key) {
                tracing::debug!(actor_id = %context.actor_id(), "effective permissions served from shared cache");
                cache.put(key, set.clone());
                return Ok(set);
            }
        }

        let generation = self
            .shared_cache
            .as_ref()
            .and_then(|shared| shared.generation(context.actor_id()));
        let assignments = self.assignments.list_assignments(context.actor_id()).await?;
        let set = Arc::new(resolve(&assignments, self.catalog.as_ref(), context));

        tracing::debug!(
            actor_id = %context.actor_id(),
            tenant_id = %context.tenant_id(),
            assignments = assignments.len(),
            granted = set.len(),
            system_admin = set.is_system_admin(),
            "effective permissions resolved"
        );

        cache.put(key, set.clone());
        if let (Some(shared), Some(generation)) = (&self.shared_cache, generation) {
            if !shared.put_if_generation(key, set.clone(), generation) {
                tracing::debug!(
                    actor_id = %context.actor_id(),
                    "assignments changed during resolution; shared cache left untouched"
                );
            }
        }
        Ok(set)
    }

    /// Decide whether the actor in `context` holds `permission`.
    pub async fn check(
        &self,
        permission: &Permission,
        context: &AuthContext,
        cache: &dyn DecisionCache,
    ) -> Decision {
        if self.requires_project(permission) && context.project_id().is_none() {
            tracing::info!(
                actor_id = %context.actor_id(),
                permission = %permission,
                "project-scoped permission checked without a project in context"
            );
            return Decision::deny_permission(ReasonCode::NoProjectContext, permission.clone());
        }

        match self.effective_permissions(context, cache).await {
            Ok(set) if set.contains(permission) => {
                tracing::debug!(actor_id = %context.actor_id(), permission = %permission, "permission granted");
                Decision::allow()
            }
            Ok(_) => {
                tracing::info!(
                    actor_id = %context.actor_id(),
                    tenant_id = %context.tenant_id(),
                    permission = %permission,
                    "permission denied"
                );
                Decision::deny_permission(ReasonCode::MissingPermission, permission.clone())
            }
            Err(err) => {
                tracing::warn!(
                    actor_id = %context.actor_id(),
                    permission = %permission,
                    error = %err,
                    "authorization data unavailable; denying"
                );
                Decision::deny_permission(ReasonCode::StoreUnavailable, permission.clone())
            }
        }
    }
}

/// Request-scoped handle: one resolved [`AuthContext`] plus its request cache.
///
/// The enforcement gate attaches it to the request; handlers and guards reuse
/// it so a request resolves its context and permission set at most once.
#[derive(Clone)]
pub struct Authorizer {
    resolver: Arc<PermissionResolver>,
    context: AuthContext,
    cache: Arc<RequestCache>,
}

impl Authorizer {
    pub fn new(resolver: Arc<PermissionResolver>, context: AuthContext) -> Self {
        Self {
            resolver,
            context,
            cache: Arc::new(RequestCache::new()),
        }
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    pub async fn check(&self, permission: &Permission) -> Decision {
        self.resolver.check(permission, &self.context, self.cache.as_ref()).await
    }

    pub async fn authorize(&self, permission: &Permission) -> Result<(), AuthorizationFailure> {
        self.check(permission).await.into_result()
    }

    pub async fn effective_permissions(&self) -> Result<Arc<EffectivePermissionSet>, ResolveError> {
        self.resolver
            .effective_permissions(&self.context, self.cache.as_ref())
            .await
    }

    pub fn check_isolation(&self, resource_tenant_id: TenantId) -> Decision {
        check_isolation(&self.context, resource_tenant_id)
    }

    /// Isolation first, then permission. A tenant mismatch never reaches the
    /// permission resolver.
    pub async fn check_resource<R>(&self, resource: &R, permission: &Permission) -> Decision
    where
        R: TenantOwned + ?Sized,
    {
        let isolation = check_isolation_of(&self.context, resource);
        if !isolation.allowed {
            return isolation;
        }
        self.check(permission).await
    }
}

impl core::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authorizer").field("context", &self.context).finish_non_exhaustive()
    }
}
