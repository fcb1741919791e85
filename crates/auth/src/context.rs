//! Per-request authorization context and its resolver.

use std::sync::Arc;

use thiserror::Error;

use scopegate_core::{ActorId, ProjectId, TenantId};

use crate::cache::CacheKey;
use crate::{Decision, ReasonCode, Session, StoreError, TenantResolutionService};

/// Resolved identity for one request: who is acting, in which tenant, against
/// which project.
///
/// Built once per request by [`ContextResolver`] and passed explicitly
/// through the rest of the pipeline. Never mutated after construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AuthContext {
    actor_id: ActorId,
    tenant_id: TenantId,
    project_id: Option<ProjectId>,
}

impl AuthContext {
    pub fn new(actor_id: ActorId, tenant_id: TenantId, project_id: Option<ProjectId>) -> Self {
        Self {
            actor_id,
            tenant_id,
            project_id,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from(self)
    }
}

/// Raw inputs the transport layer extracted from a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextRequest {
    /// Authenticated session; the only trusted source of the actor id.
    pub session: Option<Session>,
    /// Tenant attached by an upstream tenant-selection step.
    pub selected_tenant: Option<TenantId>,
    /// Project id from the route, when the route declares a project parameter.
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no authenticated actor on the request")]
    MissingActor,

    #[error("no tenant could be resolved for the request")]
    MissingTenant,

    #[error("tenant resolution failed: {0}")]
    Store(#[from] StoreError),
}

impl ContextError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            ContextError::MissingActor => ReasonCode::Unauthenticated,
            ContextError::MissingTenant => ReasonCode::MissingTenant,
            ContextError::Store(_) => ReasonCode::StoreUnavailable,
        }
    }

    pub fn decision(&self) -> Decision {
        Decision::deny(self.reason_code())
    }
}

/// Builds [`AuthContext`] values from request inputs.
///
/// Tenant priority: selected tenant, then the tenant resolution service, then
/// the session's legacy tenant field. First match wins.
pub struct ContextResolver {
    tenants: Arc<dyn TenantResolutionService>,
}

impl ContextResolver {
    pub fn new(tenants: Arc<dyn TenantResolutionService>) -> Self {
        Self { tenants }
    }

    pub async fn resolve(&self, request: &ContextRequest) -> Result<AuthContext, ContextError> {
        let session = request.session.ok_or(ContextError::MissingActor)?;
        let actor_id = session.actor_id();

        let tenant_id = match request.selected_tenant {
            Some(tenant_id) => tenant_id,
            None => match self.tenants.resolve_active_tenant_id(actor_id).await? {
                Some(tenant_id) => tenant_id,
                None => session.legacy_tenant_id().ok_or_else(|| {
                    tracing::info!(actor_id = %actor_id, "no tenant resolvable for actor");
                    ContextError::MissingTenant
                })?,
            },
        };

        Ok(AuthContext::new(actor_id, tenant_id, request.project_id))
    }
}
