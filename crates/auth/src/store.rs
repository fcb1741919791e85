//! Read interfaces this engine consumes.
//!
//! The write paths (granting roles, creating projects, choosing a default
//! tenant) live elsewhere; the engine only ever reads through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use scopegate_core::{ActorId, ProjectId, TenantId};

use crate::RoleAssignment;

/// Infrastructure failure while reading authorization data.
///
/// Every variant is treated as fail-closed by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Per-actor role assignments.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn list_assignments(&self, actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError>;
}

/// Session-default / fallback tenant lookup.
#[async_trait]
pub trait TenantResolutionService: Send + Sync {
    async fn resolve_active_tenant_id(&self, actor_id: ActorId) -> Result<Option<TenantId>, StoreError>;
}

/// Resource loader for projects: which tenant owns a project.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn tenant_of_project(&self, project_id: ProjectId) -> Result<Option<TenantId>, StoreError>;
}

#[async_trait]
impl<S> AssignmentStore for Arc<S>
where
    S: AssignmentStore + ?Sized,
{
    async fn list_assignments(&self, actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        (**self).list_assignments(actor_id).await
    }
}

#[async_trait]
impl<S> TenantResolutionService for Arc<S>
where
    S: TenantResolutionService + ?Sized,
{
    async fn resolve_active_tenant_id(&self, actor_id: ActorId) -> Result<Option<TenantId>, StoreError> {
        (**self).resolve_active_tenant_id(actor_id).await
    }
}

#[async_trait]
impl<S> ProjectDirectory for Arc<S>
where
    S: ProjectDirectory + ?Sized,
{
    async fn tenant_of_project(&self, project_id: ProjectId) -> Result<Option<TenantId>, StoreError> {
        (**self).tenant_of_project(project_id).await
    }
}
