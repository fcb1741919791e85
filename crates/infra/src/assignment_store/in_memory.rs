use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use scopegate_auth::{AssignmentStore, RoleAssignment, SharedDecisionCache, StoreError};
use scopegate_core::ActorId;

use super::invalidation::Invalidation;

/// In-memory assignment store for tests/dev.
///
/// Grants and revocations invalidate the actor's entries in the attached
/// [`SharedDecisionCache`], if any.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    inner: RwLock<HashMap<ActorId, Vec<RoleAssignment>>>,
    invalidation: Invalidation,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invalidation(mut self, cache: Arc<SharedDecisionCache>) -> Self {
        self.invalidation = Invalidation::new(cache);
        self
    }

    /// Grant `assignment` to `actor_id`. Granting an existing assignment is a no-op.
    pub fn grant(&self, actor_id: ActorId, assignment: RoleAssignment) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("assignment store lock poisoned"))?;
        let assignments = map.entry(actor_id).or_default();
        if !assignments.contains(&assignment) {
            tracing::info!(
                actor_id = %actor_id,
                role = %assignment.role,
                scope = %assignment.scope_kind(),
                "role granted"
            );
            assignments.push(assignment);
        }
        drop(map);

        self.invalidation.publish(actor_id);
        Ok(())
    }

    /// Remove `assignment`; returns whether it was present.
    pub fn revoke(&self, actor_id: ActorId, assignment: &RoleAssignment) -> Result<bool, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("assignment store lock poisoned"))?;
        let removed = match map.get_mut(&actor_id) {
            Some(assignments) => {
                let before = assignments.len();
                assignments.retain(|a| a != assignment);
                before != assignments.len()
            }
            None => false,
        };
        drop(map);

        if removed {
            tracing::info!(actor_id = %actor_id, role = %assignment.role, "role revoked");
            self.invalidation.publish(actor_id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn list_assignments(&self, actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("assignment store lock poisoned"))?;
        Ok(map.get(&actor_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use scopegate_auth::catalog::{SITE_MEMBER, VIEWER};
    use scopegate_auth::{
        perms, AuthContext, Authorizer, PermissionResolver, StaticRoleCatalog,
    };
    use scopegate_core::{ProjectId, TenantId};

    #[tokio::test]
    async fn grant_is_idempotent_and_revoke_removes() {
        let store = InMemoryAssignmentStore::new();
        let actor = ActorId::new();
        let assignment = RoleAssignment::tenant(VIEWER, TenantId::new());

        store.grant(actor, assignment.clone()).unwrap();
        store.grant(actor, assignment.clone()).unwrap();
        assert_eq!(store.list_assignments(actor).await.unwrap().len(), 1);

        assert!(store.revoke(actor, &assignment).unwrap());
        assert!(!store.revoke(actor, &assignment).unwrap());
        assert!(store.list_assignments(actor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_actor_has_no_assignments() {
        let store = InMemoryAssignmentStore::new();
        assert!(store.list_assignments(ActorId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grant_invalidates_shared_cache() {
        let shared = Arc::new(SharedDecisionCache::new(Duration::from_secs(60)));
        let store = Arc::new(InMemoryAssignmentStore::new().with_invalidation(shared.clone()));
        let resolver = Arc::new(
            PermissionResolver::new(store.clone(), Arc::new(StaticRoleCatalog::builtin()))
                .with_shared_cache(shared.clone()),
        );

        let actor = ActorId::new();
        let tenant = TenantId::new();
        let project = ProjectId::new();
        let ctx = AuthContext::new(actor, tenant, Some(project));

        let before = Authorizer::new(resolver.clone(), ctx).check(&perms::TASK_CREATE).await;
        assert!(!before.allowed);
        assert!(!shared.is_empty());

        store.grant(actor, RoleAssignment::project(SITE_MEMBER, project)).unwrap();
        assert!(shared.is_empty());

        let after = Authorizer::new(resolver, ctx).check(&perms::TASK_CREATE).await;
        assert!(after.allowed);
    }
}
