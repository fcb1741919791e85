use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use scopegate_auth::{StoreError, TenantResolutionService};
use scopegate_core::{ActorId, TenantId};

/// Each actor's active (default) tenant, for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    active: RwLock<HashMap<ActorId, TenantId>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_tenant(&self, actor_id: ActorId, tenant_id: TenantId) {
        if let Ok(mut map) = self.active.write() {
            map.insert(actor_id, tenant_id);
        }
    }

    pub fn clear_active_tenant(&self, actor_id: ActorId) {
        if let Ok(mut map) = self.active.write() {
            map.remove(&actor_id);
        }
    }
}

#[async_trait]
impl TenantResolutionService for InMemoryTenantDirectory {
    async fn resolve_active_tenant_id(&self, actor_id: ActorId) -> Result<Option<TenantId>, StoreError> {
        let map = self
            .active
            .read()
            .map_err(|_| StoreError::unavailable("tenant directory lock poisoned"))?;
        Ok(map.get(&actor_id).copied())
    }
}
