use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use scopegate_auth::{ProjectDirectory, StoreError};
use scopegate_core::{ProjectId, TenantId};

/// Project → owning tenant, for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProjectDirectory {
    owners: RwLock<HashMap<ProjectId, TenantId>>,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, project_id: ProjectId, tenant_id: TenantId) {
        if let Ok(mut map) = self.owners.write() {
            map.insert(project_id, tenant_id);
        }
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn tenant_of_project(&self, project_id: ProjectId) -> Result<Option<TenantId>, StoreError> {
        let map = self
            .owners
            .read()
            .map_err(|_| StoreError::unavailable("project directory lock poisoned"))?;
        Ok(map.get(&project_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_projects_resolve_to_their_tenant() {
        let directory = InMemoryProjectDirectory::new();
        let (project, tenant) = (ProjectId::new(), TenantId::new());
        directory.register(project, tenant);

        assert_eq!(directory.tenant_of_project(project).await.unwrap(), Some(tenant));
        assert_eq!(directory.tenant_of_project(ProjectId::new()).await.unwrap(), None);
    }
}
