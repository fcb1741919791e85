//! In-memory state behind the reference routes: projects, tasks and tenant
//! settings. Every lookup is keyed by tenant.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use scopegate_auth::{SharedRoleCatalog, TenantOwned};
use scopegate_core::{ActorId, ProjectId, TenantId};
use scopegate_infra::InMemoryProjectDirectory;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service state unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    pub display_name: String,
    pub timezone: String,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_by: ActorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub title: String,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl TenantOwned for Task {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl TenantOwned for Project {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[derive(Debug)]
pub struct AppServices {
    directory: Arc<InMemoryProjectDirectory>,
    catalog: Arc<SharedRoleCatalog>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    settings: RwLock<HashMap<TenantId, TenantSettings>>,
}

impl AppServices {
    pub fn new(directory: Arc<InMemoryProjectDirectory>, catalog: Arc<SharedRoleCatalog>) -> Self {
        Self {
            directory,
            catalog,
            projects: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            settings: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &SharedRoleCatalog {
        &self.catalog
    }

    pub fn tenant_settings(&self, tenant_id: TenantId) -> Result<TenantSettings, ServiceError> {
        let map = self.settings.read().map_err(|_| ServiceError::Unavailable)?;
        Ok(map.get(&tenant_id).cloned().unwrap_or_default())
    }

    pub fn update_tenant_settings(
        &self,
        tenant_id: TenantId,
        display_name: Option<String>,
        timezone: Option<String>,
    ) -> Result<TenantSettings, ServiceError> {
        let mut map = self.settings.write().map_err(|_| ServiceError::Unavailable)?;
        let settings = map.entry(tenant_id).or_default();
        if let Some(display_name) = display_name {
            settings.display_name = display_name;
        }
        if let Some(timezone) = timezone {
            settings.timezone = timezone;
        }
        Ok(settings.clone())
    }

    /// Create a project and register it with the project directory.
    pub fn create_project(
        &self,
        tenant_id: TenantId,
        name: String,
        created_by: ActorId,
    ) -> Result<Project, ServiceError> {
        let project = Project {
            id: ProjectId::new(),
            tenant_id,
            name,
            created_by,
        };
        let mut map = self.projects.write().map_err(|_| ServiceError::Unavailable)?;
        map.insert(project.id, project.clone());
        drop(map);

        self.directory.register(project.id, tenant_id);
        Ok(project)
    }

    pub fn project(&self, tenant_id: TenantId, project_id: ProjectId) -> Result<Option<Project>, ServiceError> {
        let map = self.projects.read().map_err(|_| ServiceError::Unavailable)?;
        Ok(map.get(&project_id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    pub fn create_task(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        title: String,
        created_by: ActorId,
    ) -> Result<Task, ServiceError> {
        let task = Task {
            id: Uuid::now_v7(),
            tenant_id,
            project_id,
            title,
            created_by,
            created_at: Utc::now(),
        };
        let mut map = self.tasks.write().map_err(|_| ServiceError::Unavailable)?;
        map.insert(task.id, task.clone());
        Ok(task)
    }

    pub fn tasks_in_project(&self, tenant_id: TenantId, project_id: ProjectId) -> Result<Vec<Task>, ServiceError> {
        let map = self.tasks.read().map_err(|_| ServiceError::Unavailable)?;
        let mut tasks: Vec<Task> = map
            .values()
            .filter(|t| t.tenant_id == tenant_id && t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    /// Task by id within a project. Not tenant-filtered: callers run the
    /// isolation check on the returned task.
    pub fn task(&self, project_id: ProjectId, task_id: Uuid) -> Result<Option<Task>, ServiceError> {
        let map = self.tasks.read().map_err(|_| ServiceError::Unavailable)?;
        Ok(map.get(&task_id).filter(|t| t.project_id == project_id).cloned())
    }

    pub fn delete_task(&self, task_id: Uuid) -> Result<bool, ServiceError> {
        let mut map = self.tasks.write().map_err(|_| ServiceError::Unavailable)?;
        Ok(map.remove(&task_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegate_auth::{ProjectDirectory, StaticRoleCatalog};

    fn services() -> (AppServices, Arc<InMemoryProjectDirectory>) {
        let directory = Arc::new(InMemoryProjectDirectory::new());
        let catalog = Arc::new(SharedRoleCatalog::new(StaticRoleCatalog::builtin()));
        (AppServices::new(directory.clone(), catalog), directory)
    }

    #[tokio::test]
    async fn created_projects_are_registered_with_the_directory() {
        let (services, directory) = services();
        let tenant = TenantId::new();
        let project = services.create_project(tenant, "Site A".into(), ActorId::new()).unwrap();

        assert_eq!(directory.tenant_of_project(project.id).await.unwrap(), Some(tenant));
        assert!(services.project(tenant, project.id).unwrap().is_some());
        assert!(services.project(TenantId::new(), project.id).unwrap().is_none());
    }

    #[test]
    fn tasks_are_listed_per_tenant_and_project() {
        let (services, _) = services();
        let tenant = TenantId::new();
        let (p1, p2) = (ProjectId::new(), ProjectId::new());
        let actor = ActorId::new();

        services.create_task(tenant, p1, "pour slab".into(), actor).unwrap();
        services.create_task(tenant, p2, "frame walls".into(), actor).unwrap();

        let in_p1 = services.tasks_in_project(tenant, p1).unwrap();
        assert_eq!(in_p1.len(), 1);
        assert_eq!(in_p1[0].title, "pour slab");
        assert!(services.tasks_in_project(TenantId::new(), p1).unwrap().is_empty());
    }

    #[test]
    fn settings_default_and_update() {
        let (services, _) = services();
        let tenant = TenantId::new();
        assert_eq!(services.tenant_settings(tenant).unwrap(), TenantSettings::default());

        let updated = services
            .update_tenant_settings(tenant, Some("Acme Builders".into()), None)
            .unwrap();
        assert_eq!(updated.display_name, "Acme Builders");
        assert_eq!(updated.timezone, "UTC");
    }
}
