//! Role catalog: role identifier → permission set.
//!
//! Read-only at request time. A deployment either uses the built-in catalog
//! or loads one from JSON; [`SharedRoleCatalog`] swaps snapshots between
//! requests when role definitions change.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scopegate_core::DomainError;

use crate::cache::SharedDecisionCache;
use crate::permissions::perms;
use crate::{Permission, Role};

/// Lookup interface the resolver expands roles through.
pub trait RoleCatalog: Send + Sync {
    /// Permissions granted by `role`. Unknown roles grant nothing.
    fn permissions_for(&self, role: &Role) -> Vec<Permission>;

    /// Whether `role` is the system-admin sentinel.
    fn is_system_admin_role(&self, role: &Role) -> bool;
}

impl<C> RoleCatalog for Arc<C>
where
    C: RoleCatalog + ?Sized,
{
    fn permissions_for(&self, role: &Role) -> Vec<Permission> {
        (**self).permissions_for(role)
    }

    fn is_system_admin_role(&self, role: &Role) -> bool {
        (**self).is_system_admin_role(role)
    }
}

/// Role definition with its granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub description: Option<String>,
    /// Marks the system-admin sentinel role.
    #[serde(default)]
    pub system_admin: bool,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid role catalog json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("role '{role}': {source}")]
    InvalidPermission { role: String, source: DomainError },

    #[error("role '{0}' is defined more than once")]
    DuplicateRole(String),
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    roles: Vec<RoleDefinition>,
}

/// In-memory catalog built from a fixed list of definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleCatalog {
    roles: HashMap<Role, RoleDefinition>,
}

impl StaticRoleCatalog {
    /// Build a catalog, validating permission strings and role uniqueness.
    pub fn new(definitions: impl IntoIterator<Item = RoleDefinition>) -> Result<Self, CatalogError> {
        let mut roles = HashMap::new();
        for mut definition in definitions {
            let mut validated = Vec::with_capacity(definition.permissions.len());
            for permission in &definition.permissions {
                let parsed = Permission::parse(permission.as_str()).map_err(|source| {
                    CatalogError::InvalidPermission {
                        role: definition.name.to_string(),
                        source,
                    }
                })?;
                validated.push(parsed);
            }
            definition.permissions = validated;

            let name = definition.name.clone();
            if roles.insert(name.clone(), definition).is_some() {
                return Err(CatalogError::DuplicateRole(name.to_string()));
            }
        }
        Ok(Self { roles })
    }

    /// Load from a `{"roles": [...]}` JSON document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::new(document.roles)
    }

    /// Default catalog for the construction/project-management product.
    pub fn builtin() -> Self {
        let roles = builtin_definitions()
            .into_iter()
            .map(|definition| (definition.name.clone(), definition))
            .collect();
        Self { roles }
    }

    pub fn get(&self, role: &Role) -> Option<&RoleDefinition> {
        self.roles.get(role)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleCatalog for StaticRoleCatalog {
    fn permissions_for(&self, role: &Role) -> Vec<Permission> {
        self.roles
            .get(role)
            .map(|definition| definition.permissions.clone())
            .unwrap_or_default()
    }

    fn is_system_admin_role(&self, role: &Role) -> bool {
        self.roles.get(role).is_some_and(|definition| definition.system_admin)
    }
}

/// Process-wide catalog handle with hot reload between requests.
///
/// Replacing the catalog clears the attached [`SharedDecisionCache`], if any,
/// so no set resolved under the old catalog outlives the swap.
#[derive(Debug)]
pub struct SharedRoleCatalog {
    current: RwLock<Arc<StaticRoleCatalog>>,
    invalidation: Option<Arc<SharedDecisionCache>>,
}

impl SharedRoleCatalog {
    pub fn new(catalog: StaticRoleCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            invalidation: None,
        }
    }

    pub fn with_invalidation(mut self, cache: Arc<SharedDecisionCache>) -> Self {
        self.invalidation = Some(cache);
        self
    }

    pub fn snapshot(&self) -> Arc<StaticRoleCatalog> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, catalog: StaticRoleCatalog) {
        let next = Arc::new(catalog);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        if let Some(cache) = &self.invalidation {
            cache.clear();
        }
        tracing::info!("role catalog replaced");
    }
}

impl RoleCatalog for SharedRoleCatalog {
    fn permissions_for(&self, role: &Role) -> Vec<Permission> {
        self.snapshot().permissions_for(role)
    }

    fn is_system_admin_role(&self, role: &Role) -> bool {
        self.snapshot().is_system_admin_role(role)
    }
}

pub const SYSTEM_ADMIN: Role = Role::from_static("system_admin");
pub const OWNER: Role = Role::from_static("owner");
pub const TENANT_ADMIN: Role = Role::from_static("tenant_admin");
pub const PROJECT_MANAGER: Role = Role::from_static("project_manager");
pub const SITE_MEMBER: Role = Role::from_static("site_member");
pub const VIEWER: Role = Role::from_static("viewer");

fn builtin_definitions() -> Vec<RoleDefinition> {
    let tenant_admin = vec![
        perms::TENANT_VIEW_SETTINGS,
        perms::TENANT_MANAGE_SETTINGS,
        perms::RBAC_ROLE_VIEW,
        perms::RBAC_ROLE_ASSIGN,
        perms::PROJECT_VIEW,
        perms::PROJECT_CREATE,
        perms::PROJECT_UPDATE,
        perms::PROJECT_ARCHIVE,
        perms::CLIENT_VIEW,
        perms::CLIENT_MANAGE,
        perms::QUOTE_VIEW,
        perms::QUOTE_MANAGE,
        perms::TEMPLATE_VIEW,
        perms::TEMPLATE_MANAGE,
        perms::DASHBOARD_VIEW,
    ];

    let project_manager = vec![
        perms::PROJECT_VIEW,
        perms::PROJECT_UPDATE,
        perms::TASK_VIEW,
        perms::TASK_CREATE,
        perms::TASK_UPDATE,
        perms::TASK_DELETE,
        perms::TASK_DELETE_ANY,
        perms::MILESTONE_VIEW,
        perms::MILESTONE_MANAGE,
        perms::QUOTE_VIEW,
        perms::QUOTE_MANAGE,
        perms::CLIENT_VIEW,
        perms::DASHBOARD_VIEW,
    ];

    // Owners hold everything a tenant admin and a project manager hold.
    let owner: Vec<Permission> = tenant_admin
        .iter()
        .chain(project_manager.iter())
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    vec![
        RoleDefinition {
            name: SYSTEM_ADMIN,
            permissions: Vec::new(),
            description: Some("Platform operator; holds every permission in every tenant".to_string()),
            system_admin: true,
        },
        RoleDefinition {
            name: OWNER,
            permissions: owner,
            description: Some("Account owner with full access inside the tenant".to_string()),
            system_admin: false,
        },
        RoleDefinition {
            name: TENANT_ADMIN,
            permissions: tenant_admin,
            description: Some("Manages settings, members, clients and projects".to_string()),
            system_admin: false,
        },
        RoleDefinition {
            name: PROJECT_MANAGER,
            permissions: project_manager,
            description: Some("Runs a project: tasks, milestones and quotes".to_string()),
            system_admin: false,
        },
        RoleDefinition {
            name: SITE_MEMBER,
            permissions: vec![
                perms::PROJECT_VIEW,
                perms::TASK_VIEW,
                perms::TASK_CREATE,
                perms::TASK_UPDATE,
                perms::TASK_DELETE,
                perms::MILESTONE_VIEW,
                perms::DASHBOARD_VIEW,
            ],
            description: Some("Crew member working tasks on site".to_string()),
            system_admin: false,
        },
        RoleDefinition {
            name: VIEWER,
            permissions: vec![
                perms::TENANT_VIEW_SETTINGS,
                perms::PROJECT_VIEW,
                perms::TASK_VIEW,
                perms::MILESTONE_VIEW,
                perms::DASHBOARD_VIEW,
            ],
            description: Some("Read-only access".to_string()),
            system_admin: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_passes_validation() {
        let validated = StaticRoleCatalog::new(builtin_definitions()).unwrap();
        assert_eq!(validated.len(), StaticRoleCatalog::builtin().len());
    }

    #[test]
    fn builtin_sentinel_is_only_system_admin() {
        let catalog = StaticRoleCatalog::builtin();
        let admins: Vec<_> = catalog
            .definitions()
            .filter(|d| catalog.is_system_admin_role(&d.name))
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(admins, vec![SYSTEM_ADMIN]);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let catalog = StaticRoleCatalog::builtin();
        assert!(catalog.permissions_for(&Role::new("intern")).is_empty());
        assert!(!catalog.is_system_admin_role(&Role::new("intern")));
    }

    #[test]
    fn from_json_loads_and_validates() {
        let catalog = StaticRoleCatalog::from_json(
            r#"{"roles":[
                {"name":"estimator","permissions":["quote.view","quote.manage"]},
                {"name":"root","system_admin":true}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            catalog.permissions_for(&Role::new("estimator")),
            vec![perms::QUOTE_VIEW, perms::QUOTE_MANAGE]
        );
        assert!(catalog.is_system_admin_role(&Role::new("root")));
    }

    #[test]
    fn from_json_rejects_malformed_permission() {
        let err = StaticRoleCatalog::from_json(r#"{"roles":[{"name":"bad","permissions":["quotes"]}]}"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPermission { .. }));
    }

    #[test]
    fn from_json_rejects_duplicate_roles() {
        let err = StaticRoleCatalog::from_json(r#"{"roles":[{"name":"a"},{"name":"a"}]}"#).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateRole(name) if name == "a"));
    }

    #[test]
    fn shared_catalog_replace_takes_effect_for_new_lookups() {
        let shared = SharedRoleCatalog::new(StaticRoleCatalog::builtin());
        assert!(shared.permissions_for(&VIEWER).contains(&perms::TASK_VIEW));

        let before = shared.snapshot();
        shared.replace(
            StaticRoleCatalog::new(vec![RoleDefinition {
                name: VIEWER,
                permissions: vec![perms::DASHBOARD_VIEW],
                description: None,
                system_admin: false,
            }])
            .unwrap(),
        );

        assert_eq!(shared.permissions_for(&VIEWER), vec![perms::DASHBOARD_VIEW]);
        // Snapshots taken earlier are unaffected.
        assert!(before.permissions_for(&VIEWER).contains(&perms::TASK_VIEW));
    }

    #[test]
    fn replace_clears_attached_decision_cache() {
        use crate::{CacheKey, DecisionCache, EffectivePermissionSet};
        use scopegate_core::{ActorId, TenantId};
        use std::time::Duration;

        let cache = Arc::new(SharedDecisionCache::new(Duration::from_secs(60)));
        let shared = SharedRoleCatalog::new(StaticRoleCatalog::builtin()).with_invalidation(cache.clone());
        cache.put(
            CacheKey {
                actor_id: ActorId::new(),
                tenant_id: TenantId::new(),
                project_id: None,
            },
            Arc::new(EffectivePermissionSet::from_permissions([perms::TASK_VIEW])),
        );

        shared.replace(StaticRoleCatalog::builtin());
        assert!(cache.is_empty());
    }
}
