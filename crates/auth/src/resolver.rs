//! Scope-precedence merging: assignments + catalog + context → effective set.
//!
//! Precedence is additive. Every assignment whose scope matches the context
//! contributes its role's permissions and nothing suppresses anything else.
//! The single exception is [`system_admin_override`].

use std::collections::HashSet;

use crate::{AssignmentScope, AuthContext, Permission, RoleAssignment, RoleCatalog};

/// Permissions an actor holds for one specific [`AuthContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissionSet {
    permissions: HashSet<Permission>,
    system_admin: bool,
}

impl EffectivePermissionSet {
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
            system_admin: false,
        }
    }

    /// The full permission universe granted by the system-admin override.
    pub fn universe() -> Self {
        Self {
            permissions: HashSet::new(),
            system_admin: true,
        }
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.system_admin || self.permissions.contains(permission)
    }

    pub fn is_system_admin(&self) -> bool {
        self.system_admin
    }

    /// Explicitly granted permissions (empty for the universe set).
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.system_admin && self.permissions.is_empty()
    }
}

/// Assignments partitioned by scope, keeping only those matching the context.
#[derive(Debug, Default)]
struct ScopeBuckets<'a> {
    system: Vec<&'a RoleAssignment>,
    tenant: Vec<&'a RoleAssignment>,
    project: Vec<&'a RoleAssignment>,
}

impl<'a> ScopeBuckets<'a> {
    fn partition(assignments: &'a [RoleAssignment], context: &AuthContext) -> Self {
        let mut buckets = Self::default();
        for assignment in assignments {
            match assignment.scope {
                AssignmentScope::System => buckets.system.push(assignment),
                AssignmentScope::Tenant(tenant_id) if tenant_id == context.tenant_id() => {
                    buckets.tenant.push(assignment)
                }
                AssignmentScope::Project(project_id) if Some(project_id) == context.project_id() => {
                    buckets.project.push(assignment)
                }
                AssignmentScope::Tenant(_) | AssignmentScope::Project(_) => {}
            }
        }
        buckets
    }

    fn all(&self) -> impl Iterator<Item = &&'a RoleAssignment> {
        self.system.iter().chain(&self.tenant).chain(&self.project)
    }
}

/// Named override rule: a *system-scope* assignment of the catalog's
/// system-admin sentinel grants the full permission universe.
///
/// Sentinel roles assigned at tenant or project scope do not trigger it; they
/// contribute only their listed permissions like any other role.
pub fn system_admin_override(system_assignments: &[&RoleAssignment], catalog: &dyn RoleCatalog) -> bool {
    system_assignments
        .iter()
        .any(|assignment| catalog.is_system_admin_role(&assignment.role))
}

/// Expand an actor's assignments into the effective permission set for `context`.
///
/// Pure: depends only on the arguments.
pub fn resolve(
    assignments: &[RoleAssignment],
    catalog: &dyn RoleCatalog,
    context: &AuthContext,
) -> EffectivePermissionSet {
    let buckets = ScopeBuckets::partition(assignments, context);

    if system_admin_override(&buckets.system, catalog) {
        return EffectivePermissionSet::universe();
    }

    let mut permissions = HashSet::new();
    for assignment in buckets.all() {
        permissions.extend(catalog.permissions_for(&assignment.role));
    }

    EffectivePermissionSet {
        permissions,
        system_admin: false,
    }
}

/// Permission namespaces that are only meaningful with a project in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScopedPermissions {
    namespaces: HashSet<String>,
}

impl ProjectScopedPermissions {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces
                .into_iter()
                .map(Into::into)
                .map(|ns| ns.trim().to_string())
                .filter(|ns| !ns.is_empty())
                .collect(),
        }
    }

    pub fn requires_project(&self, permission: &Permission) -> bool {
        self.namespaces.contains(permission.namespace())
    }
}

impl Default for ProjectScopedPermissions {
    fn default() -> Self {
        Self::new(["task", "milestone"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::catalog;
    use crate::{perms, Role, StaticRoleCatalog};
    use proptest::prelude::*;
    use scopegate_core::{ActorId, ProjectId, TenantId};

    fn ctx(tenant_id: TenantId, project_id: Option<ProjectId>) -> AuthContext {
        AuthContext::new(ActorId::new(), tenant_id, project_id)
    }

    #[test]
    fn project_assignment_for_other_project_contributes_nothing() {
        let catalog = catalog(&[("crew", &["task.create"])]);
        let (p1, p2) = (ProjectId::new(), ProjectId::new());
        let assignments = vec![RoleAssignment::project(Role::new("crew"), p1)];

        let set = resolve(&assignments, &catalog, &ctx(TenantId::new(), Some(p2)));
        assert!(!set.contains(&perms::TASK_CREATE));
        assert!(set.is_empty());

        let set = resolve(&assignments, &catalog, &ctx(TenantId::new(), Some(p1)));
        assert!(set.contains(&perms::TASK_CREATE));
    }

    #[test]
    fn project_assignment_ignored_without_project_context() {
        let catalog = catalog(&[("crew", &["task.view"])]);
        let assignments = vec![RoleAssignment::project(Role::new("crew"), ProjectId::new())];

        let set = resolve(&assignments, &catalog, &ctx(TenantId::new(), None));
        assert!(set.is_empty());
    }

    #[test]
    fn tenant_assignment_for_other_tenant_contributes_nothing() {
        let catalog = catalog(&[("viewer", &["tenant.view_settings"])]);
        let assignments = vec![RoleAssignment::tenant(Role::new("viewer"), TenantId::new())];

        let set = resolve(&assignments, &catalog, &ctx(TenantId::new(), None));
        assert!(!set.contains(&perms::TENANT_VIEW_SETTINGS));
    }

    #[test]
    fn scopes_union_additively() {
        let catalog = catalog(&[("a", &["quote.view"]), ("b", &["task.create"]), ("c", &["dashboard.view"])]);
        let tenant_id = TenantId::new();
        let project_id = ProjectId::new();
        let assignments = vec![
            RoleAssignment::tenant(Role::new("a"), tenant_id),
            RoleAssignment::project(Role::new("b"), project_id),
            RoleAssignment::system(Role::new("c")),
        ];

        let set = resolve(&assignments, &catalog, &ctx(tenant_id, Some(project_id)));
        let mut got: Vec<_> = set.iter().map(|p| p.as_str().to_string()).collect();
        got.sort();
        assert_eq!(got, vec!["dashboard.view", "quote.view", "task.create"]);
    }

    #[test]
    fn system_admin_sentinel_grants_everything() {
        let catalog = StaticRoleCatalog::builtin();
        let assignments = vec![RoleAssignment::system(crate::catalog::SYSTEM_ADMIN)];

        let set = resolve(&assignments, &catalog, &ctx(TenantId::new(), None));
        assert!(set.is_system_admin());
        assert!(set.contains(&perms::TENANT_MANAGE_SETTINGS));
        assert!(set.contains(&Permission::new("anything.at_all")));
    }

    #[test]
    fn sentinel_at_tenant_scope_does_not_override() {
        let catalog = StaticRoleCatalog::builtin();
        let tenant_id = TenantId::new();
        let assignments = vec![RoleAssignment::tenant(crate::catalog::SYSTEM_ADMIN, tenant_id)];

        let set = resolve(&assignments, &catalog, &ctx(tenant_id, None));
        assert!(!set.is_system_admin());
        assert!(!set.contains(&perms::TENANT_MANAGE_SETTINGS));
    }

    #[test]
    fn project_scoped_namespaces() {
        let scoped = ProjectScopedPermissions::default();
        assert!(scoped.requires_project(&perms::TASK_CREATE));
        assert!(scoped.requires_project(&perms::TASK_DELETE_ANY));
        assert!(!scoped.requires_project(&perms::TENANT_VIEW_SETTINGS));
        assert!(!scoped.requires_project(&perms::PROJECT_VIEW));

        let custom = ProjectScopedPermissions::new([" quote ", ""]);
        assert!(custom.requires_project(&perms::QUOTE_MANAGE));
        assert!(!custom.requires_project(&perms::TASK_CREATE));
    }

    // ── properties ──────────────────────────────────────────────────────────

    const ROLE_GRANTS: &[(&str, &[&str])] = &[
        ("r0", &["task.view", "task.create"]),
        ("r1", &["quote.view"]),
        ("r2", &["task.create", "dashboard.view"]),
        ("r3", &[]),
    ];

    fn fixture_ids() -> ([TenantId; 2], [ProjectId; 2]) {
        (
            [
                TenantId::from_uuid(uuid::Uuid::from_u128(1)),
                TenantId::from_uuid(uuid::Uuid::from_u128(2)),
            ],
            [
                ProjectId::from_uuid(uuid::Uuid::from_u128(11)),
                ProjectId::from_uuid(uuid::Uuid::from_u128(12)),
            ],
        )
    }

    fn assignment_strategy() -> impl Strategy<Value = RoleAssignment> {
        let (tenants, projects) = fixture_ids();
        (0..ROLE_GRANTS.len(), 0..5usize).prop_map(move |(role, scope)| {
            let role = Role::new(ROLE_GRANTS[role].0);
            match scope {
                0 => RoleAssignment::system(role),
                1 | 2 => RoleAssignment::tenant(role, tenants[scope - 1]),
                _ => RoleAssignment::project(role, projects[scope - 3]),
            }
        })
    }

    fn applies(assignment: &RoleAssignment, context: &AuthContext) -> bool {
        match assignment.scope {
            AssignmentScope::System => true,
            AssignmentScope::Tenant(t) => t == context.tenant_id(),
            AssignmentScope::Project(p) => Some(p) == context.project_id(),
        }
    }

    proptest! {
        #[test]
        fn resolution_is_pure_and_exactly_the_union_of_matching_roles(
            assignments in proptest::collection::vec(assignment_strategy(), 0..12),
            with_project in any::<bool>(),
        ) {
            let catalog = catalog(ROLE_GRANTS);
            let (tenants, projects) = fixture_ids();
            let context = AuthContext::new(
                ActorId::from_uuid(uuid::Uuid::from_u128(99)),
                tenants[0],
                with_project.then_some(projects[0]),
            );

            let first = resolve(&assignments, &catalog, &context);
            let second = resolve(&assignments, &catalog, &context);
            prop_assert_eq!(&first, &second);

            let expected: HashSet<Permission> = assignments
                .iter()
                .filter(|a| applies(a, &context))
                .flat_map(|a| catalog.permissions_for(&a.role))
                .collect();
            let actual: HashSet<Permission> = first.iter().cloned().collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
