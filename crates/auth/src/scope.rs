//! Assignment scopes and role assignments.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scopegate_core::{DomainError, DomainResult, ProjectId, TenantId};

use crate::Role;

/// Breadth at which a role assignment applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    System,
    Tenant,
    Project,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::System => "system",
            Scope::Tenant => "tenant",
            Scope::Project => "project",
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Scope::System),
            "tenant" => Ok(Scope::Tenant),
            "project" => Ok(Scope::Project),
            other => Err(DomainError::validation(format!("unknown scope '{other}'"))),
        }
    }
}

/// Scope of one assignment, carrying the scope id exactly when the scope needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AssignmentScope {
    System,
    Tenant(TenantId),
    Project(ProjectId),
}

impl AssignmentScope {
    pub fn kind(&self) -> Scope {
        match self {
            AssignmentScope::System => Scope::System,
            AssignmentScope::Tenant(_) => Scope::Tenant,
            AssignmentScope::Project(_) => Scope::Project,
        }
    }

    /// Build from the flat `(scope, scope_id)` shape used by storage rows.
    ///
    /// `scope_id` is required for tenant/project scopes and must be absent for
    /// the system scope.
    pub fn from_parts(scope: Scope, scope_id: Option<Uuid>) -> DomainResult<Self> {
        match (scope, scope_id) {
            (Scope::System, None) => Ok(AssignmentScope::System),
            (Scope::System, Some(_)) => Err(DomainError::validation(
                "system-scope assignment must not carry a scope id",
            )),
            (Scope::Tenant, Some(id)) => Ok(AssignmentScope::Tenant(TenantId::from_uuid(id))),
            (Scope::Project, Some(id)) => Ok(AssignmentScope::Project(ProjectId::from_uuid(id))),
            (scope, None) => Err(DomainError::validation(format!(
                "{scope}-scope assignment requires a scope id"
            ))),
        }
    }
}

/// A grant of one role to an actor within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub scope: AssignmentScope,
}

impl RoleAssignment {
    pub fn system(role: Role) -> Self {
        Self { role, scope: AssignmentScope::System }
    }

    pub fn tenant(role: Role, tenant_id: TenantId) -> Self {
        Self { role, scope: AssignmentScope::Tenant(tenant_id) }
    }

    pub fn project(role: Role, project_id: ProjectId) -> Self {
        Self { role, scope: AssignmentScope::Project(project_id) }
    }

    pub fn scope_kind(&self) -> Scope {
        self.scope.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_requires_scope_id_for_tenant_and_project() {
        assert!(AssignmentScope::from_parts(Scope::Tenant, None).is_err());
        assert!(AssignmentScope::from_parts(Scope::Project, None).is_err());
        assert!(AssignmentScope::from_parts(Scope::System, Some(Uuid::now_v7())).is_err());
    }

    #[test]
    fn from_parts_builds_typed_scope() {
        let id = Uuid::now_v7();
        assert_eq!(
            AssignmentScope::from_parts(Scope::Project, Some(id)).unwrap(),
            AssignmentScope::Project(ProjectId::from_uuid(id))
        );
        assert_eq!(
            AssignmentScope::from_parts(Scope::System, None).unwrap(),
            AssignmentScope::System
        );
    }

    #[test]
    fn scope_parses_case_insensitively() {
        assert_eq!("Tenant".parse::<Scope>().unwrap(), Scope::Tenant);
        assert!("org".parse::<Scope>().is_err());
    }

    #[test]
    fn assignment_json_shape() {
        let tenant_id = TenantId::new();
        let assignment = RoleAssignment::tenant(Role::new("viewer"), tenant_id);
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(json["role"], "viewer");
        assert_eq!(json["scope"]["kind"], "tenant");
        assert_eq!(json["scope"]["id"], tenant_id.to_string());

        let system: RoleAssignment =
            serde_json::from_str(r#"{"role":"system_admin","scope":{"kind":"system"}}"#).unwrap();
        assert_eq!(system.scope_kind(), Scope::System);
    }
}
