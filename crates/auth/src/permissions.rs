use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use scopegate_core::{DomainError, DomainResult};

/// Permission identifier.
///
/// Permissions follow a `resource.action` convention (e.g. `task.create`,
/// `rbac.role.view`). The first dot-separated segment is the permission's
/// *namespace*, used to decide whether a check needs a project in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Wrap a permission string without validating it.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Parse and validate a `resource.action` permission string.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let name = raw.trim();
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 2 {
            return Err(DomainError::validation(format!(
                "permission '{name}' must have the form resource.action"
            )));
        }
        for segment in &segments {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
            if !valid {
                return Err(DomainError::validation(format!(
                    "permission '{name}' has an invalid segment '{segment}'"
                )));
            }
        }
        Ok(Self(Cow::Owned(name.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading segment (`task` for `task.delete.any`).
    pub fn namespace(&self) -> &str {
        self.as_str()
            .split_once('.')
            .map_or(self.as_str(), |(namespace, _)| namespace)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known permissions of the construction/project-management product.
pub mod perms {
    use super::Permission;

    pub const TENANT_VIEW_SETTINGS: Permission = Permission::from_static("tenant.view_settings");
    pub const TENANT_MANAGE_SETTINGS: Permission = Permission::from_static("tenant.manage_settings");

    pub const RBAC_ROLE_VIEW: Permission = Permission::from_static("rbac.role.view");
    pub const RBAC_ROLE_ASSIGN: Permission = Permission::from_static("rbac.role.assign");

    pub const PROJECT_VIEW: Permission = Permission::from_static("project.view");
    pub const PROJECT_CREATE: Permission = Permission::from_static("project.create");
    pub const PROJECT_UPDATE: Permission = Permission::from_static("project.update");
    pub const PROJECT_ARCHIVE: Permission = Permission::from_static("project.archive");

    pub const TASK_VIEW: Permission = Permission::from_static("task.view");
    pub const TASK_CREATE: Permission = Permission::from_static("task.create");
    pub const TASK_UPDATE: Permission = Permission::from_static("task.update");
    /// Delete a task the actor created.
    pub const TASK_DELETE: Permission = Permission::from_static("task.delete");
    /// Delete any task in the project.
    pub const TASK_DELETE_ANY: Permission = Permission::from_static("task.delete.any");

    pub const MILESTONE_VIEW: Permission = Permission::from_static("milestone.view");
    pub const MILESTONE_MANAGE: Permission = Permission::from_static("milestone.manage");

    pub const QUOTE_VIEW: Permission = Permission::from_static("quote.view");
    pub const QUOTE_MANAGE: Permission = Permission::from_static("quote.manage");

    pub const CLIENT_VIEW: Permission = Permission::from_static("client.view");
    pub const CLIENT_MANAGE: Permission = Permission::from_static("client.manage");

    pub const DASHBOARD_VIEW: Permission = Permission::from_static("dashboard.view");

    pub const TEMPLATE_VIEW: Permission = Permission::from_static("template.view");
    pub const TEMPLATE_MANAGE: Permission = Permission::from_static("template.manage");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_nested_actions() {
        let p = Permission::parse("rbac.role.view").unwrap();
        assert_eq!(p.namespace(), "rbac");
        assert_eq!(p, perms::RBAC_ROLE_VIEW);
    }

    #[test]
    fn parse_rejects_missing_action() {
        assert!(Permission::parse("task").is_err());
        assert!(Permission::parse("task.").is_err());
        assert!(Permission::parse(".create").is_err());
        assert!(Permission::parse("Task.Create").is_err());
    }

    #[test]
    fn static_and_owned_permissions_compare_equal() {
        let owned = Permission::new("task.create".to_string());
        assert_eq!(owned, perms::TASK_CREATE);
    }
}
