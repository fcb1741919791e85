//! Decision outcome of one check and the typed failure raised from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Permission;

/// Machine-readable reason for a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// No authenticated actor (normally rejected upstream).
    Unauthenticated,
    /// No tenant could be resolved for the request.
    MissingTenant,
    /// The resource belongs to a different tenant than the request context.
    TenantMismatch,
    /// The permission needs a project in scope and the route has none.
    NoProjectContext,
    /// The effective permission set lacks the permission.
    MissingPermission,
    /// Authorization data could not be read; access is denied.
    StoreUnavailable,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Unauthenticated => "UNAUTHENTICATED",
            ReasonCode::MissingTenant => "MISSING_TENANT",
            ReasonCode::TenantMismatch => "TENANT_MISMATCH",
            ReasonCode::NoProjectContext => "NO_PROJECT_CONTEXT",
            ReasonCode::MissingPermission => "MISSING_PERMISSION",
            ReasonCode::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single authorization check. Produced per call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<Permission>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason_code: None,
            required_permission: None,
        }
    }

    pub fn deny(reason_code: ReasonCode) -> Self {
        Self {
            allowed: false,
            reason_code: Some(reason_code),
            required_permission: None,
        }
    }

    pub fn deny_permission(reason_code: ReasonCode, permission: Permission) -> Self {
        Self {
            allowed: false,
            reason_code: Some(reason_code),
            required_permission: Some(permission),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Convert a denial into the typed failure; allowed decisions map to `Ok`.
    pub fn into_result(self) -> Result<(), AuthorizationFailure> {
        if self.allowed {
            Ok(())
        } else {
            Err(AuthorizationFailure::new(self))
        }
    }
}

/// Typed authorization failure carrying the denying [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("authorization denied: {code}")]
pub struct AuthorizationFailure {
    code: ReasonCode,
    decision: Decision,
}

impl AuthorizationFailure {
    pub fn new(decision: Decision) -> Self {
        let code = decision.reason_code.unwrap_or(ReasonCode::MissingPermission);
        Self {
            code,
            decision: Decision {
                allowed: false,
                reason_code: Some(code),
                ..decision
            },
        }
    }

    pub fn reason_code(&self) -> ReasonCode {
        self.code
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn into_decision(self) -> Decision {
        self.decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perms;

    #[test]
    fn denial_serializes_with_screaming_codes() {
        let decision = Decision::deny_permission(ReasonCode::MissingPermission, perms::TASK_CREATE);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allowed": false,
                "reason_code": "MISSING_PERMISSION",
                "required_permission": "task.create",
            })
        );
    }

    #[test]
    fn allow_omits_optional_fields() {
        let json = serde_json::to_value(Decision::allow()).unwrap();
        assert_eq!(json, serde_json::json!({ "allowed": true }));
    }

    #[test]
    fn into_result_carries_decision() {
        assert!(Decision::allow().into_result().is_ok());

        let failure = Decision::deny(ReasonCode::TenantMismatch).into_result().unwrap_err();
        assert_eq!(failure.reason_code(), ReasonCode::TenantMismatch);
        assert!(!failure.decision().allowed);
        assert_eq!(failure.to_string(), "authorization denied: TENANT_MISMATCH");
    }

    #[test]
    fn failure_never_carries_an_allowed_decision() {
        let failure = AuthorizationFailure::new(Decision::allow());
        assert!(!failure.decision().allowed);
        assert_eq!(failure.reason_code(), ReasonCode::MissingPermission);
    }
}
