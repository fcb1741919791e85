//! Consistent JSON error responses and the authorization denial mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use scopegate_auth::{AuthorizationFailure, Decision, ReasonCode};

use crate::app::services::ServiceError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// The response for any missing resource. Tenant isolation failures use it
/// unchanged.
pub fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Unavailable => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", err.to_string())
        }
    }
}

/// Render a guard or isolation failure.
pub fn denied(failure: AuthorizationFailure) -> Response {
    Denial::from(failure).into_response()
}

pub fn status_for(reason: ReasonCode) -> StatusCode {
    match reason {
        ReasonCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ReasonCode::MissingTenant => StatusCode::BAD_REQUEST,
        ReasonCode::TenantMismatch => StatusCode::NOT_FOUND,
        ReasonCode::NoProjectContext => StatusCode::UNPROCESSABLE_ENTITY,
        ReasonCode::MissingPermission => StatusCode::FORBIDDEN,
        ReasonCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn wire_code(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::MissingPermission => "TENANT_PERMISSION_DENIED",
        other => other.as_str(),
    }
}

/// A denying [`Decision`] rendered as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial(pub Decision);

impl Denial {
    pub fn reason(&self) -> ReasonCode {
        self.0.reason_code.unwrap_or(ReasonCode::MissingPermission)
    }
}

impl From<Decision> for Denial {
    fn from(decision: Decision) -> Self {
        Self(decision)
    }
}

impl From<AuthorizationFailure> for Denial {
    fn from(failure: AuthorizationFailure) -> Self {
        Self(failure.into_decision())
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let reason = self.reason();
        if reason == ReasonCode::TenantMismatch {
            return not_found();
        }

        let mut body = json!({
            "allowed": false,
            "code": wire_code(reason),
            "reason_code": reason.as_str(),
        });
        if let Some(permission) = &self.0.required_permission {
            body["required_permission"] = json!(permission.as_str());
        }
        (status_for(reason), axum::Json(body)).into_response()
    }
}
