//! Request middleware: session hand-off and tenant selection.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use scopegate_auth::{Decision, ReasonCode, Session, SessionClaims, TokenValidationError, validate_claims};
use scopegate_core::TenantId;

use crate::app::errors::{self, Denial};
use crate::context::SelectedTenant;

/// Header carrying the tenant the caller selected for this request.
pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token decode failed: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// HS256 verification of already-issued session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl SessionKeys {
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in `expires_at` and is checked by `validate_claims`.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        }
    }

    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Verify the bearer token and attach the [`Session`] to the request.
pub async fn session_middleware(
    State(keys): State<SessionKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, Denial> {
    let claims = extract_bearer(req.headers())
        .ok_or(SessionError::MissingToken)
        .and_then(|token| keys.decode(token, Utc::now()))
        .map_err(|err| {
            tracing::info!(error = %err, "request rejected: no valid session");
            Denial(Decision::deny(ReasonCode::Unauthenticated))
        })?;

    req.extensions_mut().insert(Session::from(&claims));
    Ok(next.run(req).await)
}

/// Attach the tenant named by the `X-Tenant-Id` header, when present.
pub async fn tenant_selection_middleware(mut req: Request, next: Next) -> Response {
    let Some(raw) = req.headers().get(TENANT_HEADER) else {
        return next.run(req).await;
    };

    let parsed = raw
        .to_str()
        .ok()
        .and_then(|value| value.parse::<TenantId>().ok());

    match parsed {
        Some(tenant_id) => {
            req.extensions_mut().insert(SelectedTenant(tenant_id));
            next.run(req).await
        }
        None => errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_tenant_header",
            "X-Tenant-Id must be a tenant id",
        )
        .into_response(),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
