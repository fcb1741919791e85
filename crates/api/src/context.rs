//! Request-scoped values attached by middleware and read by handlers.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use scopegate_auth::Authorizer;
use scopegate_core::TenantId;

use crate::app::errors;
use crate::gate::AuthState;

/// Tenant chosen by the caller through tenant selection.
///
/// Takes priority over the tenant resolution service and the session's
/// legacy tenant field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SelectedTenant(pub TenantId);

/// The request's [`Authorizer`].
///
/// Reuses the one an enforcement gate attached; otherwise resolves the
/// context (without a project) and attaches it for later extractors.
#[derive(Debug, Clone)]
pub struct CurrentAuth(pub Authorizer);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(authorizer) = parts.extensions.get::<Authorizer>() {
            return Ok(Self(authorizer.clone()));
        }

        let Some(state) = parts.extensions.get::<AuthState>().cloned() else {
            tracing::error!("AuthState extension missing; router is misconfigured");
            return Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "authorization is not configured",
            ));
        };

        let authorizer = state
            .authorizer_for(&parts.extensions, None)
            .await
            .map_err(IntoResponse::into_response)?;
        parts.extensions.insert(authorizer.clone());
        Ok(Self(authorizer))
    }
}
