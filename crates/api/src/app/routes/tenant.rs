//! Tenant settings: viewing and managing are separate permissions.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use scopegate_auth::perms;

use crate::app::routes::common::gated;
use crate::app::{dto, errors, services::AppServices};
use crate::context::CurrentAuth;
use crate::gate::AuthState;

pub fn router(auth: &AuthState) -> Router {
    Router::new().route(
        "/settings",
        gated(get(view_settings), auth.enforce(perms::TENANT_VIEW_SETTINGS, None))
            .merge(gated(axum::routing::put(update_settings), auth.enforce(perms::TENANT_MANAGE_SETTINGS, None))),
    )
}

/// GET /tenant/settings
pub async fn view_settings(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
) -> Response {
    let tenant_id = authz.context().tenant_id();
    match services.tenant_settings(tenant_id) {
        Ok(settings) => (
            StatusCode::OK,
            Json(serde_json::json!({ "tenant_id": tenant_id, "settings": settings })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /tenant/settings
pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
    Json(body): Json<dto::UpdateTenantSettingsRequest>,
) -> Response {
    let tenant_id = authz.context().tenant_id();
    match services.update_tenant_settings(tenant_id, body.display_name, body.timezone) {
        Ok(settings) => {
            tracing::info!(tenant_id = %tenant_id, actor_id = %authz.context().actor_id(), "tenant settings updated");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "tenant_id": tenant_id, "settings": settings })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
