//! RBAC visibility endpoints for answering "why was this request denied?".

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use scopegate_auth::{perms, Permission};

use crate::app::routes::common::gated;
use crate::app::{dto, errors, services::AppServices};
use crate::context::CurrentAuth;
use crate::gate::AuthState;

pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route("/roles", gated(get(list_roles), auth.enforce(perms::RBAC_ROLE_VIEW, None)))
        .route("/explain", get(explain))
}

/// GET /rbac/roles - role catalog with each role's permissions
pub async fn list_roles(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let catalog = services.catalog().snapshot();
    let mut roles: Vec<_> = catalog.definitions().cloned().collect();
    roles.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));

    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

/// GET /rbac/explain?permission=... - the caller's own decision for one permission
pub async fn explain(CurrentAuth(authz): CurrentAuth, Query(query): Query<dto::ExplainQuery>) -> Response {
    let permission = match Permission::parse(&query.permission) {
        Ok(p) => p,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_permission", e.to_string()),
    };

    let decision = authz.check(&permission).await;
    (StatusCode::OK, Json(decision)).into_response()
}
