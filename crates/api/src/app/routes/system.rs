use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::context::CurrentAuth;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(CurrentAuth(authz): CurrentAuth) -> impl IntoResponse {
    let ctx = authz.context();
    Json(serde_json::json!({
        "actor_id": ctx.actor_id().to_string(),
        "tenant_id": ctx.tenant_id().to_string(),
    }))
}
