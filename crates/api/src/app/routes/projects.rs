//! Projects and their tasks.
//!
//! Project-scoped routes declare `project_id` to their gate, so tenant
//! isolation and project-scope resolution run before any handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use scopegate_auth::{check_isolation_of, perms, Guard};
use scopegate_core::ProjectId;

use crate::app::routes::common::gated;
use crate::app::{dto, errors, services::AppServices};
use crate::context::CurrentAuth;
use crate::gate::AuthState;

const PROJECT_PARAM: Option<&str> = Some("project_id");

pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route("/projects", gated(post(create_project), auth.enforce(perms::PROJECT_CREATE, None)))
        .route(
            "/projects/:project_id",
            gated(get(get_project), auth.enforce(perms::PROJECT_VIEW, PROJECT_PARAM)),
        )
        .route(
            "/projects/:project_id/tasks",
            gated(get(list_tasks), auth.enforce(perms::TASK_VIEW, PROJECT_PARAM))
                .merge(gated(post(create_task), auth.enforce(perms::TASK_CREATE, PROJECT_PARAM))),
        )
        .route(
            "/projects/:project_id/tasks/:task_id",
            gated(delete(delete_task), auth.enforce(perms::TASK_VIEW, PROJECT_PARAM)),
        )
        // Pre-project endpoint kept for old clients; its route has no project.
        .route("/tasks", gated(post(create_task_unscoped), auth.enforce(perms::TASK_CREATE, None)))
}

/// POST /projects
pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
    Json(body): Json<dto::CreateProjectRequest>,
) -> Response {
    let ctx = authz.context();
    match services.create_project(ctx.tenant_id(), body.name, ctx.actor_id()) {
        Ok(project) => (StatusCode::CREATED, Json(project)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /projects/:project_id
pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
) -> Result<Response, Response> {
    let ctx = authz.context();
    let project_id = ctx.project_id().ok_or_else(errors::not_found)?;
    let project = services
        .project(ctx.tenant_id(), project_id)
        .map_err(errors::service_error_to_response)?
        .ok_or_else(errors::not_found)?;
    Ok((StatusCode::OK, Json(project)).into_response())
}

/// GET /projects/:project_id/tasks
pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
) -> Result<Response, Response> {
    let ctx = authz.context();
    let project_id = ctx.project_id().ok_or_else(errors::not_found)?;
    let tasks = services
        .tasks_in_project(ctx.tenant_id(), project_id)
        .map_err(errors::service_error_to_response)?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "tasks": tasks }))).into_response())
}

/// POST /projects/:project_id/tasks
pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
    Json(body): Json<dto::CreateTaskRequest>,
) -> Result<Response, Response> {
    let ctx = authz.context();
    let project_id = ctx.project_id().ok_or_else(errors::not_found)?;
    let task = services
        .create_task(ctx.tenant_id(), project_id, body.title, ctx.actor_id())
        .map_err(errors::service_error_to_response)?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

/// DELETE /projects/:project_id/tasks/:task_id
///
/// Authors may delete their own task with `task.delete` (or
/// `task.delete.any`); anyone else needs `task.delete.any`.
pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
    Path((_, task_id)): Path<(String, String)>,
) -> Result<Response, Response> {
    let ctx = *authz.context();
    let project_id = ctx.project_id().ok_or_else(errors::not_found)?;
    let task_id = task_id.parse::<Uuid>().map_err(|_| errors::not_found())?;

    let task = services
        .task(project_id, task_id)
        .map_err(errors::service_error_to_response)?
        .ok_or_else(errors::not_found)?;
    check_isolation_of(&ctx, &task).into_result().map_err(errors::denied)?;

    let guard = if task.created_by == ctx.actor_id() {
        Guard::require_any([perms::TASK_DELETE, perms::TASK_DELETE_ANY])
    } else {
        Guard::require([perms::TASK_DELETE_ANY])
    };

    guard
        .execute_or_deny(|_| async move { services.delete_task(task.id) }, &authz)
        .await
        .map_err(errors::denied)?
        .map_err(errors::service_error_to_response)?;

    tracing::info!(task_id = %task_id, actor_id = %ctx.actor_id(), "task deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
pub struct CreateUnscopedTaskRequest {
    pub title: String,
    pub project_id: Option<ProjectId>,
}

/// POST /tasks
///
/// Only reachable when `task` is not configured as project-scoped; the gate
/// otherwise rejects it with `NO_PROJECT_CONTEXT`.
pub async fn create_task_unscoped(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentAuth(authz): CurrentAuth,
    Json(body): Json<CreateUnscopedTaskRequest>,
) -> Result<Response, Response> {
    let ctx = authz.context();
    let Some(project_id) = body.project_id else {
        return Err(errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "project_required",
            "project_id is required",
        ));
    };
    let project = services
        .project(ctx.tenant_id(), project_id)
        .map_err(errors::service_error_to_response)?
        .ok_or_else(errors::not_found)?;
    let task = services
        .create_task(ctx.tenant_id(), project.id, body.title, ctx.actor_id())
        .map_err(errors::service_error_to_response)?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}
