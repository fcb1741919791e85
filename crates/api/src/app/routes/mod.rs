use axum::{routing::get, Router};

use crate::gate::AuthState;

pub mod common;
pub mod projects;
pub mod rbac;
pub mod system;
pub mod tenant;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/tenant", tenant::router(auth))
        .nest("/rbac", rbac::router(auth))
        .merge(projects::router(auth))
}
