//! HTTP API application wiring (Axum router + engine wiring).
//!
//! - `services.rs`: in-memory state behind the reference routes
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error and denial responses

use std::sync::Arc;

use anyhow::Context as _;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use scopegate_auth::{
    AssignmentStore, ContextResolver, PermissionResolver, ProjectScopedPermissions, SharedDecisionCache,
    SharedRoleCatalog, StaticRoleCatalog, TenantResolutionService,
};
use scopegate_infra::{
    EngineConfig, InMemoryAssignmentStore, InMemoryProjectDirectory, InMemoryTenantDirectory,
    PostgresAssignmentStore,
};

use crate::gate::AuthState;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Collaborators the router is built from.
pub struct AppDeps {
    pub jwt_secret: String,
    pub assignments: Arc<dyn AssignmentStore>,
    pub tenants: Arc<dyn TenantResolutionService>,
    pub catalog: Arc<SharedRoleCatalog>,
    pub project_scoped: ProjectScopedPermissions,
    pub shared_cache: Option<Arc<SharedDecisionCache>>,
}

impl AppDeps {
    /// In-memory stores, built-in catalog, request-scoped caching only.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            assignments: Arc::new(InMemoryAssignmentStore::new()),
            tenants: Arc::new(InMemoryTenantDirectory::new()),
            catalog: Arc::new(SharedRoleCatalog::new(StaticRoleCatalog::builtin())),
            project_scoped: ProjectScopedPermissions::default(),
            shared_cache: None,
        }
    }
}

/// Build the full HTTP router with in-memory defaults.
pub fn build_app(jwt_secret: String) -> Router {
    build_app_with(AppDeps::in_memory(jwt_secret))
}

/// Build the router from `config`: Postgres assignments when `DATABASE_URL`
/// is set, in-memory otherwise.
pub async fn build_app_from_config(config: &EngineConfig) -> anyhow::Result<Router> {
    let catalog = config.load_role_catalog().context("loading role catalog")?;
    let shared_cache = config
        .decision_cache_ttl
        .map(|ttl| Arc::new(SharedDecisionCache::new(ttl)));

    let assignments: Arc<dyn AssignmentStore> = match &config.database_url {
        Some(url) => {
            let mut store = PostgresAssignmentStore::connect(url)
                .await
                .context("connecting to assignment database")?;
            if let Some(cache) = &shared_cache {
                store = store.with_invalidation(cache.clone());
            }
            store.ensure_schema().await.context("preparing assignment schema")?;
            tracing::info!("role assignments served from postgres");
            Arc::new(store)
        }
        None => {
            let mut store = InMemoryAssignmentStore::new();
            if let Some(cache) = &shared_cache {
                store = store.with_invalidation(cache.clone());
            }
            tracing::info!("role assignments served from memory");
            Arc::new(store)
        }
    };

    if let Some(ttl) = config.decision_cache_ttl {
        tracing::info!(ttl_ms = ttl.as_millis() as u64, "shared decision cache enabled");
    }

    let mut catalog = SharedRoleCatalog::new(catalog);
    if let Some(cache) = &shared_cache {
        catalog = catalog.with_invalidation(cache.clone());
    }

    Ok(build_app_with(AppDeps {
        jwt_secret: config.jwt_secret.clone(),
        assignments,
        tenants: Arc::new(InMemoryTenantDirectory::new()),
        catalog: Arc::new(catalog),
        project_scoped: config.project_scoped_permissions(),
        shared_cache,
    }))
}

pub fn build_app_with(deps: AppDeps) -> Router {
    let keys = middleware::SessionKeys::hs256(deps.jwt_secret.as_bytes());

    let mut resolver = PermissionResolver::new(deps.assignments, deps.catalog.clone())
        .with_project_scoped(deps.project_scoped);
    if let Some(cache) = deps.shared_cache {
        resolver = resolver.with_shared_cache(cache);
    }

    let directory = Arc::new(InMemoryProjectDirectory::new());
    let auth_state = AuthState::new(
        Arc::new(resolver),
        Arc::new(ContextResolver::new(deps.tenants)),
        directory.clone(),
    );
    let services = Arc::new(services::AppServices::new(directory, deps.catalog));

    // Protected routes: require a session; tenant selection is optional.
    let protected = routes::router(&auth_state).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(keys, middleware::session_middleware))
            .layer(axum::middleware::from_fn(middleware::tenant_selection_middleware))
            .layer(Extension(auth_state))
            .layer(Extension(services)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
