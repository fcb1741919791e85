//! Enforcement gate: declarative per-route permission checks.
//!
//! ```ignore
//! get(view_settings).route_layer(middleware::from_fn_with_state(
//!     auth.enforce(perms::TENANT_VIEW_SETTINGS, None),
//!     gate::enforce,
//! ))
//! ```
//!
//! The gate resolves the request's context, runs tenant isolation for the
//! declared project parameter, checks the permission and, on success,
//! attaches the [`Authorizer`] so handlers and guards reuse the same context
//! and request cache.

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request, State},
    http::{Extensions, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use scopegate_auth::{
    Authorizer, ContextRequest, ContextResolver, Decision, Permission, PermissionResolver, ProjectDirectory,
    ReasonCode, Session, TenantOwned,
};
use scopegate_core::{ProjectId, TenantId};

use crate::app::errors::{self, Denial};
use crate::context::SelectedTenant;

/// Shared authorization wiring for the HTTP layer.
#[derive(Clone)]
pub struct AuthState {
    resolver: Arc<PermissionResolver>,
    contexts: Arc<ContextResolver>,
    projects: Arc<dyn ProjectDirectory>,
}

impl AuthState {
    pub fn new(
        resolver: Arc<PermissionResolver>,
        contexts: Arc<ContextResolver>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Self {
        Self {
            resolver,
            contexts,
            projects,
        }
    }

    /// Gate requiring `permission`. `project_param` names the route
    /// parameter carrying the project id, if the route has one.
    pub fn enforce(&self, permission: Permission, project_param: Option<&'static str>) -> Gate {
        Gate {
            state: self.clone(),
            permission,
            project_param,
        }
    }

    /// The request's authorizer for `project_id`.
    ///
    /// Reuses an attached authorizer whose context has the same project;
    /// otherwise resolves a fresh context from the session and tenant
    /// selection extensions.
    pub async fn authorizer_for(
        &self,
        extensions: &Extensions,
        project_id: Option<ProjectId>,
    ) -> Result<Authorizer, Denial> {
        if let Some(existing) = extensions.get::<Authorizer>() {
            if existing.context().project_id() == project_id {
                return Ok(existing.clone());
            }
        }

        let request = ContextRequest {
            session: extensions.get::<Session>().copied(),
            selected_tenant: extensions.get::<SelectedTenant>().map(|selected| selected.0),
            project_id,
        };

        let context = self.contexts.resolve(&request).await.map_err(|err| {
            if let scopegate_auth::ContextError::Store(store) = &err {
                tracing::warn!(error = %store, "tenant resolution unavailable; denying");
            }
            Denial(err.decision())
        })?;

        Ok(Authorizer::new(self.resolver.clone(), context))
    }
}

impl core::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthState").finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct Gate {
    state: AuthState,
    permission: Permission,
    project_param: Option<&'static str>,
}

impl Gate {
    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    /// Project id from the declared route parameter. A value that is not a
    /// project id is reported as not found; a declared parameter missing from
    /// the route is a wiring error.
    fn project_id(&self, params: Option<&RawPathParams>) -> Result<Option<ProjectId>, Response> {
        let Some(name) = self.project_param else {
            return Ok(None);
        };
        let Some(raw) = params.and_then(|params| params.iter().find(|(key, _)| *key == name).map(|(_, v)| v))
        else {
            tracing::error!(
                param = name,
                permission = %self.permission,
                "gate declares a project parameter the route does not have"
            );
            return Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "route is misconfigured",
            ));
        };
        raw.parse::<ProjectId>().map(Some).map_err(|_| errors::not_found())
    }
}

/// A project as far as isolation is concerned: the tenant that owns it.
struct ProjectOwner(TenantId);

impl TenantOwned for ProjectOwner {
    fn tenant_id(&self) -> TenantId {
        self.0
    }
}

/// Gate middleware; see the module docs.
pub async fn enforce(
    State(gate): State<Gate>,
    params: Option<RawPathParams>,
    mut req: Request,
    next: Next,
) -> Response {
    let project_id = match gate.project_id(params.as_ref()) {
        Ok(project_id) => project_id,
        Err(response) => return response,
    };

    let authorizer = match gate.state.authorizer_for(req.extensions(), project_id).await {
        Ok(authorizer) => authorizer,
        Err(denial) => return denial.into_response(),
    };

    let decision = match project_id {
        Some(project_id) => match gate.state.projects.tenant_of_project(project_id).await {
            Ok(Some(owner)) => {
                authorizer
                    .check_resource(&ProjectOwner(owner), &gate.permission)
                    .await
            }
            Ok(None) => return errors::not_found(),
            Err(err) => {
                tracing::warn!(project_id = %project_id, error = %err, "project directory unavailable; denying");
                return Denial(Decision::deny(ReasonCode::StoreUnavailable)).into_response();
            }
        },
        None => authorizer.check(&gate.permission).await,
    };
    if !decision.allowed {
        return Denial(decision).into_response();
    }

    req.extensions_mut().insert(authorizer);
    next.run(req).await
}
