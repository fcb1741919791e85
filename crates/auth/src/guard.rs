//! Declarative permission guards for handler-level checks.
//!
//! A guard names one or more permissions and evaluates them against an
//! [`Authorizer`] that already carries the request's context and cache.

use core::future::Future;

use crate::{AuthContext, AuthorizationFailure, Authorizer, Decision, Permission, ReasonCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardMode {
    All,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    required: Vec<Permission>,
    mode: GuardMode,
}

impl Guard {
    /// Every listed permission must be held. An empty list allows.
    pub fn require(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            required: permissions.into_iter().collect(),
            mode: GuardMode::All,
        }
    }

    /// At least one listed permission must be held. An empty list denies.
    pub fn require_any(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            required: permissions.into_iter().collect(),
            mode: GuardMode::Any,
        }
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.required
    }

    pub async fn check(&self, authorizer: &Authorizer) -> Decision {
        match self.mode {
            GuardMode::All => {
                for permission in &self.required {
                    let decision = authorizer.check(permission).await;
                    if !decision.allowed {
                        return decision;
                    }
                }
                Decision::allow()
            }
            GuardMode::Any => {
                let mut first_denial = None;
                let mut store_failure = None;
                for permission in &self.required {
                    let decision = authorizer.check(permission).await;
                    if decision.allowed {
                        return decision;
                    }
                    if decision.reason_code == Some(ReasonCode::StoreUnavailable) {
                        store_failure.get_or_insert(decision);
                    } else {
                        first_denial.get_or_insert(decision);
                    }
                }
                store_failure
                    .or(first_denial)
                    .unwrap_or_else(|| Decision::deny(ReasonCode::MissingPermission))
            }
        }
    }

    /// Run `handler` with the request context only if the guard allows.
    pub async fn execute_or_deny<F, Fut, T>(
        &self,
        handler: F,
        authorizer: &Authorizer,
    ) -> Result<T, AuthorizationFailure>
    where
        F: FnOnce(AuthContext) -> Fut,
        Fut: Future<Output = T>,
    {
        self.check(authorizer).await.into_result()?;
        Ok(handler(*authorizer.context()).await)
    }
}
