//! Postgres-backed role assignment store.
//!
//! Schema (see [`PostgresAssignmentStore::ensure_schema`]):
//!
//! ```sql
//! role_assignments(actor_id UUID, role TEXT, scope TEXT, scope_id UUID NULL)
//! ```
//!
//! `scope` is one of `system`, `tenant`, `project`; `scope_id` is NULL for
//! `system` and required otherwise. Every sqlx failure maps to
//! [`StoreError::Unavailable`]; rows that violate the scope rules map to
//! [`StoreError::Corrupt`]. Both deny at the engine.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use scopegate_auth::{
    AssignmentScope, AssignmentStore, Role, RoleAssignment, Scope, SharedDecisionCache, StoreError,
};
use scopegate_core::ActorId;

use super::invalidation::Invalidation;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS role_assignments (
    actor_id  UUID NOT NULL,
    role      TEXT NOT NULL,
    scope     TEXT NOT NULL CHECK (scope IN ('system', 'tenant', 'project')),
    scope_id  UUID NULL,
    granted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK ((scope = 'system') = (scope_id IS NULL))
);
CREATE UNIQUE INDEX IF NOT EXISTS role_assignments_unique
    ON role_assignments (actor_id, role, scope, COALESCE(scope_id, '00000000-0000-0000-0000-000000000000'));
"#;

#[derive(Debug, Clone)]
pub struct PostgresAssignmentStore {
    pool: Arc<PgPool>,
    invalidation: Invalidation,
}

impl PostgresAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            invalidation: Invalidation::default(),
        }
    }

    /// Invalidate the actor in `cache` after every successful grant or revoke.
    pub fn with_invalidation(mut self, cache: Arc<SharedDecisionCache>) -> Self {
        self.invalidation = Invalidation::new(cache);
        self
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the assignments table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(actor_id = %actor_id, role = %assignment.role), err)]
    pub async fn grant(&self, actor_id: ActorId, assignment: &RoleAssignment) -> Result<(), StoreError> {
        let (scope, scope_id) = columns(&assignment.scope);
        let result = sqlx::query(
            r#"
            INSERT INTO role_assignments (actor_id, role, scope, scope_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(actor_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(scope.as_str())
        .bind(scope_id)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("grant", e));
        self.invalidation.after_write(actor_id, result)
    }

    #[instrument(skip_all, fields(actor_id = %actor_id, role = %assignment.role), err)]
    pub async fn revoke(&self, actor_id: ActorId, assignment: &RoleAssignment) -> Result<bool, StoreError> {
        let (scope, scope_id) = columns(&assignment.scope);
        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE actor_id = $1 AND role = $2 AND scope = $3
              AND scope_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(actor_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(scope.as_str())
        .bind(scope_id)
        .execute(&*self.pool)
        .await
        .map(|done| done.rows_affected() > 0)
        .map_err(|e| map_sqlx_error("revoke", e));
        self.invalidation.after_write(actor_id, result)
    }
}

#[async_trait]
impl AssignmentStore for PostgresAssignmentStore {
    #[instrument(skip_all, fields(actor_id = %actor_id), err)]
    async fn list_assignments(&self, actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT role, scope, scope_id
            FROM role_assignments
            WHERE actor_id = $1
            "#,
        )
        .bind(actor_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_assignments", e))?;

        rows.iter().map(row_to_assignment).collect()
    }
}

fn columns(scope: &AssignmentScope) -> (Scope, Option<uuid::Uuid>) {
    match scope {
        AssignmentScope::System => (Scope::System, None),
        AssignmentScope::Tenant(id) => (Scope::Tenant, Some(*id.as_uuid())),
        AssignmentScope::Project(id) => (Scope::Project, Some(*id.as_uuid())),
    }
}

fn row_to_assignment(row: &sqlx::postgres::PgRow) -> Result<RoleAssignment, StoreError> {
    let role: String = row.try_get("role").map_err(|e| map_sqlx_error("decode role", e))?;
    let scope: String = row.try_get("scope").map_err(|e| map_sqlx_error("decode scope", e))?;
    let scope_id: Option<uuid::Uuid> = row
        .try_get("scope_id")
        .map_err(|e| map_sqlx_error("decode scope_id", e))?;

    let kind = scope
        .parse::<Scope>()
        .map_err(|e| StoreError::Corrupt(format!("role '{role}': {e}")))?;
    let scope = AssignmentScope::from_parts(kind, scope_id)
        .map_err(|e| StoreError::Corrupt(format!("role '{role}': {e}")))?;

    Ok(RoleAssignment {
        role: Role::new(role),
        scope,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {}", operation)),
        sqlx::Error::PoolTimedOut => StoreError::Unavailable(format!("connection pool timed out in {}", operation)),
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
