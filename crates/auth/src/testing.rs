//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use scopegate_core::{ActorId, TenantId};

use crate::{
    AssignmentStore, Permission, Role, RoleAssignment, RoleDefinition, StaticRoleCatalog, StoreError,
    TenantResolutionService,
};

pub fn catalog(grants: &[(&str, &[&str])]) -> StaticRoleCatalog {
    StaticRoleCatalog::new(grants.iter().map(|(role, permissions)| RoleDefinition {
        name: Role::new(role.to_string()),
        permissions: permissions.iter().map(|p| Permission::new(p.to_string())).collect(),
        description: None,
        system_admin: false,
    }))
    .unwrap()
}

/// Assignment store that counts how often it is read.
#[derive(Default)]
pub struct CountingStore {
    assignments: HashMap<ActorId, Vec<RoleAssignment>>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn with(mut self, actor_id: ActorId, assignments: Vec<RoleAssignment>) -> Self {
        self.assignments.insert(actor_id, assignments);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssignmentStore for CountingStore {
    async fn list_assignments(&self, actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.assignments.get(&actor_id).cloned().unwrap_or_default())
    }
}

/// Assignment store whose first read takes its snapshot and then waits for
/// [`ParkedStore::release`] before returning it. Later reads return at once.
#[derive(Default)]
pub struct ParkedStore {
    assignments: Mutex<Vec<RoleAssignment>>,
    parked: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl ParkedStore {
    pub fn new(assignments: Vec<RoleAssignment>) -> Self {
        Self {
            assignments: Mutex::new(assignments),
            ..Self::default()
        }
    }

    /// Resolves once the first read has taken its snapshot.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn revoke_all(&self) {
        self.assignments.lock().unwrap().clear();
    }
}

#[async_trait]
impl AssignmentStore for ParkedStore {
    async fn list_assignments(&self, _actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        let snapshot = self.assignments.lock().unwrap().clone();
        if !self.parked.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(snapshot)
    }
}

pub struct FailingStore;

#[async_trait]
impl AssignmentStore for FailingStore {
    async fn list_assignments(&self, _actor_id: ActorId) -> Result<Vec<RoleAssignment>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

pub struct FixedTenants(pub Option<TenantId>);

#[async_trait]
impl TenantResolutionService for FixedTenants {
    async fn resolve_active_tenant_id(&self, _actor_id: ActorId) -> Result<Option<TenantId>, StoreError> {
        Ok(self.0)
    }
}

pub struct FailingTenants;

#[async_trait]
impl TenantResolutionService for FailingTenants {
    async fn resolve_active_tenant_id(&self, _actor_id: ActorId) -> Result<Option<TenantId>, StoreError> {
        Err(StoreError::unavailable("tenant directory timed out"))
    }
}
