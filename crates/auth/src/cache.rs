//! Memoization of effective permission sets.
//!
//! [`RequestCache`] lives for one request and is the default. A
//! [`SharedDecisionCache`] may additionally be configured with a short TTL to
//! share sets across concurrent requests; the assignment write path must then
//! call [`SharedDecisionCache::invalidate_actor`] on every change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use scopegate_core::{ActorId, ProjectId, TenantId};

use crate::{AuthContext, EffectivePermissionSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub actor_id: ActorId,
    pub tenant_id: TenantId,
    pub project_id: Option<ProjectId>,
}

impl From<&AuthContext> for CacheKey {
    fn from(context: &AuthContext) -> Self {
        Self {
            actor_id: context.actor_id(),
            tenant_id: context.tenant_id(),
            project_id: context.project_id(),
        }
    }
}

pub trait DecisionCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Arc<EffectivePermissionSet>>;
    fn put(&self, key: CacheKey, value: Arc<EffectivePermissionSet>);
}

/// Request-lifetime cache. Assignments are immutable for a request, so no
/// invalidation is needed.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<CacheKey, Arc<EffectivePermissionSet>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionCache for RequestCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<EffectivePermissionSet>> {
        let map = self.entries.lock().ok()?;
        map.get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: Arc<EffectivePermissionSet>) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key, value);
        }
    }
}

#[derive(Debug)]
struct CachedSet {
    value: Arc<EffectivePermissionSet>,
    stored_at: Instant,
}

/// An actor's invalidation count, taken before its assignments are read.
///
/// A resolved set is only stored if the generation is unchanged when the
/// write happens, so a set computed from assignments that were revoked in the
/// meantime never lands in the cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    actor: u64,
}

#[derive(Debug, Default)]
struct SharedEntries {
    sets: HashMap<CacheKey, CachedSet>,
    generations: HashMap<ActorId, u64>,
    epoch: u64,
}

impl SharedEntries {
    fn generation(&self, actor_id: ActorId) -> Generation {
        Generation {
            epoch: self.epoch,
            actor: self.generations.get(&actor_id).copied().unwrap_or(0),
        }
    }
}

/// Process-wide cache with a short TTL. Reads take a shared lock only.
#[derive(Debug)]
pub struct SharedDecisionCache {
    ttl: Duration,
    entries: RwLock<SharedEntries>,
}

impl SharedDecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(SharedEntries::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current generation for `actor_id`; `None` if the cache is unusable.
    pub fn generation(&self, actor_id: ActorId) -> Option<Generation> {
        let entries = self.entries.read().ok()?;
        Some(entries.generation(actor_id))
    }

    /// Drop every cached set for `actor_id` (all tenants, all projects) and
    /// reject in-flight writes that started before this call.
    pub fn invalidate_actor(&self, actor_id: ActorId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.sets.retain(|key, _| key.actor_id != actor_id);
            let generation = entries.generations.entry(actor_id).or_default();
            *generation = generation.wrapping_add(1);
        }
    }

    /// Drop everything, e.g. after the role catalog changed.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.sets.clear();
            entries.generations.clear();
            entries.epoch = entries.epoch.wrapping_add(1);
        }
    }

    /// Store `value` unless `actor_id`'s generation moved past `expected`.
    /// Returns whether the set was stored.
    pub fn put_if_generation(&self, key: CacheKey, value: Arc<EffectivePermissionSet>, expected: Generation) -> bool {
        self.put_at(key, value, Instant::now(), Some(expected))
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.sets.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &CacheKey, now: Instant) -> Option<Arc<EffectivePermissionSet>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.sets.get(key)?;
        if now.saturating_duration_since(entry.stored_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn put_at(
        &self,
        key: CacheKey,
        value: Arc<EffectivePermissionSet>,
        now: Instant,
        expected: Option<Generation>,
    ) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        if expected.is_some_and(|generation| entries.generation(key.actor_id) != generation) {
            return false;
        }
        let ttl = self.ttl;
        entries
            .sets
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        entries.sets.insert(key, CachedSet { value, stored_at: now });
        true
    }
}

impl DecisionCache for SharedDecisionCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<EffectivePermissionSet>> {
        self.get_at(key, Instant::now())
    }

    fn put(&self, key: CacheKey, value: Arc<EffectivePermissionSet>) {
        self.put_at(key, value, Instant::now(), None);
    }
}
