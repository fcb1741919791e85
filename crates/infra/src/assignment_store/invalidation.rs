use std::sync::Arc;

use scopegate_auth::{SharedDecisionCache, StoreError};
use scopegate_core::ActorId;

/// Write-path hook that drops an actor's cross-request cache entries after a
/// successful assignment change. Without an attached cache it does nothing.
#[derive(Debug, Clone, Default)]
pub(crate) struct Invalidation(Option<Arc<SharedDecisionCache>>);

impl Invalidation {
    pub(crate) fn new(cache: Arc<SharedDecisionCache>) -> Self {
        Self(Some(cache))
    }

    pub(crate) fn publish(&self, actor_id: ActorId) {
        if let Some(cache) = &self.0 {
            cache.invalidate_actor(actor_id);
        }
    }

    /// Pass `result` through, invalidating `actor_id` only if the write succeeded.
    pub(crate) fn after_write<T>(&self, actor_id: ActorId, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if result.is_ok() {
            self.publish(actor_id);
        }
        result
    }
}
