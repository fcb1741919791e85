//! Tenant isolation filter.
//!
//! Mandatory pre-check for any access to a tenant-scoped resource. It runs
//! before permission resolution and is independent of its outcome: a
//! mismatch is reported as `TENANT_MISMATCH`, which the transport layer
//! surfaces exactly like "not found".

use scopegate_core::TenantId;

use crate::{AuthContext, Decision, ReasonCode};

/// Marks resources owned by exactly one tenant.
pub trait TenantOwned {
    fn tenant_id(&self) -> TenantId;
}

pub fn check_isolation(context: &AuthContext, resource_tenant_id: TenantId) -> Decision {
    if context.tenant_id() == resource_tenant_id {
        return Decision::allow();
    }

    tracing::info!(
        actor_id = %context.actor_id(),
        tenant_id = %context.tenant_id(),
        "cross-tenant resource access rejected"
    );
    Decision::deny(ReasonCode::TenantMismatch)
}

pub fn check_isolation_of<R>(context: &AuthContext, resource: &R) -> Decision
where
    R: TenantOwned + ?Sized,
{
    check_isolation(context, resource.tenant_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegate_core::ActorId;

    struct Invoice {
        tenant_id: TenantId,
    }

    impl TenantOwned for Invoice {
        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }
    }

    #[test]
    fn same_tenant_passes() {
        let tenant_id = TenantId::new();
        let ctx = AuthContext::new(ActorId::new(), tenant_id, None);
        assert!(check_isolation(&ctx, tenant_id).allowed);
    }

    #[test]
    fn other_tenant_is_tenant_mismatch() {
        let ctx = AuthContext::new(ActorId::new(), TenantId::new(), None);
        let invoice = Invoice { tenant_id: TenantId::new() };

        let decision = check_isolation_of(&ctx, &invoice);
        assert!(!decision.allowed);
        assert_eq!(decision.reason_code, Some(ReasonCode::TenantMismatch));
        assert_eq!(decision.required_permission, None);
    }
}
