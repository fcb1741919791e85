use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scopegate_core::{ActorId, TenantId};

/// Session token claims (transport-agnostic).
///
/// This is the minimal set of claims expected once a token has been decoded
/// and its signature verified. Tokens are issued elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / actor identifier.
    pub sub: ActorId,

    /// Legacy single-tenant field carried by accounts created before
    /// multi-tenant membership existed. Lowest-priority tenant source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding is
/// outside this crate.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// The authenticated-session artifact the context resolver trusts for the
/// actor identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Session {
    actor_id: ActorId,
    legacy_tenant_id: Option<TenantId>,
}

impl Session {
    pub fn new(actor_id: ActorId, legacy_tenant_id: Option<TenantId>) -> Self {
        Self { actor_id, legacy_tenant_id }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn legacy_tenant_id(&self) -> Option<TenantId> {
        self.legacy_tenant_id
    }
}

impl From<&SessionClaims> for Session {
    fn from(claims: &SessionClaims) -> Self {
        Self::new(claims.sub, claims.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: ActorId::new(),
            tenant_id: None,
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn valid_window_passes() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(1));
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn expired_and_future_tokens_fail() {
        let now = Utc::now();
        let expired = claims(now - Duration::minutes(10), now - Duration::minutes(1));
        assert_eq!(validate_claims(&expired, now), Err(TokenValidationError::Expired));

        let future = claims(now + Duration::minutes(1), now + Duration::minutes(10));
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = claims(now, now - Duration::seconds(1));
        assert_eq!(validate_claims(&inverted, now), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn session_carries_legacy_tenant_from_claims() {
        let now = Utc::now();
        let mut c = claims(now, now + Duration::minutes(5));
        let tenant_id = TenantId::new();
        c.tenant_id = Some(tenant_id);

        let session = Session::from(&c);
        assert_eq!(session.actor_id(), c.sub);
        assert_eq!(session.legacy_tenant_id(), Some(tenant_id));
    }
}
