//! Invitation token generator
//!
//! Token = base64url(sha512("{secret}-{member}-{organization}-{unix nanos}")). The
//! result is URL-safe and never re-checked for collisions before insert; the unique
//! index on `invitations.link` is the backstop.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};

#[derive(Clone)]
pub struct TokenGenerator {
    secret: String,
}

impl TokenGenerator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn generate(&self, member_id: i64, organization_id: i64) -> String {
        self.generate_at(member_id, organization_id, Utc::now())
    }

    pub fn generate_at(&self, member_id: i64, organization_id: i64, at: DateTime<Utc>) -> String {
        let nanos = at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| at.timestamp_micros().saturating_mul(1_000));
        let seed = format!("{}-{}-{}-{}", self.secret, member_id, organization_id, nanos);
        URL_SAFE_NO_PAD.encode(Sha512::digest(seed.as_bytes()))
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}
