//! Membership entity - Legame tra member e organizzazione

use super::enums::{MembershipRole, MembershipStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Membership {
    pub id: i64,
    pub organization_id: i64,
    pub member_id: i64,
    pub position: String,
    pub role: MembershipRole,
    pub status: MembershipStatus,
    // false finché l'invito non viene approvato
    pub joined: bool,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
