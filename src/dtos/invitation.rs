//! Invitation DTOs - Data Transfer Objects per inviti

use crate::entities::{Invitation, Member, Membership, Organization};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO per creare un nuovo invito (senza id, active e timestamp)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInvitationDTO {
    pub link: String,
    pub membership_id: i64,
}

/// Result of issuing an invitation: the rows it touched plus the organization context.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssuedInvitationDTO {
    pub organization: Organization,
    pub membership: Membership,
    pub invitation: Invitation,
}

/// Invitation landing view: Invitation ⨝ Membership ⨝ Member ⨝ Organization
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvitationDetailsDTO {
    pub link: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub membership_id: i64,
    pub joined: bool,
    pub member_id: i64,
    pub member_first_name: String,
    pub member_last_name: String,
    pub member_phone: String,
    pub member_email: String,
    pub organization_id: i64,
    pub organization_name: String,
    pub organization_description: String,
}

impl InvitationDetailsDTO {
    /// True when `caller` is the person this invitation was addressed to.
    pub fn addressed_to(&self, caller: &Member) -> bool {
        caller.phone == self.member_phone
            || (!caller.email.is_empty() && caller.email == self.member_email)
    }
}
