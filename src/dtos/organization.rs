//! Organization DTOs - Data Transfer Objects per organizzazioni e membri

use crate::entities::{MembershipRole, MembershipStatus, Organization, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per creare una nuova organizzazione (il creatore arriva dall'identità)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateOrganizationDTO {
    #[validate(length(min = 1, max = 255, message = "Organization name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: String,
}

/// Parametri interni: organizzazione + fondatore
#[derive(Debug, Clone)]
pub struct NewOrganizationDTO {
    pub name: String,
    pub description: String,
    pub created_by: i64,
}

/// Organizzazione con la sessione in corso, se presente
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrganizationDTO {
    #[serde(flatten)]
    pub organization: Organization,
    pub current_session: Option<Session>,
}

/// Membership × Member, una riga per membro dell'organizzazione
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrganizationMemberDTO {
    pub membership_id: i64,
    pub member_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub position: String,
    pub role: MembershipRole,
    pub status: MembershipStatus,
    pub joined: bool,
    pub joined_at: Option<DateTime<Utc>>,
}

/// DTO per creare una nuova membership
#[derive(Debug, Clone)]
pub struct CreateMembershipDTO {
    pub organization_id: i64,
    pub member_id: i64,
    pub role: MembershipRole,
    /// Founders join immediately; invitees wait for approval.
    pub joined: bool,
}
