//! Membership & Invitation manager
//!
//! Owns the multi-table transitions of the membership ledger: founding an organization,
//! issuing invitations (at most one active per membership) and approving them.
//! Every write goes through [`Gateway::run_in_transaction`]; each step tags its failure
//! with a stable code.

use crate::core::{AppError, StepContext};
use crate::dtos::{
    CreateInvitationDTO, CreateMemberDTO, CreateMembershipDTO, CreateOrganizationDTO,
    InvitationDetailsDTO, IssuedInvitationDTO, NewOrganizationDTO, OrganizationMemberDTO,
};
use crate::entities::{Invitation, Member, Membership, MembershipRole, Organization};
use crate::repositories::{
    Create, Gateway, InvitationRepository, MemberRepository, MembershipRepository,
    OrganizationRepository, Read,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};

/// True once more than `window` has elapsed since `created_at`.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(created_at) > window
}

#[derive(Clone, Debug)]
pub struct MembershipManager {
    gateway: Gateway,
    invitation_expiry: Duration,
}

impl MembershipManager {
    pub fn new(gateway: Gateway, invitation_expiry: Duration) -> Self {
        Self {
            gateway,
            invitation_expiry,
        }
    }

    /// Creates the organization and its founder's joined membership, or neither.
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_organization_with_founding_membership(
        &self,
        creator_id: i64,
        data: CreateOrganizationDTO,
    ) -> Result<Organization, AppError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("Organization name is required"));
        }
        if creator_id <= 0 {
            return Err(AppError::bad_request("Organization creator is not valid"));
        }

        let new_organization = NewOrganizationDTO {
            name,
            description: data.description,
            created_by: creator_id,
        };

        let organization: Organization = self
            .gateway
            .run_in_transaction(move |conn| {
                Box::pin(create_organization_tx(conn, new_organization.clone()))
            })
            .await?;

        info!("Organization {} founded by member {}", organization.id, creator_id);
        Ok(organization)
    }

    /// Ensures a pending membership exists, supersedes its active invitation and
    /// stores a new one carrying `token`.
    #[instrument(skip(self, token))]
    pub async fn issue_invitation(
        &self,
        member_id: i64,
        organization_id: i64,
        token: String,
    ) -> Result<IssuedInvitationDTO, AppError> {
        let issued: IssuedInvitationDTO = self
            .gateway
            .run_in_transaction(move |conn| {
                Box::pin(issue_invitation_tx(
                    conn,
                    member_id,
                    organization_id,
                    token.clone(),
                ))
            })
            .await?;

        info!(
            "Invitation {} issued for membership {}",
            issued.invitation.id, issued.membership.id
        );
        Ok(issued)
    }

    /// Consumes the invitation and marks its membership joined.
    ///
    /// A link that is unknown or already consumed fails with not-found, so a second
    /// approval never touches the membership again.
    #[instrument(skip(self, link))]
    pub async fn approve_invitation(&self, link: &str) -> Result<Membership, AppError> {
        let link = link.to_string();
        let membership: Membership = self
            .gateway
            .run_in_transaction(move |conn| Box::pin(approve_invitation_tx(conn, link.clone())))
            .await?;

        info!(
            "Member {} joined organization {}",
            membership.member_id, membership.organization_id
        );
        Ok(membership)
    }

    /// Invitation landing data. Rejects inactive or expired invitations and, when a
    /// caller is known, invitations addressed to someone else.
    #[instrument(skip(self, link, caller))]
    pub async fn get_invitation(
        &self,
        link: &str,
        caller: Option<&Member>,
    ) -> Result<InvitationDetailsDTO, AppError> {
        let mut conn = self.gateway.acquire().await?;
        let details = InvitationRepository::details_by_link(&mut *conn, link)
            .await
            .step("ERR_GINV_602", "Failed to load invitation")?
            .ok_or_else(|| {
                warn!("Invitation link does not exist");
                AppError::not_found("Invitation not found").with_code("ERR_GINV_601")
            })?;

        if let Some(caller) = caller {
            if !details.addressed_to(caller) {
                warn!("Member {} opened an invitation addressed to someone else", caller.id);
                return Err(AppError::forbidden("Invitation belongs to another member")
                    .with_code("ERR_GINV_606"));
            }
        }

        if !details.active {
            return Err(AppError::bad_request("Invitation is no longer active")
                .with_code("ERR_GINV_603"));
        }

        if is_expired(details.created_at, Utc::now(), self.invitation_expiry) {
            return Err(AppError::bad_request("Invitation has expired").with_code("ERR_GINV_604"));
        }

        Ok(details)
    }

    #[instrument(skip(self))]
    pub async fn organization(&self, organization_id: i64) -> Result<Organization, AppError> {
        let mut conn = self.gateway.acquire().await?;
        OrganizationRepository::read(&mut *conn, &organization_id)
            .await
            .step("ERR_GORG_01", "Failed to load organization")?
            .ok_or_else(|| AppError::not_found("Organization not found").with_code("ERR_GORG_02"))
    }

    #[instrument(skip(self))]
    pub async fn organizations_of_member(
        &self,
        member_id: i64,
    ) -> Result<Vec<Organization>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        OrganizationRepository::find_many_by_member(&mut *conn, member_id)
            .await
            .step("ERR_LORG_01", "Failed to list organizations")
    }

    #[instrument(skip(self))]
    pub async fn members_of_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<OrganizationMemberDTO>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        MembershipRepository::members_of_organization(&mut *conn, organization_id)
            .await
            .step("ERR_LMBR_01", "Failed to list organization members")
    }

    pub async fn member(&self, member_id: i64) -> Result<Option<Member>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        Ok(MemberRepository::read(&mut *conn, &member_id).await?)
    }

    pub async fn find_member(&self, phone: &str) -> Result<Option<Member>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        Ok(MemberRepository::find_by_phone(&mut *conn, phone).await?)
    }

    /// Invitee lookup by phone, with a non-empty `email` as a second key.
    ///
    /// Both keys must name the same member (or none): an email that belongs to someone
    /// else is a conflict, never a match.
    pub async fn resolve_invitee(
        &self,
        phone: &str,
        email: Option<&str>,
    ) -> Result<Option<Member>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        let by_phone = MemberRepository::find_by_phone(&mut *conn, phone).await?;

        let Some(email) = email.filter(|e| !e.is_empty()) else {
            return Ok(by_phone);
        };
        let by_email = MemberRepository::find_by_email(&mut *conn, email).await?;

        match by_email {
            None => Ok(by_phone),
            Some(other) if by_phone.as_ref().is_some_and(|m| m.id == other.id) => Ok(by_phone),
            Some(other) => {
                warn!(
                    "Email of the invitee belongs to member {}, not to the invited phone",
                    other.id
                );
                Err(AppError::conflict("Phone and email belong to different members")
                    .with_code("ERR_IMIO_508"))
            }
        }
    }

    pub async fn create_member(&self, data: &CreateMemberDTO) -> Result<Member, AppError> {
        let mut conn = self.gateway.acquire().await?;
        let member = MemberRepository::create(&mut *conn, data).await?;
        debug!("Member {} created", member.id);
        Ok(member)
    }

    pub async fn find_membership(
        &self,
        member_id: i64,
        organization_id: i64,
    ) -> Result<Option<Membership>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        Ok(
            MembershipRepository::find_by_member_and_organization(
                &mut *conn,
                member_id,
                organization_id,
            )
            .await?,
        )
    }

    pub async fn active_invitation(
        &self,
        membership_id: i64,
    ) -> Result<Option<Invitation>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        Ok(InvitationRepository::find_active_by_membership(&mut *conn, membership_id).await?)
    }

    pub async fn invitation_by_link(&self, link: &str) -> Result<Option<Invitation>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        Ok(InvitationRepository::find_by_link(&mut *conn, link).await?)
    }
}

// ************************* UNITS OF WORK ************************* //

async fn create_organization_tx(
    conn: &mut SqliteConnection,
    data: NewOrganizationDTO,
) -> Result<Organization, AppError> {
    let organization = OrganizationRepository::create(conn, &data)
        .await
        .step("ERR_CRT_ORG_MBRSHP_01", "Failed to create organization")?;

    MembershipRepository::create(
        conn,
        &CreateMembershipDTO {
            organization_id: organization.id,
            member_id: data.created_by,
            role: MembershipRole::Owner,
            joined: true,
        },
    )
    .await
    .step("ERR_CRT_ORG_MBRSHP_02", "Failed to create founding membership")?;

    Ok(organization)
}

async fn issue_invitation_tx(
    conn: &mut SqliteConnection,
    member_id: i64,
    organization_id: i64,
    token: String,
) -> Result<IssuedInvitationDTO, AppError> {
    let organization = OrganizationRepository::read(conn, &organization_id)
        .await
        .step("ERR_CRT_INV_00", "Failed to load organization")?
        .ok_or_else(|| AppError::not_found("Organization not found").with_code("ERR_CRT_INV_00"))?;

    // 1. membership pendente (riusata se esiste già)
    let existing =
        MembershipRepository::find_by_member_and_organization(conn, member_id, organization_id)
            .await
            .step("ERR_CRT_INV_01", "Failed to look up membership")?;
    let membership = match existing {
        Some(membership) => membership,
        None => MembershipRepository::create(
            conn,
            &CreateMembershipDTO {
                organization_id,
                member_id,
                role: MembershipRole::Member,
                joined: false,
            },
        )
        .await
        .step("ERR_CRT_INV_01", "Failed to create membership")?,
    };

    // 2. disattiva l'invito precedente, se c'è
    let superseded = InvitationRepository::deactivate_for_membership(conn, membership.id)
        .await
        .step("ERR_CRT_INV_02", "Failed to deactivate previous invitation")?;
    if superseded > 0 {
        debug!("Superseded {} invitation(s) of membership {}", superseded, membership.id);
    }

    // 3. nuovo invito attivo
    let invitation = InvitationRepository::create(
        conn,
        &CreateInvitationDTO {
            link: token,
            membership_id: membership.id,
        },
    )
    .await
    .step("ERR_CRT_INV_03", "Failed to create invitation")?;

    Ok(IssuedInvitationDTO {
        organization,
        membership,
        invitation,
    })
}

async fn approve_invitation_tx(
    conn: &mut SqliteConnection,
    link: String,
) -> Result<Membership, AppError> {
    let membership_id = InvitationRepository::consume_by_link(conn, &link)
        .await
        .step("ERR_APR_ORG_INV_01", "Failed to close invitation")?
        .ok_or_else(|| {
            AppError::not_found("Invitation not found or already used")
                .with_code("ERR_APR_ORG_INV_01")
        })?;

    MembershipRepository::approve(conn, membership_id)
        .await
        .step("ERR_APR_ORG_INV_02", "Failed to approve membership")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_strictly_after_the_window() {
        let created = Utc::now();
        let window = Duration::hours(24);
        assert!(!is_expired(created, created, window));
        assert!(!is_expired(created, created + window, window));
        assert!(is_expired(created, created + window + Duration::seconds(1), window));
    }
}
