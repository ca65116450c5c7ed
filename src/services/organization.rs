//! Organization services - Organizzazioni, membri e inviti in blocco

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    CreateOrganizationDTO, InvitationOutcome, InviteMembersDTO, OrganizationDTO,
    OrganizationMemberDTO,
};
use crate::entities::{Member, Membership, MembershipRole, Organization};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state, current_member, body), fields(member_id = %current_member.id))]
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Extension(current_member): Extension<Member>,
    Json(body): Json<CreateOrganizationDTO>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    debug!("Creating organization");
    // 1. Validare il body
    // 2. Creare organizzazione + membership del fondatore (OWNER, joined) in transazione
    // 3. Ritornare l'organizzazione creata

    body.validate()?;

    let organization = state
        .memberships
        .create_organization_with_founding_membership(current_member.id, body)
        .await?;

    info!("Organization {} created", organization.id);
    Ok((StatusCode::CREATED, Json(organization)))
}

#[instrument(skip(state, current_member), fields(member_id = %current_member.id))]
pub async fn list_my_organizations(
    State(state): State<Arc<AppState>>,
    Extension(current_member): Extension<Member>,
) -> Result<Json<Vec<Organization>>, AppError> {
    let organizations = state
        .memberships
        .organizations_of_member(current_member.id)
        .await?;

    debug!("Member belongs to {} organization(s)", organizations.len());
    Ok(Json(organizations))
}

#[instrument(skip(state, _membership), fields(org_id = %org_id))]
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Extension(_membership): Extension<Membership>, // verificata da organization_membership_middleware
) -> Result<Json<OrganizationDTO>, AppError> {
    // 1. Organizzazione
    // 2. Sessione in corso, se presente

    let (organization, current_session) = tokio::try_join!(
        state.memberships.organization(org_id),
        state.sessions.current_session(org_id),
    )?;

    Ok(Json(OrganizationDTO {
        organization,
        current_session,
    }))
}

#[instrument(skip(state, _membership), fields(org_id = %org_id))]
pub async fn list_organization_members(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Extension(_membership): Extension<Membership>,
) -> Result<Json<Vec<OrganizationMemberDTO>>, AppError> {
    let members = state.memberships.members_of_organization(org_id).await?;

    info!("Found {} members", members.len());
    Ok(Json(members))
}

#[debug_handler]
#[instrument(skip(state, current_member, membership, body), fields(org_id = %org_id, requester = %current_member.id))]
pub async fn invite_members(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Extension(current_member): Extension<Member>,
    Extension(membership): Extension<Membership>,
    Json(body): Json<InviteMembersDTO>,
) -> Result<Json<Vec<InvitationOutcome>>, AppError> {
    debug!("Inviting members into organization");
    // 1. Solo OWNER e ADMIN possono invitare
    // 2. Il batch non può essere vuoto; le singole voci vengono validate dal dispatcher
    // 3. Esito per voce, sempre 200

    require_role(&membership, &[MembershipRole::Owner, MembershipRole::Admin])?;

    body.validate()?;

    let outcomes = state
        .dispatcher
        .invite_members(org_id, &current_member, body.members, body.re_invitation)
        .await?;

    Ok(Json(outcomes))
}
