//! Invitation services - Pagina di invito e approvazione

use crate::core::{AppError, AppState, CallerIdentity};
use crate::dtos::InvitationDetailsDTO;
use crate::entities::Membership;
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{info, instrument};

#[instrument(skip(state, link, caller))]
pub async fn get_invitation(
    State(state): State<Arc<AppState>>,
    Path(link): Path<String>,
    Extension(caller): Extension<CallerIdentity>, // inserito da optional_authentication_middleware
) -> Result<Json<InvitationDetailsDTO>, AppError> {
    // 1. Invito + membership + member + organizzazione in una lettura
    // 2. Se il chiamante è noto, l'invito deve essere suo
    // 3. Attivo e non scaduto

    let details = state
        .memberships
        .get_invitation(&link, caller.0.as_ref())
        .await?;

    Ok(Json(details))
}

#[instrument(skip(state, link))]
pub async fn approve_invitation(
    State(state): State<Arc<AppState>>,
    Path(link): Path<String>,
) -> Result<Json<Membership>, AppError> {
    let membership = state.memberships.approve_invitation(&link).await?;

    info!(
        "Invitation approved, member {} joined organization {}",
        membership.member_id, membership.organization_id
    );
    Ok(Json(membership))
}
