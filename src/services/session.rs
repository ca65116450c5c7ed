//! Session services - Sessioni e luogo della sessione

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{ChangePlaceDTO, CreateSessionDTO, PlaceFieldsDTO, UpdateSessionMembersDTO};
use crate::entities::{ActivePlace, Membership, MembershipRole, Session, SessionMember};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const SESSION_EDITORS: [MembershipRole; 2] = [MembershipRole::Owner, MembershipRole::Admin];

#[instrument(skip(state, membership, body), fields(org_id = %org_id))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Extension(membership): Extension<Membership>,
    Json(body): Json<CreateSessionDTO>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    // 1. Solo OWNER e ADMIN
    // 2. La sessione in corso viene chiusa e la nuova aperta nella stessa transazione

    require_role(&membership, &SESSION_EDITORS)?;

    let session = state.sessions.create_session(org_id, body).await?;

    info!("Session {} created", session.id);
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state, _membership), fields(org_id = %org_id))]
pub async fn get_current_session(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Extension(_membership): Extension<Membership>,
) -> Result<Json<Option<Session>>, AppError> {
    let session = state.sessions.current_session(org_id).await?;
    debug!("Session in progress: {}", session.is_some());
    Ok(Json(session))
}

#[instrument(skip(state, _membership), fields(org_id = %org_id, session_id = %session_id))]
pub async fn get_session_place(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(_membership): Extension<Membership>,
) -> Result<Json<ActivePlace>, AppError> {
    // 1. La sessione deve appartenere all'organizzazione
    // 2. Umbrella + variante, letti insieme

    state
        .sessions
        .session_of_organization(org_id, session_id)
        .await?;

    let place = state
        .places
        .current_place(session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Session has no place").with_code("ERR_SES_PLC_08"))?;

    Ok(Json(place))
}

#[debug_handler]
#[instrument(skip(state, membership, body), fields(org_id = %org_id, session_id = %session_id))]
pub async fn replace_session_place(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(membership): Extension<Membership>,
    Json(body): Json<ChangePlaceDTO>,
) -> Result<Json<ActivePlace>, AppError> {
    debug!("Replacing session place with a {} place", body.place_type);

    require_role(&membership, &SESSION_EDITORS)?;
    state
        .sessions
        .session_of_organization(org_id, session_id)
        .await?;

    let place = state
        .places
        .replace_place(session_id, body.place_type, body.fields)
        .await?;

    Ok(Json(place))
}

#[instrument(skip(state, membership, body), fields(org_id = %org_id, session_id = %session_id))]
pub async fn update_session_place(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(membership): Extension<Membership>,
    Json(body): Json<PlaceFieldsDTO>,
) -> Result<Json<ActivePlace>, AppError> {
    require_role(&membership, &SESSION_EDITORS)?;
    state
        .sessions
        .session_of_organization(org_id, session_id)
        .await?;

    let place = state.places.update_place(session_id, body).await?;

    info!("Session place {} updated", place.umbrella.id);
    Ok(Json(place))
}

#[instrument(skip(state, membership), fields(org_id = %org_id, session_id = %session_id))]
pub async fn delete_session_place(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(membership): Extension<Membership>,
) -> Result<StatusCode, AppError> {
    require_role(&membership, &SESSION_EDITORS)?;
    state
        .sessions
        .session_of_organization(org_id, session_id)
        .await?;

    state.places.delete_place(session_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _membership), fields(org_id = %org_id, session_id = %session_id))]
pub async fn get_session_members(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(_membership): Extension<Membership>,
) -> Result<Json<Vec<SessionMember>>, AppError> {
    let members = state.sessions.session_members(org_id, session_id).await?;
    Ok(Json(members))
}

#[instrument(skip(state, membership, body), fields(org_id = %org_id, session_id = %session_id))]
pub async fn update_session_members(
    State(state): State<Arc<AppState>>,
    Path((org_id, session_id)): Path<(i64, i64)>,
    Extension(membership): Extension<Membership>,
    Json(body): Json<UpdateSessionMembersDTO>,
) -> Result<Json<Vec<SessionMember>>, AppError> {
    // 1. Solo OWNER e ADMIN
    // 2. La lista ricevuta sostituisce quella attuale, in una transazione

    require_role(&membership, &SESSION_EDITORS)?;

    let members = state
        .sessions
        .update_session_members(org_id, session_id, body.membership_ids)
        .await?;

    Ok(Json(members))
}
