//! Session manager - at most one session in progress per organization

use crate::core::{AppError, StepContext};
use crate::dtos::{CreateSessionDTO, NewSessionDTO};
use crate::entities::{Session, SessionMember};
use crate::repositories::{
    Create, Gateway, MembershipRepository, NewSessionMember, SessionMemberRepository,
    SessionRepository,
};
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[derive(Clone, Debug)]
pub struct SessionManager {
    gateway: Gateway,
}

impl SessionManager {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Ends whatever session is in progress and starts a new one, atomically.
    #[instrument(skip(self, data))]
    pub async fn create_session(
        &self,
        organization_id: i64,
        data: CreateSessionDTO,
    ) -> Result<Session, AppError> {
        data.validate()?;

        let new_session = NewSessionDTO {
            organization_id,
            start_date: data.start_date,
            end_date: data.end_date,
        };

        let session: Session = self
            .gateway
            .run_in_transaction(move |conn| Box::pin(create_session_tx(conn, new_session.clone())))
            .await?;

        info!("Session {} started for organization {}", session.id, organization_id);
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn current_session(&self, organization_id: i64) -> Result<Option<Session>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        SessionRepository::find_in_progress(&mut *conn, organization_id)
            .await
            .step("ERR_GSES_01", "Failed to load current session")
    }

    /// The session, provided it belongs to the organization.
    #[instrument(skip(self))]
    pub async fn session_of_organization(
        &self,
        organization_id: i64,
        session_id: i64,
    ) -> Result<Session, AppError> {
        let mut conn = self.gateway.acquire().await?;
        SessionRepository::find_in_organization(&mut *conn, organization_id, session_id)
            .await
            .step("ERR_GSES_01", "Failed to load session")?
            .ok_or_else(session_not_found)
    }

    /// Replaces the members of a session with `membership_ids`, atomically.
    ///
    /// Every membership must belong to the organization; an empty list clears the session.
    #[instrument(skip(self, membership_ids), fields(count = membership_ids.len()))]
    pub async fn update_session_members(
        &self,
        organization_id: i64,
        session_id: i64,
        mut membership_ids: Vec<i64>,
    ) -> Result<Vec<SessionMember>, AppError> {
        membership_ids.sort_unstable();
        membership_ids.dedup();

        let members: Vec<SessionMember> = self
            .gateway
            .run_in_transaction(move |conn| {
                Box::pin(update_session_members_tx(
                    conn,
                    organization_id,
                    session_id,
                    membership_ids.clone(),
                ))
            })
            .await?;

        info!("Session {} now has {} member(s)", session_id, members.len());
        Ok(members)
    }

    #[instrument(skip(self))]
    pub async fn session_members(
        &self,
        organization_id: i64,
        session_id: i64,
    ) -> Result<Vec<SessionMember>, AppError> {
        let mut conn = self.gateway.acquire().await?;
        SessionRepository::find_in_organization(&mut *conn, organization_id, session_id)
            .await
            .step("ERR_GSES_01", "Failed to load session")?
            .ok_or_else(session_not_found)?;

        SessionMemberRepository::list_by_session(&mut *conn, session_id)
            .await
            .step("ERR_GSES_MBR_01", "Failed to list session members")
    }
}

fn session_not_found() -> AppError {
    AppError::not_found("Session not found").with_code("ERR_GSES_02")
}

async fn create_session_tx(
    conn: &mut SqliteConnection,
    data: NewSessionDTO,
) -> Result<Session, AppError> {
    let cleared = SessionRepository::clear_in_progress(conn, data.organization_id)
        .await
        .step("ERR_CRT_SES_01", "Failed to close the session in progress")?;
    debug!("{} session(s) no longer in progress", cleared);

    SessionRepository::create(conn, &data)
        .await
        .step("ERR_CRT_SES_02", "Failed to create session")
}

async fn update_session_members_tx(
    conn: &mut SqliteConnection,
    organization_id: i64,
    session_id: i64,
    membership_ids: Vec<i64>,
) -> Result<Vec<SessionMember>, AppError> {
    SessionRepository::find_in_organization(conn, organization_id, session_id)
        .await
        .step("ERR_GSES_01", "Failed to load session")?
        .ok_or_else(session_not_found)?;

    // 0. tutte le membership devono essere dell'organizzazione
    let mut foreign = Vec::new();
    for &membership_id in &membership_ids {
        let found = MembershipRepository::find_in_organization(conn, organization_id, membership_id)
            .await
            .step("ERR_UPD_SESS_MBR_00", "Failed to load membership")?;
        if found.is_none() {
            foreign.push(membership_id);
        }
    }
    if !foreign.is_empty() {
        warn!("Memberships {:?} are not in organization {}", foreign, organization_id);
        return Err(
            AppError::bad_request("Some memberships do not belong to the organization")
                .with_code("ERR_UPD_SESS_MBR_00")
                .with_details(format!("{:?}", foreign)),
        );
    }

    // 1. via i membri attuali
    let removed = SessionMemberRepository::remove_all(conn, organization_id, session_id)
        .await
        .step("ERR_UPD_SESS_MBR_01", "Failed to remove session members")?;
    debug!("{} member(s) removed from session {}", removed, session_id);

    // 2. poi i nuovi
    let mut members = Vec::with_capacity(membership_ids.len());
    for membership_id in membership_ids {
        let member = SessionMemberRepository::create(
            conn,
            &NewSessionMember {
                membership_id,
                session_id,
            },
        )
        .await
        .step("ERR_UPD_SESS_MBR_02", "Failed to add session member")?;
        members.push(member);
    }

    Ok(members)
}
