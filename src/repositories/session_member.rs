//! SessionMemberRepository - Membership che partecipano a una sessione

use super::Create;
use crate::entities::SessionMember;
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

#[derive(Debug, Clone)]
pub struct NewSessionMember {
    pub membership_id: i64,
    pub session_id: i64,
}

pub struct SessionMemberRepository;

impl SessionMemberRepository {
    /// Removes the session's rows whose membership belongs to the organization.
    pub async fn remove_all(
        conn: &mut SqliteConnection,
        organization_id: i64,
        session_id: i64,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            "DELETE FROM members_of_session
             WHERE session_id = ?
               AND membership_id IN (SELECT id FROM memberships WHERE organization_id = ?)",
        )
        .bind(session_id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_by_session(
        conn: &mut SqliteConnection,
        session_id: i64,
    ) -> Result<Vec<SessionMember>, Error> {
        sqlx::query_as::<_, SessionMember>(
            "SELECT * FROM members_of_session WHERE session_id = ? ORDER BY membership_id",
        )
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await
    }
}

impl Create<SessionMember, NewSessionMember> for SessionMemberRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &NewSessionMember,
    ) -> Result<SessionMember, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, SessionMember>(
            "INSERT INTO members_of_session (membership_id, session_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING *",
        )
        .bind(data.membership_id)
        .bind(data.session_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}
