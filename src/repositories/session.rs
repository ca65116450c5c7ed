//! SessionRepository - Repository per le sessioni

use super::Create;
use crate::dtos::NewSessionDTO;
use crate::entities::Session;
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

pub struct SessionRepository;

impl SessionRepository {
    pub async fn clear_in_progress(
        conn: &mut SqliteConnection,
        organization_id: i64,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            "UPDATE sessions SET in_progress = FALSE, updated_at = ?
             WHERE organization_id = ? AND in_progress = TRUE",
        )
        .bind(Utc::now())
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_in_progress(
        conn: &mut SqliteConnection,
        organization_id: i64,
    ) -> Result<Option<Session>, Error> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE organization_id = ? AND in_progress = TRUE LIMIT 1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn find_in_organization(
        conn: &mut SqliteConnection,
        organization_id: i64,
        session_id: i64,
    ) -> Result<Option<Session>, Error> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ? AND organization_id = ?")
            .bind(session_id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await
    }
}

impl Create<Session, NewSessionDTO> for SessionRepository {
    /// New sessions always start in progress.
    async fn create(conn: &mut SqliteConnection, data: &NewSessionDTO) -> Result<Session, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (organization_id, start_date, end_date, in_progress, created_at, updated_at)
             VALUES (?, ?, ?, TRUE, ?, ?)
             RETURNING *",
        )
        .bind(data.organization_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}
