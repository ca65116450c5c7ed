//! InvitationRepository - Repository per la gestione degli inviti

use super::Create;
use crate::dtos::{CreateInvitationDTO, InvitationDetailsDTO};
use crate::entities::Invitation;
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

pub struct InvitationRepository;

impl InvitationRepository {
    /// Deactivates every active invitation of the membership. Zero rows is fine.
    pub async fn deactivate_for_membership(
        conn: &mut SqliteConnection,
        membership_id: i64,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            "UPDATE invitations SET active = FALSE, updated_at = ?
             WHERE membership_id = ? AND active = TRUE",
        )
        .bind(Utc::now())
        .bind(membership_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Consumes an active invitation and returns its membership id.
    /// `None` if the link is unknown or already inactive.
    pub async fn consume_by_link(
        conn: &mut SqliteConnection,
        link: &str,
    ) -> Result<Option<i64>, Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE invitations SET active = FALSE, updated_at = ?
             WHERE link = ? AND active = TRUE
             RETURNING membership_id",
        )
        .bind(Utc::now())
        .bind(link)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn find_by_link(
        conn: &mut SqliteConnection,
        link: &str,
    ) -> Result<Option<Invitation>, Error> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE link = ?")
            .bind(link)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn find_active_by_membership(
        conn: &mut SqliteConnection,
        membership_id: i64,
    ) -> Result<Option<Invitation>, Error> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE membership_id = ? AND active = TRUE
             ORDER BY id DESC LIMIT 1",
        )
        .bind(membership_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn details_by_link(
        conn: &mut SqliteConnection,
        link: &str,
    ) -> Result<Option<InvitationDetailsDTO>, Error> {
        sqlx::query_as::<_, InvitationDetailsDTO>(
            "SELECT i.link, i.active, i.created_at, i.membership_id, ms.joined,
                    m.id AS member_id, m.first_name AS member_first_name,
                    m.last_name AS member_last_name, m.phone AS member_phone,
                    m.email AS member_email,
                    o.id AS organization_id, o.name AS organization_name,
                    o.description AS organization_description
             FROM invitations i
             JOIN memberships ms ON ms.id = i.membership_id
             JOIN members m ON m.id = ms.member_id
             JOIN organizations o ON o.id = ms.organization_id
             WHERE i.link = ?",
        )
        .bind(link)
        .fetch_optional(&mut *conn)
        .await
    }
}

impl Create<Invitation, CreateInvitationDTO> for InvitationRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &CreateInvitationDTO,
    ) -> Result<Invitation, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Invitation>(
            "INSERT INTO invitations (link, active, membership_id, created_at, updated_at)
             VALUES (?, TRUE, ?, ?, ?)
             RETURNING *",
        )
        .bind(&data.link)
        .bind(data.membership_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}
