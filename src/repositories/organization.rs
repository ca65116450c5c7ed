//! OrganizationRepository - Repository per la gestione delle organizzazioni

use super::{Create, Read};
use crate::dtos::NewOrganizationDTO;
use crate::entities::Organization;
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

pub struct OrganizationRepository;

impl OrganizationRepository {
    /// Organizations the member has joined, newest first.
    pub async fn find_many_by_member(
        conn: &mut SqliteConnection,
        member_id: i64,
    ) -> Result<Vec<Organization>, Error> {
        sqlx::query_as::<_, Organization>(
            "SELECT o.* FROM organizations o
             JOIN memberships m ON m.organization_id = o.id
             WHERE m.member_id = ? AND m.joined = TRUE
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(member_id)
        .fetch_all(&mut *conn)
        .await
    }
}

impl Create<Organization, NewOrganizationDTO> for OrganizationRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &NewOrganizationDTO,
    ) -> Result<Organization, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (name, description, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Read<Organization, i64> for OrganizationRepository {
    async fn read(conn: &mut SqliteConnection, id: &i64) -> Result<Option<Organization>, Error> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }
}
