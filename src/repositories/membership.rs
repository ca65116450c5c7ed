//! MembershipRepository - Repository per il legame member-organizzazione
//!
//! There is no unique constraint on (member_id, organization_id): callers look up
//! before inserting, inside the same transaction.

use super::Create;
use crate::dtos::{CreateMembershipDTO, OrganizationMemberDTO};
use crate::entities::{Membership, MembershipStatus};
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

pub struct MembershipRepository;

impl MembershipRepository {
    pub async fn find_by_member_and_organization(
        conn: &mut SqliteConnection,
        member_id: i64,
        organization_id: i64,
    ) -> Result<Option<Membership>, Error> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE member_id = ? AND organization_id = ? LIMIT 1",
        )
        .bind(member_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn find_in_organization(
        conn: &mut SqliteConnection,
        organization_id: i64,
        membership_id: i64,
    ) -> Result<Option<Membership>, Error> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE id = ? AND organization_id = ?",
        )
        .bind(membership_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Flips the membership to joined. `RowNotFound` if it does not exist.
    pub async fn approve(
        conn: &mut SqliteConnection,
        membership_id: i64,
    ) -> Result<Membership, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Membership>(
            "UPDATE memberships SET joined = TRUE, joined_at = ?, updated_at = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(now)
        .bind(now)
        .bind(membership_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn members_of_organization(
        conn: &mut SqliteConnection,
        organization_id: i64,
    ) -> Result<Vec<OrganizationMemberDTO>, Error> {
        sqlx::query_as::<_, OrganizationMemberDTO>(
            "SELECT ms.id AS membership_id, m.id AS member_id, m.first_name, m.last_name, m.sex,
                    m.phone, m.email, ms.position, ms.role, ms.status, ms.joined, ms.joined_at
             FROM memberships ms
             JOIN members m ON m.id = ms.member_id
             WHERE ms.organization_id = ?
             ORDER BY ms.id",
        )
        .bind(organization_id)
        .fetch_all(&mut *conn)
        .await
    }
}

impl Create<Membership, CreateMembershipDTO> for MembershipRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &CreateMembershipDTO,
    ) -> Result<Membership, Error> {
        let now = Utc::now();
        let joined_at = data.joined.then_some(now);
        sqlx::query_as::<_, Membership>(
            "INSERT INTO memberships
                (organization_id, member_id, role, status, joined, joined_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(data.organization_id)
        .bind(data.member_id)
        .bind(data.role)
        .bind(MembershipStatus::Active)
        .bind(data.joined)
        .bind(joined_at)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}
