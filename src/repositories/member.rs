//! MemberRepository - Repository per la gestione dei member

use super::{Create, Read};
use crate::dtos::CreateMemberDTO;
use crate::entities::Member;
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

pub struct MemberRepository;

impl MemberRepository {
    /// Phone is the natural key of a member.
    pub async fn find_by_phone(
        conn: &mut SqliteConnection,
        phone: &str,
    ) -> Result<Option<Member>, Error> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<Member>, Error> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE email = ? ORDER BY id LIMIT 1")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
    }
}

impl Create<Member, CreateMemberDTO> for MemberRepository {
    async fn create(conn: &mut SqliteConnection, data: &CreateMemberDTO) -> Result<Member, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (first_name, last_name, sex, phone, email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.sex)
        .bind(&data.phone)
        .bind(data.email.as_deref().unwrap_or(""))
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Read<Member, i64> for MemberRepository {
    async fn read(conn: &mut SqliteConnection, id: &i64) -> Result<Option<Member>, Error> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }
}
