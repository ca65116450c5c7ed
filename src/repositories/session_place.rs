//! SessionPlace repositories - Umbrella e varianti del luogo di una sessione
//!
//! Plain single-table accessors. Keeping umbrella and variant consistent is the job of
//! the session place manager, which always calls these inside one transaction.

use super::{Create, Delete};
use crate::entities::{
    PlaceType, SessionPlace, SessionPlaceGivenVenue, SessionPlaceMemberHome, SessionPlaceOnline,
};
use chrono::Utc;
use sqlx::{Error, SqliteConnection};

/// DTO per creare l'umbrella
#[derive(Debug, Clone)]
pub struct NewSessionPlace {
    pub session_id: i64,
    pub place_type: PlaceType,
}

#[derive(Debug, Clone)]
pub struct NewOnlinePlace {
    pub session_place_id: i64,
    pub platform: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct NewGivenVenuePlace {
    pub session_place_id: i64,
    pub name: String,
    pub location: String,
}

// ************************* UMBRELLA ************************* //

pub struct SessionPlaceRepository;

impl SessionPlaceRepository {
    pub async fn find_by_session(
        conn: &mut SqliteConnection,
        session_id: i64,
    ) -> Result<Option<SessionPlace>, Error> {
        sqlx::query_as::<_, SessionPlace>(
            "SELECT * FROM session_places WHERE session_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn touch(conn: &mut SqliteConnection, id: i64) -> Result<SessionPlace, Error> {
        sqlx::query_as::<_, SessionPlace>(
            "UPDATE session_places SET updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Create<SessionPlace, NewSessionPlace> for SessionPlaceRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &NewSessionPlace,
    ) -> Result<SessionPlace, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, SessionPlace>(
            "INSERT INTO session_places (session_id, place_type, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING *",
        )
        .bind(data.session_id)
        .bind(data.place_type)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Delete<i64> for SessionPlaceRepository {
    async fn delete(conn: &mut SqliteConnection, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM session_places WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

// ************************* ONLINE ************************* //

pub struct OnlinePlaceRepository;

impl OnlinePlaceRepository {
    pub async fn find_by_place(
        conn: &mut SqliteConnection,
        session_place_id: i64,
    ) -> Result<Option<SessionPlaceOnline>, Error> {
        sqlx::query_as::<_, SessionPlaceOnline>(
            "SELECT * FROM session_places_online WHERE session_place_id = ?",
        )
        .bind(session_place_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        platform: &str,
        link: &str,
    ) -> Result<SessionPlaceOnline, Error> {
        sqlx::query_as::<_, SessionPlaceOnline>(
            "UPDATE session_places_online SET platform = ?, link = ?, updated_at = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(platform)
        .bind(link)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Create<SessionPlaceOnline, NewOnlinePlace> for OnlinePlaceRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &NewOnlinePlace,
    ) -> Result<SessionPlaceOnline, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, SessionPlaceOnline>(
            "INSERT INTO session_places_online (session_place_id, platform, link, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(data.session_place_id)
        .bind(&data.platform)
        .bind(&data.link)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Delete<i64> for OnlinePlaceRepository {
    async fn delete(conn: &mut SqliteConnection, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM session_places_online WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

// ************************* GIVEN VENUE ************************* //

pub struct GivenVenuePlaceRepository;

impl GivenVenuePlaceRepository {
    pub async fn find_by_place(
        conn: &mut SqliteConnection,
        session_place_id: i64,
    ) -> Result<Option<SessionPlaceGivenVenue>, Error> {
        sqlx::query_as::<_, SessionPlaceGivenVenue>(
            "SELECT * FROM session_places_given_venue WHERE session_place_id = ?",
        )
        .bind(session_place_id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        name: &str,
        location: &str,
    ) -> Result<SessionPlaceGivenVenue, Error> {
        sqlx::query_as::<_, SessionPlaceGivenVenue>(
            "UPDATE session_places_given_venue SET name = ?, location = ?, updated_at = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(name)
        .bind(location)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Create<SessionPlaceGivenVenue, NewGivenVenuePlace> for GivenVenuePlaceRepository {
    async fn create(
        conn: &mut SqliteConnection,
        data: &NewGivenVenuePlace,
    ) -> Result<SessionPlaceGivenVenue, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, SessionPlaceGivenVenue>(
            "INSERT INTO session_places_given_venue (session_place_id, name, location, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(data.session_place_id)
        .bind(&data.name)
        .bind(&data.location)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Delete<i64> for GivenVenuePlaceRepository {
    async fn delete(conn: &mut SqliteConnection, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM session_places_given_venue WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

// ************************* MEMBER HOME ************************* //

pub struct MemberHomePlaceRepository;

impl MemberHomePlaceRepository {
    pub async fn find_by_place(
        conn: &mut SqliteConnection,
        session_place_id: i64,
    ) -> Result<Option<SessionPlaceMemberHome>, Error> {
        sqlx::query_as::<_, SessionPlaceMemberHome>(
            "SELECT * FROM session_places_member_home WHERE session_place_id = ?",
        )
        .bind(session_place_id)
        .fetch_optional(&mut *conn)
        .await
    }
}

impl Create<SessionPlaceMemberHome, i64> for MemberHomePlaceRepository {
    /// `data` is the umbrella id; this variant has no fields of its own.
    async fn create(
        conn: &mut SqliteConnection,
        data: &i64,
    ) -> Result<SessionPlaceMemberHome, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, SessionPlaceMemberHome>(
            "INSERT INTO session_places_member_home (session_place_id, created_at, updated_at)
             VALUES (?, ?, ?)
             RETURNING *",
        )
        .bind(data)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }
}

impl Delete<i64> for MemberHomePlaceRepository {
    async fn delete(conn: &mut SqliteConnection, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM session_places_member_home WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
