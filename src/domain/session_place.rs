//! Session place manager
//!
//! A session meets in exactly one place: an umbrella row plus one variant row. Every
//! operation that touches both halves runs in a single transaction, and dispatch on the
//! variant is a `match` over [`PlaceVariant`] / [`NewPlace`].

use crate::core::{AppError, StepContext};
use crate::dtos::PlaceFieldsDTO;
use crate::entities::{ActivePlace, PlaceType, PlaceVariant};
use crate::repositories::{
    Create, Delete, Gateway, GivenVenuePlaceRepository, MemberHomePlaceRepository,
    NewGivenVenuePlace, NewOnlinePlace, NewSessionPlace, OnlinePlaceRepository,
    SessionPlaceRepository,
};
use sqlx::SqliteConnection;
use tracing::{error, info, instrument};

/// A validated request for a new place: exactly the fields its variant needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewPlace {
    Online { platform: String, link: String },
    GivenVenue { name: String, location: String },
    MemberHome,
}

/// Trimmed, non-empty value of an optional field.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn mismatch(details: &str) -> AppError {
    AppError::bad_request("Place fields do not match the place type")
        .with_code("ERR_SES_PLC_01")
        .with_details(details)
}

/// Rejects fields that belong to another variant.
fn reject_foreign_fields(place_type: PlaceType, fields: &PlaceFieldsDTO) -> Result<(), AppError> {
    let online = present(&fields.platform).is_some() || present(&fields.link).is_some();
    let venue = present(&fields.name).is_some() || present(&fields.location).is_some();

    match place_type {
        PlaceType::Online if venue => Err(mismatch("online places take only platform and link")),
        PlaceType::GivenVenue if online => {
            Err(mismatch("given venue places take only name and location"))
        }
        PlaceType::MemberHome if online || venue => {
            Err(mismatch("member home places take no fields"))
        }
        _ => Ok(()),
    }
}

impl NewPlace {
    pub fn from_fields(place_type: PlaceType, fields: &PlaceFieldsDTO) -> Result<Self, AppError> {
        reject_foreign_fields(place_type, fields)?;

        match place_type {
            PlaceType::Online => match (present(&fields.platform), present(&fields.link)) {
                (Some(platform), Some(link)) => Ok(NewPlace::Online { platform, link }),
                _ => Err(mismatch("online places require platform and link")),
            },
            PlaceType::GivenVenue => match (present(&fields.name), present(&fields.location)) {
                (Some(name), Some(location)) => Ok(NewPlace::GivenVenue { name, location }),
                _ => Err(mismatch("given venue places require name and location")),
            },
            PlaceType::MemberHome => Ok(NewPlace::MemberHome),
        }
    }

    pub fn place_type(&self) -> PlaceType {
        match self {
            NewPlace::Online { .. } => PlaceType::Online,
            NewPlace::GivenVenue { .. } => PlaceType::GivenVenue,
            NewPlace::MemberHome => PlaceType::MemberHome,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionPlaceManager {
    gateway: Gateway,
}

impl SessionPlaceManager {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Umbrella and variant read together; `None` when the session has no place.
    #[instrument(skip(self))]
    pub async fn current_place(&self, session_id: i64) -> Result<Option<ActivePlace>, AppError> {
        self.gateway
            .run_in_transaction(move |conn| Box::pin(load_current(conn, session_id)))
            .await
    }

    /// Tears down the current place (if any) and creates the requested one.
    #[instrument(skip(self, fields))]
    pub async fn replace_place(
        &self,
        session_id: i64,
        place_type: PlaceType,
        fields: PlaceFieldsDTO,
    ) -> Result<ActivePlace, AppError> {
        let new_place = NewPlace::from_fields(place_type, &fields)?;

        let place: ActivePlace = self
            .gateway
            .run_in_transaction(move |conn| {
                Box::pin(replace_place_tx(conn, session_id, new_place.clone()))
            })
            .await?;

        info!("Session {} now meets at a {} place", session_id, place.place_type());
        Ok(place)
    }

    /// Edits the fields of the current variant without changing its type.
    /// Omitted fields keep their stored value.
    #[instrument(skip(self, fields))]
    pub async fn update_place(
        &self,
        session_id: i64,
        fields: PlaceFieldsDTO,
    ) -> Result<ActivePlace, AppError> {
        self.gateway
            .run_in_transaction(move |conn| {
                Box::pin(update_place_tx(conn, session_id, fields.clone()))
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_place(&self, session_id: i64) -> Result<(), AppError> {
        self.gateway
            .run_in_transaction(move |conn| Box::pin(delete_place_tx(conn, session_id)))
            .await?;

        info!("Place of session {} removed", session_id);
        Ok(())
    }
}

// ************************* UNITS OF WORK ************************* //

fn no_place() -> AppError {
    AppError::not_found("Session has no place").with_code("ERR_SES_PLC_08")
}

async fn load_current(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Option<ActivePlace>, AppError> {
    let Some(umbrella) = SessionPlaceRepository::find_by_session(conn, session_id)
        .await
        .step("ERR_SES_PLC_02", "Failed to load session place")?
    else {
        return Ok(None);
    };

    let variant = match umbrella.place_type {
        PlaceType::Online => OnlinePlaceRepository::find_by_place(conn, umbrella.id)
            .await
            .map(|v| v.map(PlaceVariant::Online)),
        PlaceType::GivenVenue => GivenVenuePlaceRepository::find_by_place(conn, umbrella.id)
            .await
            .map(|v| v.map(PlaceVariant::GivenVenue)),
        PlaceType::MemberHome => MemberHomePlaceRepository::find_by_place(conn, umbrella.id)
            .await
            .map(|v| v.map(PlaceVariant::MemberHome)),
    }
    .step("ERR_SES_PLC_02", "Failed to load session place variant")?;

    let Some(variant) = variant else {
        error!(
            "Session place {} ({}) has no variant row",
            umbrella.id, umbrella.place_type
        );
        return Err(AppError::conflict("Session place is inconsistent")
            .with_code("ERR_SES_PLC_03"));
    };

    ActivePlace::new(umbrella, variant).map(Some).ok_or_else(|| {
        AppError::conflict("Session place is inconsistent").with_code("ERR_SES_PLC_03")
    })
}

/// Variant first, then the umbrella it hangs off.
async fn teardown(conn: &mut SqliteConnection, place: &ActivePlace) -> Result<(), AppError> {
    match &place.variant {
        PlaceVariant::Online(v) => OnlinePlaceRepository::delete(conn, &v.id).await,
        PlaceVariant::GivenVenue(v) => GivenVenuePlaceRepository::delete(conn, &v.id).await,
        PlaceVariant::MemberHome(v) => MemberHomePlaceRepository::delete(conn, &v.id).await,
    }
    .step("ERR_SES_PLC_04", "Failed to delete session place variant")?;

    SessionPlaceRepository::delete(conn, &place.umbrella.id)
        .await
        .step("ERR_SES_PLC_05", "Failed to delete session place")
}

async fn build(
    conn: &mut SqliteConnection,
    session_id: i64,
    new_place: &NewPlace,
) -> Result<ActivePlace, AppError> {
    let umbrella = SessionPlaceRepository::create(
        conn,
        &NewSessionPlace {
            session_id,
            place_type: new_place.place_type(),
        },
    )
    .await
    .step("ERR_SES_PLC_06", "Failed to create session place")?;

    let variant = match new_place {
        NewPlace::Online { platform, link } => OnlinePlaceRepository::create(
            conn,
            &NewOnlinePlace {
                session_place_id: umbrella.id,
                platform: platform.clone(),
                link: link.clone(),
            },
        )
        .await
        .map(PlaceVariant::Online),
        NewPlace::GivenVenue { name, location } => GivenVenuePlaceRepository::create(
            conn,
            &NewGivenVenuePlace {
                session_place_id: umbrella.id,
                name: name.clone(),
                location: location.clone(),
            },
        )
        .await
        .map(PlaceVariant::GivenVenue),
        NewPlace::MemberHome => MemberHomePlaceRepository::create(conn, &umbrella.id)
            .await
            .map(PlaceVariant::MemberHome),
    }
    .step("ERR_SES_PLC_07", "Failed to create session place variant")?;

    ActivePlace::new(umbrella, variant).ok_or_else(|| {
        AppError::conflict("Session place is inconsistent").with_code("ERR_SES_PLC_03")
    })
}

async fn replace_place_tx(
    conn: &mut SqliteConnection,
    session_id: i64,
    new_place: NewPlace,
) -> Result<ActivePlace, AppError> {
    if let Some(current) = load_current(conn, session_id).await? {
        teardown(conn, &current).await?;
    }
    build(conn, session_id, &new_place).await
}

async fn update_place_tx(
    conn: &mut SqliteConnection,
    session_id: i64,
    fields: PlaceFieldsDTO,
) -> Result<ActivePlace, AppError> {
    let current = load_current(conn, session_id).await?.ok_or_else(no_place)?;
    reject_foreign_fields(current.place_type(), &fields)?;

    let variant = match &current.variant {
        PlaceVariant::Online(v) => {
            let platform = present(&fields.platform).unwrap_or_else(|| v.platform.clone());
            let link = present(&fields.link).unwrap_or_else(|| v.link.clone());
            OnlinePlaceRepository::update(conn, v.id, &platform, &link)
                .await
                .map(PlaceVariant::Online)
        }
        PlaceVariant::GivenVenue(v) => {
            let name = present(&fields.name).unwrap_or_else(|| v.name.clone());
            let location = present(&fields.location).unwrap_or_else(|| v.location.clone());
            GivenVenuePlaceRepository::update(conn, v.id, &name, &location)
                .await
                .map(PlaceVariant::GivenVenue)
        }
        PlaceVariant::MemberHome(_) => {
            return Err(AppError::bad_request("Member home places have no editable fields")
                .with_code("ERR_SES_PLC_01"));
        }
    }
    .step("ERR_SES_PLC_09", "Failed to update session place")?;

    let umbrella = SessionPlaceRepository::touch(conn, current.umbrella.id)
        .await
        .step("ERR_SES_PLC_09", "Failed to update session place")?;

    ActivePlace::new(umbrella, variant).ok_or_else(|| {
        AppError::conflict("Session place is inconsistent").with_code("ERR_SES_PLC_03")
    })
}

async fn delete_place_tx(conn: &mut SqliteConnection, session_id: i64) -> Result<(), AppError> {
    let current = load_current(conn, session_id).await?.ok_or_else(no_place)?;
    teardown(conn, &current).await
}
