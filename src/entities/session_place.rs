//! SessionPlace entities - Luogo di incontro di una sessione
//!
//! The umbrella row (`session_places`) carries the discriminant; exactly one variant row
//! hangs off it. In memory the pair is an [`ActivePlace`]: the umbrella plus a closed
//! [`PlaceVariant`] whose tag always agrees with the umbrella's `place_type`.

use super::enums::PlaceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SessionPlace {
    pub id: i64,
    pub session_id: i64,
    pub place_type: PlaceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SessionPlaceOnline {
    pub id: i64,
    pub session_place_id: i64,
    pub platform: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SessionPlaceGivenVenue {
    pub id: i64,
    pub session_place_id: i64,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SessionPlaceMemberHome {
    pub id: i64,
    pub session_place_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "place_type", rename_all = "snake_case")]
pub enum PlaceVariant {
    Online(SessionPlaceOnline),
    GivenVenue(SessionPlaceGivenVenue),
    MemberHome(SessionPlaceMemberHome),
}

impl PlaceVariant {
    pub fn place_type(&self) -> PlaceType {
        match self {
            PlaceVariant::Online(_) => PlaceType::Online,
            PlaceVariant::GivenVenue(_) => PlaceType::GivenVenue,
            PlaceVariant::MemberHome(_) => PlaceType::MemberHome,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            PlaceVariant::Online(v) => v.id,
            PlaceVariant::GivenVenue(v) => v.id,
            PlaceVariant::MemberHome(v) => v.id,
        }
    }
}

/// The live place of a session: umbrella row plus its matching variant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActivePlace {
    pub umbrella: SessionPlace,
    pub variant: PlaceVariant,
}

impl ActivePlace {
    /// Pairs an umbrella with its variant; `None` if the discriminants disagree.
    pub fn new(umbrella: SessionPlace, variant: PlaceVariant) -> Option<Self> {
        if umbrella.place_type != variant.place_type() {
            return None;
        }
        Some(Self { umbrella, variant })
    }

    pub fn place_type(&self) -> PlaceType {
        self.umbrella.place_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn umbrella(place_type: PlaceType) -> SessionPlace {
        SessionPlace {
            id: 1,
            session_id: 3,
            place_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn home() -> PlaceVariant {
        PlaceVariant::MemberHome(SessionPlaceMemberHome {
            id: 9,
            session_place_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn active_place_rejects_mismatched_discriminant() {
        assert!(ActivePlace::new(umbrella(PlaceType::Online), home()).is_none());
        let place = ActivePlace::new(umbrella(PlaceType::MemberHome), home()).unwrap();
        assert_eq!(place.place_type(), PlaceType::MemberHome);
        assert_eq!(place.variant.id(), 9);
    }

    #[test]
    fn variant_serializes_with_its_tag() {
        let json = serde_json::to_value(home()).unwrap();
        assert_eq!(json["place_type"], "member_home");
        assert_eq!(json["session_place_id"], 1);
    }
}
