//! Session DTOs - Data Transfer Objects per sessioni e luoghi

use crate::entities::PlaceType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// DTO per creare una nuova sessione
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_session_dates"))]
pub struct CreateSessionDTO {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn validate_session_dates(dto: &CreateSessionDTO) -> Result<(), ValidationError> {
    if dto.end_date < dto.start_date {
        return Err(ValidationError::new("end_before_start")
            .with_message("end_date must not precede start_date".into()));
    }
    Ok(())
}

/// Parametri interni per inserire una sessione
#[derive(Debug, Clone)]
pub struct NewSessionDTO {
    pub organization_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Raw fields a client may send for a place; which ones are required depends on the type.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PlaceFieldsDTO {
    pub platform: Option<String>,
    pub link: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
}

/// Body of `PUT .../sessions/{session_id}/place`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangePlaceDTO {
    pub place_type: PlaceType,
    #[serde(flatten)]
    pub fields: PlaceFieldsDTO,
}

/// Body of `PATCH .../sessions/{session_id}/members`: the full new member list.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateSessionMembersDTO {
    #[serde(default)]
    pub membership_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_dates_must_be_ordered() {
        let ok = CreateSessionDTO {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };
        assert!(ok.validate().is_ok());

        let reversed = CreateSessionDTO {
            start_date: ok.end_date,
            end_date: ok.start_date,
        };
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn change_place_body_flattens_fields() {
        let body: ChangePlaceDTO = serde_json::from_str(
            r#"{"place_type": "online", "platform": "zoom", "link": "https://x"}"#,
        )
        .unwrap();
        assert_eq!(body.place_type, PlaceType::Online);
        assert_eq!(body.fields.platform.as_deref(), Some("zoom"));
        assert_eq!(body.fields.name, None);
    }
}
