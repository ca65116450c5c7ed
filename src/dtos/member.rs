//! Member DTOs - Data Transfer Objects per member e inviti in blocco

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    /// Optional leading `+`, then 6 to 15 digits (E.164 range).
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9]{6,15}$").expect("phone pattern is valid");
}

/// DTO per creare un nuovo member (senza id e timestamp)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct CreateMemberDTO {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub sex: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone must contain 6 to 15 digits"))]
    pub phone: String,
    #[serde(default)]
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,
}

/// One entry of a batch invite: enough profile data to create the member if unknown.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct InviteMemberDTO {
    #[validate(regex(path = *PHONE_REGEX, message = "Phone must contain 6 to 15 digits"))]
    pub phone: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,
}

impl From<InviteMemberDTO> for CreateMemberDTO {
    fn from(value: InviteMemberDTO) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            sex: value.sex,
            phone: value.phone,
            email: value.email,
        }
    }
}

/// Body of `POST /organizations/{org_id}/members/invite`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct InviteMembersDTO {
    #[validate(length(min = 1, message = "At least one member must be invited"))]
    pub members: Vec<InviteMemberDTO>,
    #[serde(default)]
    pub re_invitation: bool,
}

/// Per-entry result of a batch invite. `error` is empty on success.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InvitationOutcome {
    pub phone: String,
    pub invited: bool,
    pub error: String,
}

impl InvitationOutcome {
    pub fn invited(phone: String) -> Self {
        Self {
            phone,
            invited: true,
            error: String::new(),
        }
    }

    pub fn failed(phone: String, code: &str) -> Self {
        Self {
            phone,
            invited: false,
            error: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_pattern_accepts_international_numbers() {
        assert!(PHONE_REGEX.is_match("+237699000001"));
        assert!(PHONE_REGEX.is_match("699000001"));
        assert!(!PHONE_REGEX.is_match("+23 7699"));
        assert!(!PHONE_REGEX.is_match("12345"));
        assert!(!PHONE_REGEX.is_match(""));
    }

    #[test]
    fn invite_entry_validation() {
        let ok = InviteMemberDTO {
            phone: "+237699000001".into(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_email = InviteMemberDTO {
            phone: "+237699000001".into(),
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn batch_must_not_be_empty() {
        let body: InviteMembersDTO = serde_json::from_str(r#"{"members": []}"#).unwrap();
        assert!(!body.re_invitation);
        assert!(body.validate().is_err());
    }
}
