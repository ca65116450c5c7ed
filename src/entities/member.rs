//! Member entity - Persona fisica nota al sistema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// "First Last", trimmed; `None` when the member never gave a name.
    pub fn display_name(&self) -> Option<String> {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            None
        } else {
            Some(full.to_string())
        }
    }

    /// Same person, matched on phone or (non-empty) email.
    pub fn same_identity(&self, other: &Member) -> bool {
        self.phone == other.phone || (!self.email.is_empty() && self.email == other.email)
    }
}
