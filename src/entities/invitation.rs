//! Invitation entity - Token di adesione monouso

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Invitation {
    pub id: i64,
    pub link: String,
    /// Once false the invitation is spent or superseded and never comes back.
    pub active: bool,
    pub membership_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
