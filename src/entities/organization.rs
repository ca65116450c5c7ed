//! Organization entity - Entità organizzazione

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_by: i64, // member che ha fondato l'organizzazione
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
