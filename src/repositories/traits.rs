//! Common repository traits
//!
//! Generic interfaces for single-table database operations. Every method takes the
//! connection it runs on, so the same accessor works on a pooled connection or on the
//! connection bound to an open transaction.

use sqlx::SqliteConnection;

/// Trait for creating new entities in the database
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned by the database)
/// * `CreateDTO` - DTO for creation (without ID, will be automatically generated)
pub trait Create<Entity, CreateDTO> {
    /// Creates a new entity in the database
    ///
    /// # Returns
    /// * `Ok(Entity)` - Created entity with ID assigned by the database
    /// * `Err(sqlx::Error)` - Error during insertion
    async fn create(conn: &mut SqliteConnection, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Trait for reading a single entity by primary key
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    /// * `Err(sqlx::Error)` - Error during reading
    async fn read(conn: &mut SqliteConnection, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Trait for deleting entities
pub trait Delete<Id> {
    /// Deletes an entity; deleting a missing row is not an error.
    async fn delete(conn: &mut SqliteConnection, id: &Id) -> Result<(), sqlx::Error>;
}
