//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Handler sottili: decodificano la richiesta, chiamano il dominio e codificano la risposta.

pub mod invitation;
pub mod organization;
pub mod session;

// Re-exports per facilitare l'import
pub use invitation::{approve_invitation, get_invitation};
pub use organization::{
    create_organization, get_organization, invite_members, list_my_organizations,
    list_organization_members,
};
pub use session::{
    create_session, delete_session_place, get_current_session, get_session_members,
    get_session_place, replace_session_place, update_session_members, update_session_place,
};

use crate::core::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
