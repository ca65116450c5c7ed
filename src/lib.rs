//! Server library - espone i moduli principali per i test

pub mod core;
pub mod domain;
pub mod dtos;
pub mod entities;
pub mod notifications;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, Config, auth, config};
pub use services::root;

use axum::{Router, middleware, routing::{get, post}};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/organizations", configure_organization_routes(state.clone()))
        .nest("/invitations", configure_invitation_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Configura le routes per organizzazioni, membri e sessioni
fn configure_organization_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, organization_membership_middleware};
    use services::*;

    // Rotte che NON richiedono membership (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_my_organizations).post(create_organization))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono membership (autenticazione + membership middleware)
    let member_routes = Router::new()
        .route("/{org_id}", get(get_organization))
        .route("/{org_id}/members", get(list_organization_members))
        .route("/{org_id}/members/invite", post(invite_members))
        .route("/{org_id}/sessions", post(create_session))
        .route("/{org_id}/sessions/current", get(get_current_session))
        .route(
            "/{org_id}/sessions/{session_id}/place",
            get(get_session_place)
                .put(replace_session_place)
                .patch(update_session_place)
                .delete(delete_session_place),
        )
        .route(
            "/{org_id}/sessions/{session_id}/members",
            get(get_session_members).patch(update_session_members),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            organization_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

/// Configura le routes per gli inviti: l'identità del chiamante è facoltativa
fn configure_invitation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::optional_authentication_middleware;
    use services::*;

    Router::new()
        .route("/{link}", get(get_invitation))
        .route("/{link}/approve", post(approve_invitation))
        .layer(middleware::from_fn_with_state(
            state,
            optional_authentication_middleware,
        ))
}
