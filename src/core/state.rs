//! Application State - Stato globale dell'applicazione
//!
//! Holds the managers the handlers call into. Nothing here is mutable: all shared state
//! lives in the database behind the gateway.

use crate::core::Config;
use crate::domain::{
    InvitationDispatcher, MembershipManager, SessionManager, SessionPlaceManager, TokenGenerator,
};
use crate::notifications::NotificationSender;
use crate::repositories::Gateway;
use std::sync::Arc;

/// Stato condiviso tra tutte le route e middleware
pub struct AppState {
    pub gateway: Gateway,

    /// Organizzazioni, membership e inviti
    pub memberships: MembershipManager,

    pub sessions: SessionManager,

    pub places: SessionPlaceManager,

    /// Inviti in blocco
    pub dispatcher: InvitationDispatcher,

    /// Secret key per JWT token
    pub jwt_secret: String,
}

impl AppState {
    /// Wires every manager on top of one gateway and one notification sender.
    pub fn new(gateway: Gateway, sender: Arc<dyn NotificationSender>, config: &Config) -> Self {
        let memberships = MembershipManager::new(gateway.clone(), config.invitation_expiry());
        let dispatcher = InvitationDispatcher::new(
            memberships.clone(),
            TokenGenerator::new(config.invitation_token_secret.clone()),
            sender,
            config.notification_timeout(),
            config.invite_concurrency,
        );

        Self {
            sessions: SessionManager::new(gateway.clone()),
            places: SessionPlaceManager::new(gateway.clone()),
            memberships,
            dispatcher,
            jwt_secret: config.jwt_secret.clone(),
            gateway,
        }
    }
}
