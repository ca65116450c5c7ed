//! Domain module - Logica transazionale e concorrente del dominio
//!
//! - `membership`: organizzazioni, membership e ciclo di vita degli inviti
//! - `dispatcher`: invio degli inviti in blocco
//! - `session`: sessioni (una sola in corso per organizzazione)
//! - `session_place`: luogo di una sessione (umbrella + variante)
//! - `token`: generazione dei token di invito

pub mod dispatcher;
pub mod membership;
pub mod session;
pub mod session_place;
pub mod token;

pub use dispatcher::InvitationDispatcher;
pub use membership::MembershipManager;
pub use session::SessionManager;
pub use session_place::{NewPlace, SessionPlaceManager};
pub use token::TokenGenerator;
