//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    CallerIdentity, Claims, authentication_middleware, decode_jwt, encode_jwt,
    optional_authentication_middleware, organization_membership_middleware, require_role,
};
pub use config::Config;
pub use error::{AppError, ErrorKind, StepContext};
pub use state::AppState;
