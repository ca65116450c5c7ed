//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod enums;
pub mod invitation;
pub mod member;
pub mod membership;
pub mod organization;
pub mod session;
pub mod session_place;

// Re-exports per facilitare l'import
pub use enums::{MembershipRole, MembershipStatus, PlaceType};
pub use invitation::Invitation;
pub use member::Member;
pub use membership::Membership;
pub use organization::Organization;
pub use session::{Session, SessionMember};
pub use session_place::{
    ActivePlace, PlaceVariant, SessionPlace, SessionPlaceGivenVenue, SessionPlaceMemberHome,
    SessionPlaceOnline,
};
