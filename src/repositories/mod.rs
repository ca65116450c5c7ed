//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Ogni repository gestisce le operazioni di database per una specifica entità. The
//! accessors are stateless: they run on whatever connection they are handed, which is
//! either a pooled one from [`Gateway::acquire`] or the one bound to a transaction by
//! [`Gateway::run_in_transaction`].

// ************************* NOTA SU SQLX ************************* //

/*
   Queries use the runtime `sqlx::query_as::<_, T>` form with `#[derive(sqlx::FromRow)]`
   entities instead of the `query!` macros: the macros need a live database at compile
   time, while migrations here are embedded and applied at start-up (and on the
   in-memory databases the tests open).
   Number of Rows   Method
   None             .execute(conn)          INSERT/UPDATE/DELETE without RETURNING
   Zero or One      .fetch_optional(conn)
   Exactly One      .fetch_one(conn)        RowNotFound if nothing came back
   Multiple         .fetch_all(conn)
*/

pub mod gateway;
pub mod invitation;
pub mod member;
pub mod membership;
pub mod organization;
pub mod session;
pub mod session_member;
pub mod session_place;
pub mod traits;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read};

pub use gateway::Gateway;
pub use invitation::InvitationRepository;
pub use member::MemberRepository;
pub use membership::MembershipRepository;
pub use organization::OrganizationRepository;
pub use session::SessionRepository;
pub use session_member::{NewSessionMember, SessionMemberRepository};
pub use session_place::{
    GivenVenuePlaceRepository, MemberHomePlaceRepository, NewGivenVenuePlace, NewOnlinePlace,
    NewSessionPlace, OnlinePlaceRepository, SessionPlaceRepository,
};
