//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod invitation;
pub mod member;
pub mod organization;
pub mod session;

pub use invitation::{CreateInvitationDTO, InvitationDetailsDTO, IssuedInvitationDTO};
pub use member::{CreateMemberDTO, InvitationOutcome, InviteMemberDTO, InviteMembersDTO};
pub use organization::{
    CreateMembershipDTO, CreateOrganizationDTO, NewOrganizationDTO, OrganizationDTO,
    OrganizationMemberDTO,
};
pub use session::{
    ChangePlaceDTO, CreateSessionDTO, NewSessionDTO, PlaceFieldsDTO, UpdateSessionMembersDTO,
};
