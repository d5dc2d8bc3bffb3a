//! Core domain model: identifiers, oracle records, associations, the
//! closed event sets and the error taxonomy. No I/O lives here.

pub mod association;
pub mod error;
pub mod event;
pub mod ids;
pub mod message;
pub mod oracle;
pub mod participant;
pub mod party;

pub use association::{
    Association, AssociationFilter, AssociationPage, Page, SearchKeyword, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use error::DomainError;
pub use event::{
    AssociationChange, AssociationRequest, FailureContext, FailureKind, LookupEvent,
    LookupFailure, OutboundEvent, ParticipantQuery, ParticipantQueryResponse, PartyInfo,
    PartyInfoRequested, PartyQuery, PartyQueryResponse, UNAVAILABLE,
};
pub use ids::{Currency, FspId, OracleId, PartyId, PartyType};
pub use message::{InboundMessage, MessageKind, OpaqueState, OutboundMessage};
pub use oracle::{CreateOracle, Oracle, OracleType};
pub use participant::Participant;
pub use party::{ParticipantLookup, PartyKey};
