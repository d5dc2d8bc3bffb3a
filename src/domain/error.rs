//! Domain error taxonomy.
//!
//! Every business failure the core can produce is named here. Event
//! handling maps each variant onto a [`FailureKind`] for the outbound
//! error event; admin callers get the variants directly.

use thiserror::Error;

use crate::domain::event::FailureKind;
use crate::domain::ids::{Currency, FspId, OracleId, PartyId, PartyType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("invalid message payload: {reason}")]
    InvalidMessagePayload { reason: String },

    #[error("message '{msg_name}' is not a routable lookup event")]
    InvalidMessageType { msg_name: String },

    #[error("no oracle registered for party type '{party_type}'")]
    NoSuchOracle {
        party_type: PartyType,
        currency: Option<Currency>,
    },

    #[error("no live provider for oracle '{oracle_id}'")]
    NoSuchOracleProvider { oracle_id: OracleId },

    #[error("no participant associated with party '{party_id}'")]
    NoSuchParticipant { party_id: PartyId },

    #[error("participant '{fsp_id}' not found in the directory")]
    ParticipantNotFound { fsp_id: FspId },

    #[error("directory returned participant '{returned}' for '{requested}'")]
    ParticipantIdMismatch { requested: FspId, returned: FspId },

    #[error("participant '{fsp_id}' is not active")]
    ParticipantNotActive { fsp_id: FspId },

    #[error("association already exists for party '{party_id}'")]
    AssociationExists { party_id: PartyId },

    #[error("no association found for party '{party_id}'")]
    AssociationNotFound { party_id: PartyId },

    #[error("oracle lookup failed: {reason}")]
    OracleLookupFailed { reason: String },

    #[error("fsp id lookup failed: {reason}")]
    FspIdLookupFailed { reason: String },

    #[error("oracle already registered: {reason}")]
    DuplicateOracle { reason: String },

    #[error("oracle '{oracle_id}' not found")]
    OracleNotFound { oracle_id: OracleId },

    #[error("unsupported oracle type '{raw}'")]
    UnsupportedOracleType { raw: String },

    #[error("invalid oracle definition: {reason}")]
    InvalidOracle { reason: String },

    #[error("operation '{operation}' is not supported by this oracle type")]
    UnsupportedOperation { operation: &'static str },
}

impl DomainError {
    /// Discriminant of the error event this failure surfaces as.
    ///
    /// Admin-only variants have no dedicated event; should one ever reach
    /// event handling it degrades to the generic unknown kind.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            DomainError::InvalidMessagePayload { .. } => FailureKind::InvalidMessagePayload,
            DomainError::InvalidMessageType { .. } => FailureKind::InvalidMessageType,
            DomainError::NoSuchOracle { .. } => FailureKind::NoSuchOracle,
            DomainError::NoSuchOracleProvider { .. } => FailureKind::NoSuchOracleProvider,
            DomainError::NoSuchParticipant { .. } => FailureKind::NoSuchParticipant,
            DomainError::ParticipantNotFound { .. } => FailureKind::ParticipantNotFound,
            DomainError::ParticipantIdMismatch { .. } => FailureKind::ParticipantIdMismatch,
            DomainError::ParticipantNotActive { .. } => FailureKind::ParticipantNotActive,
            DomainError::AssociationExists { .. } => FailureKind::UnableToAssociate,
            DomainError::AssociationNotFound { .. } => FailureKind::UnableToDisassociate,
            DomainError::OracleLookupFailed { .. } => FailureKind::OracleLookupFailed,
            DomainError::FspIdLookupFailed { .. } => FailureKind::FspIdLookupFailed,
            DomainError::DuplicateOracle { .. }
            | DomainError::OracleNotFound { .. }
            | DomainError::UnsupportedOracleType { .. }
            | DomainError::InvalidOracle { .. }
            | DomainError::UnsupportedOperation { .. } => FailureKind::Unknown,
        }
    }
}
