//! The closed sets of inbound and outbound lookup events.
//!
//! Inbound envelopes decode into [`LookupEvent`]; every handling path ends
//! in exactly one [`OutboundEvent`]. Business failures become
//! [`LookupFailure`] payloads carrying a [`FailureKind`] discriminant, so
//! downstream consumers can match on the kind instead of parsing
//! descriptions.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::ids::{Currency, FspId, PartyId, PartyType};
use crate::domain::message::{InboundMessage, MessageKind};

/// Placeholder echoed in error events when the inbound payload never
/// carried the field.
pub const UNAVAILABLE: &str = "unavailable";

/// Request to discover which FSP serves a party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyQuery {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
    /// When the requester already knows the owner, resolution is skipped.
    #[serde(default)]
    pub destination_fsp_id: Option<FspId>,
}

/// Party attributes announced by the owning FSP in response to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
    pub destination_fsp_id: FspId,
    pub owner_fsp_id: FspId,
    pub party_name: String,
    #[serde(default)]
    pub party_date_of_birth: Option<NaiveDate>,
}

/// Request for the bare owner FSP id of a party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
}

/// Request to claim or release ownership of a party address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationRequest {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub owner_fsp_id: FspId,
}

/// Every inbound event the aggregate routes. Anything else on the wire is
/// rejected during decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupEvent {
    PartyQueryReceived(PartyQuery),
    PartyInfoAvailable(PartyInfo),
    ParticipantQueryReceived(ParticipantQuery),
    AssociationRequestReceived(AssociationRequest),
    DisassociationRequestReceived(AssociationRequest),
}

impl LookupEvent {
    pub const PARTY_QUERY_RECEIVED: &'static str = "PartyQueryReceived";
    pub const PARTY_INFO_AVAILABLE: &'static str = "PartyInfoAvailable";
    pub const PARTICIPANT_QUERY_RECEIVED: &'static str = "ParticipantQueryReceived";
    pub const ASSOCIATION_REQUEST_RECEIVED: &'static str = "ParticipantAssociationRequestReceived";
    pub const DISASSOCIATION_REQUEST_RECEIVED: &'static str =
        "ParticipantDisassociateRequestReceived";

    /// Decode an inbound envelope into a routable event.
    ///
    /// Checks run in a fixed order: missing payload, then envelope kind,
    /// then message name, then payload shape. A message that is wrong in
    /// several ways reports the first failure only.
    pub fn decode(message: &InboundMessage) -> Result<Self, DomainError> {
        let payload = message
            .payload
            .as_ref()
            .ok_or_else(|| DomainError::InvalidMessagePayload {
                reason: "message carried no payload".to_string(),
            })?;
        if message.msg_kind != MessageKind::DomainEvent {
            return Err(DomainError::InvalidMessageType {
                msg_name: message.msg_name.clone(),
            });
        }
        match message.msg_name.as_str() {
            Self::PARTY_QUERY_RECEIVED => Ok(Self::PartyQueryReceived(decode_payload(payload)?)),
            Self::PARTY_INFO_AVAILABLE => Ok(Self::PartyInfoAvailable(decode_payload(payload)?)),
            Self::PARTICIPANT_QUERY_RECEIVED => {
                Ok(Self::ParticipantQueryReceived(decode_payload(payload)?))
            }
            Self::ASSOCIATION_REQUEST_RECEIVED => {
                Ok(Self::AssociationRequestReceived(decode_payload(payload)?))
            }
            Self::DISASSOCIATION_REQUEST_RECEIVED => {
                Ok(Self::DisassociationRequestReceived(decode_payload(payload)?))
            }
            other => Err(DomainError::InvalidMessageType {
                msg_name: other.to_string(),
            }),
        }
    }

    pub fn msg_name(&self) -> &'static str {
        match self {
            LookupEvent::PartyQueryReceived(_) => Self::PARTY_QUERY_RECEIVED,
            LookupEvent::PartyInfoAvailable(_) => Self::PARTY_INFO_AVAILABLE,
            LookupEvent::ParticipantQueryReceived(_) => Self::PARTICIPANT_QUERY_RECEIVED,
            LookupEvent::AssociationRequestReceived(_) => Self::ASSOCIATION_REQUEST_RECEIVED,
            LookupEvent::DisassociationRequestReceived(_) => Self::DISASSOCIATION_REQUEST_RECEIVED,
        }
    }
}

fn decode_payload<T: DeserializeOwned>(payload: &Value) -> Result<T, DomainError> {
    serde_json::from_value(payload.clone()).map_err(|e| DomainError::InvalidMessagePayload {
        reason: e.to_string(),
    })
}

/// Instruction to fetch party details from the resolved owner FSP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfoRequested {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
    pub destination_fsp_id: FspId,
}

/// Party details relayed back to the original requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyQueryResponse {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
    pub destination_fsp_id: FspId,
    pub owner_fsp_id: FspId,
    pub party_name: String,
    #[serde(default)]
    pub party_date_of_birth: Option<NaiveDate>,
}

/// Owner FSP id answered to a participant query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQueryResponse {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub requester_fsp_id: FspId,
    pub owner_fsp_id: FspId,
}

/// Confirmation that an association was created or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationChange {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub owner_fsp_id: FspId,
}

/// Discriminant for every error event this service emits. Consumers match
/// on this instead of parsing descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "InvalidMessagePayloadError")]
    InvalidMessagePayload,
    #[serde(rename = "InvalidMessageTypeError")]
    InvalidMessageType,
    #[serde(rename = "NoSuchOracleError")]
    NoSuchOracle,
    #[serde(rename = "NoSuchOracleProviderError")]
    NoSuchOracleProvider,
    #[serde(rename = "NoSuchParticipantError")]
    NoSuchParticipant,
    #[serde(rename = "ParticipantNotFoundError")]
    ParticipantNotFound,
    #[serde(rename = "ParticipantIdMismatchError")]
    ParticipantIdMismatch,
    #[serde(rename = "ParticipantNotActiveError")]
    ParticipantNotActive,
    #[serde(rename = "UnableToAssociateParticipantError")]
    UnableToAssociate,
    #[serde(rename = "UnableToDisassociateParticipantError")]
    UnableToDisassociate,
    #[serde(rename = "OracleLookupFailedError")]
    OracleLookupFailed,
    #[serde(rename = "FspIdLookupFailedError")]
    FspIdLookupFailed,
    #[serde(rename = "LookupUnknownError")]
    Unknown,
}

impl FailureKind {
    pub const ALL: [FailureKind; 13] = [
        FailureKind::InvalidMessagePayload,
        FailureKind::InvalidMessageType,
        FailureKind::NoSuchOracle,
        FailureKind::NoSuchOracleProvider,
        FailureKind::NoSuchParticipant,
        FailureKind::ParticipantNotFound,
        FailureKind::ParticipantIdMismatch,
        FailureKind::ParticipantNotActive,
        FailureKind::UnableToAssociate,
        FailureKind::UnableToDisassociate,
        FailureKind::OracleLookupFailed,
        FailureKind::FspIdLookupFailed,
        FailureKind::Unknown,
    ];

    /// Wire name of the error event carrying this kind.
    pub fn msg_name(self) -> &'static str {
        match self {
            FailureKind::InvalidMessagePayload => "InvalidMessagePayloadError",
            FailureKind::InvalidMessageType => "InvalidMessageTypeError",
            FailureKind::NoSuchOracle => "NoSuchOracleError",
            FailureKind::NoSuchOracleProvider => "NoSuchOracleProviderError",
            FailureKind::NoSuchParticipant => "NoSuchParticipantError",
            FailureKind::ParticipantNotFound => "ParticipantNotFoundError",
            FailureKind::ParticipantIdMismatch => "ParticipantIdMismatchError",
            FailureKind::ParticipantNotActive => "ParticipantNotActiveError",
            FailureKind::UnableToAssociate => "UnableToAssociateParticipantError",
            FailureKind::UnableToDisassociate => "UnableToDisassociateParticipantError",
            FailureKind::OracleLookupFailed => "OracleLookupFailedError",
            FailureKind::FspIdLookupFailed => "FspIdLookupFailedError",
            FailureKind::Unknown => "LookupUnknownError",
        }
    }
}

/// Error event payload. Correlating fields echo the inbound payload, with
/// [`UNAVAILABLE`] standing in where the input never carried them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupFailure {
    pub kind: FailureKind,
    pub party_id: String,
    pub party_type: String,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub fsp_id: Option<String>,
    pub description: String,
}

/// Every outbound event the aggregate can publish.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    PartyInfoRequested(PartyInfoRequested),
    PartyQueryResponse(PartyQueryResponse),
    ParticipantQueryResponse(ParticipantQueryResponse),
    ParticipantAssociationCreated(AssociationChange),
    ParticipantAssociationRemoved(AssociationChange),
    LookupFailed(LookupFailure),
}

impl OutboundEvent {
    /// Wire name of this event. Error events take their name from the
    /// failure kind, one name per kind.
    pub fn msg_name(&self) -> &'static str {
        match self {
            OutboundEvent::PartyInfoRequested(_) => "PartyInfoRequested",
            OutboundEvent::PartyQueryResponse(_) => "PartyQueryResponse",
            OutboundEvent::ParticipantQueryResponse(_) => "ParticipantQueryResponse",
            OutboundEvent::ParticipantAssociationCreated(_) => "ParticipantAssociationCreated",
            OutboundEvent::ParticipantAssociationRemoved(_) => "ParticipantAssociationRemoved",
            OutboundEvent::LookupFailed(failure) => failure.kind.msg_name(),
        }
    }

    pub fn as_failure(&self) -> Option<&LookupFailure> {
        match self {
            OutboundEvent::LookupFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Correlating fields salvaged from an inbound message, used to address
/// error events back at the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureContext {
    party_id: String,
    party_type: String,
    party_sub_type: Option<String>,
    fsp_id: Option<String>,
}

impl FailureContext {
    /// Best-effort extraction from a raw envelope, for messages that never
    /// decoded into an event. Absent fields fall back to [`UNAVAILABLE`].
    pub fn from_message(message: &InboundMessage) -> Self {
        let field = |name: &str| {
            message
                .payload
                .as_ref()
                .and_then(|p| p.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            party_id: field("partyId").unwrap_or_else(|| UNAVAILABLE.to_string()),
            party_type: field("partyType").unwrap_or_else(|| UNAVAILABLE.to_string()),
            party_sub_type: field("partySubType"),
            fsp_id: field("requesterFspId").or_else(|| field("ownerFspId")),
        }
    }

    /// Exact extraction from a decoded event.
    pub fn from_event(event: &LookupEvent) -> Self {
        match event {
            LookupEvent::PartyQueryReceived(q) => Self {
                party_id: q.party_id.to_string(),
                party_type: q.party_type.to_string(),
                party_sub_type: q.party_sub_type.clone(),
                fsp_id: Some(q.requester_fsp_id.to_string()),
            },
            LookupEvent::PartyInfoAvailable(info) => Self {
                party_id: info.party_id.to_string(),
                party_type: info.party_type.to_string(),
                party_sub_type: info.party_sub_type.clone(),
                fsp_id: Some(info.requester_fsp_id.to_string()),
            },
            LookupEvent::ParticipantQueryReceived(q) => Self {
                party_id: q.party_id.to_string(),
                party_type: q.party_type.to_string(),
                party_sub_type: q.party_sub_type.clone(),
                fsp_id: Some(q.requester_fsp_id.to_string()),
            },
            LookupEvent::AssociationRequestReceived(r)
            | LookupEvent::DisassociationRequestReceived(r) => Self {
                party_id: r.party_id.to_string(),
                party_type: r.party_type.to_string(),
                party_sub_type: r.party_sub_type.clone(),
                fsp_id: Some(r.owner_fsp_id.to_string()),
            },
        }
    }

    /// Build the error event for this context.
    pub fn failure(self, kind: FailureKind, description: impl Into<String>) -> LookupFailure {
        LookupFailure {
            kind,
            party_id: self.party_id,
            party_type: self.party_type,
            party_sub_type: self.party_sub_type,
            fsp_id: self.fsp_id,
            description: description.into(),
        }
    }
}
