//! Builders for domain primitives: envelopes, payloads and oracle inputs.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::message::{InboundMessage, MessageKind, OpaqueState};
use crate::domain::oracle::{CreateOracle, OracleType};

/// A routable domain-event envelope around the given payload.
pub fn domain_event(msg_name: impl Into<String>, payload: Value) -> InboundMessage {
    InboundMessage {
        msg_id: Uuid::new_v4().to_string(),
        msg_name: msg_name.into(),
        msg_kind: MessageKind::DomainEvent,
        payload: Some(payload),
        tracing_info: None,
        opaque_state: OpaqueState::empty(),
    }
}

/// Party query payload from `requester` about one party address.
pub fn party_query(party_type: &str, party_id: &str, requester: &str) -> Value {
    json!({
        "partyId": party_id,
        "partyType": party_type,
        "requesterFspId": requester,
    })
}

/// Participant query payload from `requester` about one party address.
pub fn participant_query(party_type: &str, party_id: &str, requester: &str) -> Value {
    json!({
        "partyId": party_id,
        "partyType": party_type,
        "requesterFspId": requester,
    })
}

/// Association or disassociation request payload from `owner`.
pub fn association_request(party_type: &str, party_id: &str, owner: &str) -> Value {
    json!({
        "partyId": party_id,
        "partyType": party_type,
        "ownerFspId": owner,
    })
}

/// Party info payload announced by `owner` back through `destination`.
pub fn party_info(
    party_type: &str,
    party_id: &str,
    requester: &str,
    destination: &str,
    owner: &str,
    party_name: &str,
) -> Value {
    json!({
        "partyId": party_id,
        "partyType": party_type,
        "requesterFspId": requester,
        "destinationFspId": destination,
        "ownerFspId": owner,
        "partyName": party_name,
    })
}

/// Input registering a catch-all builtin oracle for `party_type`.
pub fn builtin_oracle(name: &str, party_type: &str) -> CreateOracle {
    CreateOracle {
        id: None,
        name: name.to_string(),
        oracle_type: OracleType::Builtin,
        party_type: party_type.into(),
        currency: None,
        endpoint: None,
    }
}

/// Input registering a currency-specific builtin oracle.
pub fn builtin_oracle_for_currency(name: &str, party_type: &str, currency: &str) -> CreateOracle {
    CreateOracle {
        currency: Some(currency.into()),
        ..builtin_oracle(name, party_type)
    }
}

/// Input registering a remote oracle delegating to `endpoint`.
pub fn remote_oracle(name: &str, party_type: &str, endpoint: &str) -> CreateOracle {
    CreateOracle {
        id: None,
        name: name.to_string(),
        oracle_type: OracleType::RemoteHttp,
        party_type: party_type.into(),
        currency: None,
        endpoint: Some(endpoint.to_string()),
    }
}
