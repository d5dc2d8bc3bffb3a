//! Transport-agnostic message envelopes.
//!
//! The aggregate consumes [`InboundMessage`] envelopes handed over by
//! whatever transport the host wires up and answers with exactly one
//! [`OutboundMessage`] per input. Opaque state rides along untouched in
//! both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::event::OutboundEvent;

/// Coarse message classification carried on the envelope. Only
/// `DomainEvent` messages are routable; the aggregate rejects the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Command,
    DomainEvent,
    StateSnapshot,
}

/// Transport bookkeeping blob the core never interprets.
///
/// Whatever arrives here is copied verbatim onto the corresponding
/// outbound envelope, success or failure alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueState(pub Option<Value>);

impl OpaqueState {
    pub fn empty() -> Self {
        Self(None)
    }
}

impl From<Value> for OpaqueState {
    fn from(value: Value) -> Self {
        Self(Some(value))
    }
}

/// Envelope handed to the aggregate by the inbound transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub msg_id: String,
    pub msg_name: String,
    pub msg_kind: MessageKind,
    /// Raw event payload; decoded against the closed event set during
    /// routing. Absent payloads are rejected before anything else.
    pub payload: Option<Value>,
    #[serde(default)]
    pub tracing_info: Option<Value>,
    #[serde(default)]
    pub opaque_state: OpaqueState,
}

/// Envelope the aggregate publishes: one per consumed inbound message.
/// Transports map the typed event onto their own wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub msg_id: String,
    pub event: OutboundEvent,
    pub tracing_info: Option<Value>,
    pub opaque_state: OpaqueState,
}

impl OutboundMessage {
    /// Wire name of the carried event.
    pub fn msg_name(&self) -> &'static str {
        self.event.msg_name()
    }
}
