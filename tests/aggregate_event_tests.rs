//! Event-driven flows through the lookup aggregate: one typed outbound
//! event per inbound message, success or failure, with correlating
//! fields and opaque state preserved.

use std::sync::Arc;

use serde_json::json;

use switchboard::app::LookupAggregate;
use switchboard::domain::event::{FailureKind, LookupEvent, OutboundEvent, UNAVAILABLE};
use switchboard::domain::message::{InboundMessage, MessageKind, OpaqueState};
use switchboard::domain::party::PartyKey;
use switchboard::error::Error;
use switchboard::testkit::collaborator::{RecordingPublisher, StaticParticipantDirectory};
use switchboard::testkit::domain::{
    association_request, builtin_oracle, domain_event, participant_query, party_info, party_query,
};
use switchboard::testkit::oracle::{InMemoryOracleRegistry, InMemoryProviderFactory};

struct Harness {
    aggregate: LookupAggregate,
    registry: InMemoryOracleRegistry,
    directory: StaticParticipantDirectory,
    publisher: RecordingPublisher,
    factory: InMemoryProviderFactory,
}

async fn harness(directory: StaticParticipantDirectory) -> Harness {
    let registry = InMemoryOracleRegistry::new();
    let publisher = RecordingPublisher::new();
    let factory = InMemoryProviderFactory::new();
    let aggregate = LookupAggregate::new(
        Box::new(registry.clone()),
        Arc::new(directory.clone()),
        Arc::new(publisher.clone()),
        Box::new(factory.clone()),
    );
    aggregate.init().await.unwrap();
    Harness {
        aggregate,
        registry,
        directory,
        publisher,
        factory,
    }
}

/// Register a builtin "bank" oracle and seed party1 -> fsp1 in its
/// provider.
async fn with_bank_oracle(h: &Harness) {
    let oracle = h
        .aggregate
        .add_oracle(builtin_oracle("bank oracle", "bank"))
        .await
        .unwrap();
    h.factory
        .provider_for(&oracle.id)
        .unwrap()
        .seed("fsp1", PartyKey::new("bank", "party1"));
}

#[tokio::test]
async fn party_query_resolves_owner_and_requests_party_info() {
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp1");
    let h = harness(directory).await;
    with_bank_oracle(&h).await;

    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.msg_name(), "PartyInfoRequested");
    match sent.event {
        OutboundEvent::PartyInfoRequested(request) => {
            assert_eq!(request.party_id.as_str(), "party1");
            assert_eq!(request.party_type.as_str(), "bank");
            assert_eq!(request.requester_fsp_id.as_str(), "participant1");
            assert_eq!(request.destination_fsp_id.as_str(), "fsp1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn party_query_with_known_destination_skips_resolution() {
    // No oracle registered at all: resolution would fail, so a success
    // proves the supplied destination short-circuited it.
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp9");
    let h = harness(directory).await;

    let mut payload = party_query("bank", "party1", "participant1");
    payload["destinationFspId"] = json!("fsp9");
    let msg = domain_event(LookupEvent::PARTY_QUERY_RECEIVED, payload);
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    match sent.event {
        OutboundEvent::PartyInfoRequested(request) => {
            assert_eq!(request.destination_fsp_id.as_str(), "fsp9");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn party_query_without_oracle_reports_no_such_oracle() {
    let directory = StaticParticipantDirectory::new().with_active("participant1");
    let h = harness(directory).await;

    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.msg_name(), "NoSuchOracleError");
    let failure = sent.event.as_failure().unwrap();
    assert_eq!(failure.kind, FailureKind::NoSuchOracle);
    assert_eq!(failure.party_id, "party1");
    assert_eq!(failure.party_type, "bank");
    assert_eq!(failure.fsp_id.as_deref(), Some("participant1"));
}

#[tokio::test]
async fn party_query_for_unassociated_party_reports_no_such_participant() {
    let directory = StaticParticipantDirectory::new().with_active("participant1");
    let h = harness(directory).await;
    h.aggregate
        .add_oracle(builtin_oracle("bank oracle", "bank"))
        .await
        .unwrap();

    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party-unknown", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();

    let failure = h.publisher.last().unwrap();
    assert_eq!(failure.msg_name(), "NoSuchParticipantError");
    assert_eq!(
        failure.event.as_failure().unwrap().party_id,
        "party-unknown"
    );
}

#[tokio::test]
async fn opaque_state_and_tracing_ride_through_verbatim() {
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp1");
    let h = harness(directory).await;
    with_bank_oracle(&h).await;

    let state = OpaqueState::from(json!({"partition": 7, "offset": 4242}));
    let tracing = json!({"traceId": "abc-123"});

    // Success path.
    let mut msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    msg.opaque_state = state.clone();
    msg.tracing_info = Some(tracing.clone());
    h.aggregate.handle_event(&msg).await.unwrap();
    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.opaque_state, state);
    assert_eq!(sent.tracing_info, Some(tracing.clone()));

    // Failure path: same guarantees.
    let mut msg = domain_event("NotALookupEvent", json!({}));
    msg.opaque_state = state.clone();
    msg.tracing_info = Some(tracing.clone());
    h.aggregate.handle_event(&msg).await.unwrap();
    let sent = h.publisher.last().unwrap();
    assert!(sent.event.as_failure().is_some());
    assert_eq!(sent.opaque_state, state);
    assert_eq!(sent.tracing_info, Some(tracing));
}

#[tokio::test]
async fn invalid_envelopes_produce_validation_error_events() {
    let h = harness(StaticParticipantDirectory::new()).await;

    // Missing payload wins over the wrong envelope kind.
    let msg = InboundMessage {
        msg_id: "m1".to_string(),
        msg_name: LookupEvent::PARTY_QUERY_RECEIVED.to_string(),
        msg_kind: MessageKind::Command,
        payload: None,
        tracing_info: None,
        opaque_state: OpaqueState::empty(),
    };
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "InvalidMessagePayloadError"
    );

    // Wrong envelope kind with a payload present.
    let msg = InboundMessage {
        msg_kind: MessageKind::Command,
        ..domain_event(
            LookupEvent::PARTY_QUERY_RECEIVED,
            party_query("bank", "party1", "participant1"),
        )
    };
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "InvalidMessageTypeError"
    );

    // Unknown message name.
    let msg = domain_event("TransferPrepared", json!({}));
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "InvalidMessageTypeError"
    );

    // Known name, malformed payload.
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        json!({"partyType": "bank"}),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "InvalidMessagePayloadError"
    );

    assert_eq!(h.publisher.len(), 4);
}

#[tokio::test]
async fn unroutable_message_echoes_sentinel_fields() {
    let h = harness(StaticParticipantDirectory::new()).await;

    let msg = domain_event("Garbage", json!({"somethingElse": true}));
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    let failure = sent.event.as_failure().unwrap();
    assert_eq!(failure.party_id, UNAVAILABLE);
    assert_eq!(failure.party_type, UNAVAILABLE);
    assert_eq!(failure.fsp_id, None);
}

#[tokio::test]
async fn requester_validation_failures_map_to_participant_errors() {
    let directory = StaticParticipantDirectory::new().with_inactive("sleepy");
    let h = harness(directory).await;
    with_bank_oracle(&h).await;

    // Inactive requester.
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "sleepy"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "ParticipantNotActiveError"
    );

    // Unknown requester.
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "nobody"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "ParticipantNotFoundError"
    );

    // Directory infrastructure failure degrades to the unknown kind.
    h.directory.set_failing(true);
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "sleepy"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(h.publisher.last().unwrap().msg_name(), "LookupUnknownError");
}

#[tokio::test]
async fn directory_answering_with_wrong_id_is_a_mismatch() {
    use switchboard::domain::participant::Participant;

    let directory = StaticParticipantDirectory::new()
        .with_entry("participant1", Participant::new("somebody-else", "DFSP", true));
    let h = harness(directory).await;

    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "ParticipantIdMismatchError"
    );
}

#[tokio::test]
async fn party_info_is_relayed_as_party_query_response() {
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp1");
    let h = harness(directory).await;

    let msg = domain_event(
        LookupEvent::PARTY_INFO_AVAILABLE,
        party_info("bank", "party1", "participant1", "fsp1", "fsp1", "Jane Doe"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.msg_name(), "PartyQueryResponse");
    match sent.event {
        OutboundEvent::PartyQueryResponse(response) => {
            assert_eq!(response.party_name, "Jane Doe");
            assert_eq!(response.owner_fsp_id.as_str(), "fsp1");
            assert_eq!(response.requester_fsp_id.as_str(), "participant1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn participant_query_answers_owner_fsp_id() {
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp1");
    let h = harness(directory).await;
    with_bank_oracle(&h).await;

    let msg = domain_event(
        LookupEvent::PARTICIPANT_QUERY_RECEIVED,
        participant_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.msg_name(), "ParticipantQueryResponse");
    match sent.event {
        OutboundEvent::ParticipantQueryResponse(response) => {
            assert_eq!(response.owner_fsp_id.as_str(), "fsp1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn resolved_owner_is_validated_too() {
    // party1 resolves to fsp1, but fsp1 is inactive.
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_inactive("fsp1");
    let h = harness(directory).await;
    with_bank_oracle(&h).await;

    let msg = domain_event(
        LookupEvent::PARTICIPANT_QUERY_RECEIVED,
        participant_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "ParticipantNotActiveError"
    );
}

#[tokio::test]
async fn associate_round_trip_with_refinements() {
    let directory = StaticParticipantDirectory::new().with_active("fsp2");
    let h = harness(directory).await;
    let oracle = h
        .aggregate
        .add_oracle(builtin_oracle("msisdn oracle", "MSISDN"))
        .await
        .unwrap();

    let mut payload = association_request("MSISDN", "party7", "fsp2");
    payload["partySubType"] = json!("PERSONAL");
    let msg = domain_event(LookupEvent::ASSOCIATION_REQUEST_RECEIVED, payload.clone());
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.last().unwrap();
    assert_eq!(sent.msg_name(), "ParticipantAssociationCreated");
    match sent.event {
        OutboundEvent::ParticipantAssociationCreated(change) => {
            assert_eq!(change.owner_fsp_id.as_str(), "fsp2");
            assert_eq!(change.party_sub_type.as_deref(), Some("PERSONAL"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    let provider = h.factory.provider_for(&oracle.id).unwrap();
    assert_eq!(provider.association_count(), 1);

    // Claiming the same address again fails typed.
    let msg = domain_event(LookupEvent::ASSOCIATION_REQUEST_RECEIVED, payload.clone());
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "UnableToAssociateParticipantError"
    );
    assert_eq!(provider.association_count(), 1);

    // Releasing it succeeds once, then fails typed.
    let msg = domain_event(LookupEvent::DISASSOCIATION_REQUEST_RECEIVED, payload.clone());
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "ParticipantAssociationRemoved"
    );
    assert_eq!(provider.association_count(), 0);

    let msg = domain_event(LookupEvent::DISASSOCIATION_REQUEST_RECEIVED, payload);
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "UnableToDisassociateParticipantError"
    );
}

#[tokio::test]
async fn infrastructure_failures_keep_event_handling_total() {
    let directory = StaticParticipantDirectory::new()
        .with_active("participant1")
        .with_active("fsp2");
    let h = harness(directory).await;
    let oracle = h
        .aggregate
        .add_oracle(builtin_oracle("bank oracle", "bank"))
        .await
        .unwrap();
    let provider = h.factory.provider_for(&oracle.id).unwrap();

    // Provider read failure during resolution.
    provider.set_fail_lookups(true);
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "FspIdLookupFailedError"
    );
    provider.set_fail_lookups(false);

    // Provider write failure has no typed meaning: unknown kind.
    provider.set_fail_writes(true);
    let msg = domain_event(
        LookupEvent::ASSOCIATION_REQUEST_RECEIVED,
        association_request("bank", "party1", "fsp2"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(h.publisher.last().unwrap().msg_name(), "LookupUnknownError");
    provider.set_fail_writes(false);

    // Registry failure during oracle resolution.
    h.registry.set_failing(true);
    let msg = domain_event(
        LookupEvent::PARTY_QUERY_RECEIVED,
        party_query("bank", "party1", "participant1"),
    );
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(
        h.publisher.last().unwrap().msg_name(),
        "OracleLookupFailedError"
    );
}

#[tokio::test]
async fn publish_failure_is_the_only_escaping_error() {
    let h = harness(StaticParticipantDirectory::new()).await;

    h.publisher.set_failing(true);
    let msg = domain_event("Garbage", json!({}));
    let err = h.aggregate.handle_event(&msg).await.unwrap_err();
    assert!(matches!(err, Error::Publish(_)));

    h.publisher.set_failing(false);
    h.aggregate.handle_event(&msg).await.unwrap();
    assert_eq!(h.publisher.len(), 1);
}

#[tokio::test]
async fn each_outbound_envelope_gets_a_fresh_msg_id() {
    let h = harness(StaticParticipantDirectory::new()).await;

    let msg = domain_event("Garbage", json!({}));
    h.aggregate.handle_event(&msg).await.unwrap();
    h.aggregate.handle_event(&msg).await.unwrap();

    let sent = h.publisher.sent();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].msg_id, sent[1].msg_id);
    assert_ne!(sent[0].msg_id, msg.msg_id);
}
