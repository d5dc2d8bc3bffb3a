//! The lookup aggregate.
//!
//! Owns the live provider table and drives every flow: inbound domain
//! events, synchronous account lookups and the admin surface. Event
//! handling is total over its input. Every business failure is converted
//! into a typed error event and published like any success; the only
//! errors that escape [`LookupAggregate::handle_event`] come from the
//! publisher itself.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::factory::ProviderFactory;
use crate::domain::association::{Association, AssociationFilter, AssociationPage, Page, SearchKeyword};
use crate::domain::error::DomainError;
use crate::domain::event::{
    AssociationChange, AssociationRequest, FailureContext, LookupEvent, OutboundEvent,
    ParticipantQuery, ParticipantQueryResponse, PartyInfo, PartyInfoRequested, PartyQuery,
    PartyQueryResponse,
};
use crate::domain::ids::{Currency, FspId, OracleId, PartyType};
use crate::domain::message::{InboundMessage, OutboundMessage};
use crate::domain::oracle::{CreateOracle, Oracle, OracleType};
use crate::domain::party::{ParticipantLookup, PartyKey};
use crate::error::Result;
use crate::port::oracle_provider::OracleProvider;
use crate::port::oracle_registry::OracleRegistry;
use crate::port::participants::ParticipantDirectory;
use crate::port::publisher::EventPublisher;

/// Orchestrator for party lookup.
///
/// Holds one live provider per registered oracle. The aggregate is the
/// sole mutator of that table; external readers get snapshots only.
pub struct LookupAggregate {
    registry: Box<dyn OracleRegistry>,
    participants: Arc<dyn ParticipantDirectory>,
    publisher: Arc<dyn EventPublisher>,
    factory: Box<dyn ProviderFactory>,
    providers: RwLock<HashMap<OracleId, Arc<dyn OracleProvider>>>,
}

impl LookupAggregate {
    pub fn new(
        registry: Box<dyn OracleRegistry>,
        participants: Arc<dyn ParticipantDirectory>,
        publisher: Arc<dyn EventPublisher>,
        factory: Box<dyn ProviderFactory>,
    ) -> Self {
        Self {
            registry,
            participants,
            publisher,
            factory,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Load every registered oracle and bring one provider per record
    /// live. A failure propagates immediately; providers already
    /// initialized stay in the table for [`destroy`](Self::destroy) to
    /// tear down.
    pub async fn init(&self) -> Result<()> {
        self.registry.init().await?;
        let oracles = self.registry.get_all_oracles().await?;
        for oracle in &oracles {
            let provider = self.factory.create(oracle)?;
            provider.init().await?;
            self.providers.write().insert(oracle.id.clone(), provider);
        }
        info!(oracles = oracles.len(), "lookup aggregate started");
        Ok(())
    }

    /// Tear down the registry, then every live provider. Failures are
    /// logged and rethrown; teardown is not retried, so a mid-sequence
    /// failure leaves the remaining providers undestroyed.
    pub async fn destroy(&self) -> Result<()> {
        if let Err(err) = self.registry.destroy().await {
            error!(error = %err, "registry teardown failed");
            return Err(err);
        }
        let providers: Vec<Arc<dyn OracleProvider>> = {
            let mut table = self.providers.write();
            table.drain().map(|(_, provider)| provider).collect()
        };
        for provider in providers {
            if let Err(err) = provider.destroy().await {
                error!(oracle_id = %provider.oracle_id(), error = %err, "provider teardown failed");
                return Err(err);
            }
        }
        info!("lookup aggregate stopped");
        Ok(())
    }

    // ---- event handling ----

    /// Consume one inbound message and publish exactly one outbound
    /// event, success or typed error. Opaque state and tracing info are
    /// copied verbatim onto the output. Only a publish failure escapes.
    pub async fn handle_event(&self, message: &InboundMessage) -> Result<()> {
        let event = self.route_message(message).await;
        let outbound = OutboundMessage {
            msg_id: Uuid::new_v4().to_string(),
            event,
            tracing_info: message.tracing_info.clone(),
            opaque_state: message.opaque_state.clone(),
        };
        debug!(
            msg_id = %message.msg_id,
            msg_name = %message.msg_name,
            out_msg_name = outbound.msg_name(),
            "lookup event handled"
        );
        self.publisher.publish(outbound).await
    }

    /// Total routing function: any failure past this point has already
    /// been folded into a [`LookupFailure`] payload.
    async fn route_message(&self, message: &InboundMessage) -> OutboundEvent {
        let event = match LookupEvent::decode(message) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    msg_id = %message.msg_id,
                    msg_name = %message.msg_name,
                    error = %err,
                    "inbound message rejected"
                );
                let failure = FailureContext::from_message(message)
                    .failure(err.failure_kind(), err.to_string());
                return OutboundEvent::LookupFailed(failure);
            }
        };
        let context = FailureContext::from_event(&event);
        let msg_name = event.msg_name();
        match self.dispatch(event).await {
            Ok(outbound) => outbound,
            Err(err) => {
                warn!(msg_name, error = %err, "lookup event failed");
                OutboundEvent::LookupFailed(context.failure(err.failure_kind(), err.to_string()))
            }
        }
    }

    async fn dispatch(&self, event: LookupEvent) -> Result<OutboundEvent> {
        match event {
            LookupEvent::PartyQueryReceived(query) => self.handle_party_query(query).await,
            LookupEvent::PartyInfoAvailable(info) => self.handle_party_info(info).await,
            LookupEvent::ParticipantQueryReceived(query) => {
                self.handle_participant_query(query).await
            }
            LookupEvent::AssociationRequestReceived(request) => {
                self.handle_associate(request).await
            }
            LookupEvent::DisassociationRequestReceived(request) => {
                self.handle_disassociate(request).await
            }
        }
    }

    /// A party query turns into an info request aimed at the owning FSP.
    /// When the requester already named a destination, oracle resolution
    /// is skipped; the destination is validated either way.
    async fn handle_party_query(&self, query: PartyQuery) -> Result<OutboundEvent> {
        self.validate_participant(&query.requester_fsp_id).await?;
        let destination_fsp_id = match query.destination_fsp_id {
            Some(destination) => destination,
            None => {
                let key = PartyKey {
                    party_type: query.party_type.clone(),
                    party_id: query.party_id.clone(),
                    party_sub_type: query.party_sub_type.clone(),
                    currency: query.currency.clone(),
                };
                self.resolve_fsp_id(&key).await?
            }
        };
        self.validate_participant(&destination_fsp_id).await?;
        Ok(OutboundEvent::PartyInfoRequested(PartyInfoRequested {
            party_id: query.party_id,
            party_type: query.party_type,
            party_sub_type: query.party_sub_type,
            currency: query.currency,
            requester_fsp_id: query.requester_fsp_id,
            destination_fsp_id,
        }))
    }

    /// Party details announced by the owner are relayed back to the
    /// requester once both ends check out.
    async fn handle_party_info(&self, info: PartyInfo) -> Result<OutboundEvent> {
        self.validate_participant(&info.requester_fsp_id).await?;
        self.validate_participant(&info.destination_fsp_id).await?;
        Ok(OutboundEvent::PartyQueryResponse(PartyQueryResponse {
            party_id: info.party_id,
            party_type: info.party_type,
            party_sub_type: info.party_sub_type,
            currency: info.currency,
            requester_fsp_id: info.requester_fsp_id,
            destination_fsp_id: info.destination_fsp_id,
            owner_fsp_id: info.owner_fsp_id,
            party_name: info.party_name,
            party_date_of_birth: info.party_date_of_birth,
        }))
    }

    async fn handle_participant_query(&self, query: ParticipantQuery) -> Result<OutboundEvent> {
        self.validate_participant(&query.requester_fsp_id).await?;
        let key = PartyKey {
            party_type: query.party_type.clone(),
            party_id: query.party_id.clone(),
            party_sub_type: query.party_sub_type.clone(),
            currency: query.currency.clone(),
        };
        let owner_fsp_id = self.resolve_fsp_id(&key).await?;
        self.validate_participant(&owner_fsp_id).await?;
        Ok(OutboundEvent::ParticipantQueryResponse(
            ParticipantQueryResponse {
                party_id: query.party_id,
                party_type: query.party_type,
                party_sub_type: query.party_sub_type,
                currency: query.currency,
                requester_fsp_id: query.requester_fsp_id,
                owner_fsp_id,
            },
        ))
    }

    async fn handle_associate(&self, request: AssociationRequest) -> Result<OutboundEvent> {
        self.validate_participant(&request.owner_fsp_id).await?;
        let provider = self
            .resolve_oracle_provider(&request.party_type, request.currency.as_ref())
            .await?;
        let key = PartyKey {
            party_type: request.party_type.clone(),
            party_id: request.party_id.clone(),
            party_sub_type: request.party_sub_type.clone(),
            currency: request.currency.clone(),
        };
        provider
            .associate_participant(&request.owner_fsp_id, &key)
            .await?;
        Ok(OutboundEvent::ParticipantAssociationCreated(
            AssociationChange {
                party_id: request.party_id,
                party_type: request.party_type,
                party_sub_type: request.party_sub_type,
                currency: request.currency,
                owner_fsp_id: request.owner_fsp_id,
            },
        ))
    }

    async fn handle_disassociate(&self, request: AssociationRequest) -> Result<OutboundEvent> {
        self.validate_participant(&request.owner_fsp_id).await?;
        let provider = self
            .resolve_oracle_provider(&request.party_type, request.currency.as_ref())
            .await?;
        let key = PartyKey {
            party_type: request.party_type.clone(),
            party_id: request.party_id.clone(),
            party_sub_type: request.party_sub_type.clone(),
            currency: request.currency.clone(),
        };
        provider
            .disassociate_participant(&request.owner_fsp_id, &key)
            .await?;
        Ok(OutboundEvent::ParticipantAssociationRemoved(
            AssociationChange {
                party_id: request.party_id,
                party_type: request.party_type,
                party_sub_type: request.party_sub_type,
                currency: request.currency,
                owner_fsp_id: request.owner_fsp_id,
            },
        ))
    }

    // ---- resolution ----

    /// Resolve the live provider for a party type and currency.
    ///
    /// Registry I/O failures are wrapped as `OracleLookupFailed`; an
    /// unresolved party type is `NoSuchOracle`; an oracle whose provider
    /// is missing from the live table is `NoSuchOracleProvider`, the
    /// stale-registry signal.
    async fn resolve_oracle_provider(
        &self,
        party_type: &PartyType,
        currency: Option<&Currency>,
    ) -> Result<Arc<dyn OracleProvider>> {
        let oracle = self
            .registry
            .get_oracle(party_type, currency)
            .await
            .map_err(|e| DomainError::OracleLookupFailed {
                reason: e.to_string(),
            })?
            .ok_or_else(|| DomainError::NoSuchOracle {
                party_type: party_type.clone(),
                currency: currency.cloned(),
            })?;
        let provider = self.providers.read().get(&oracle.id).cloned();
        let provider = provider.ok_or(DomainError::NoSuchOracleProvider {
            oracle_id: oracle.id,
        })?;
        Ok(provider)
    }

    /// Full resolution chain for one party address: oracle, provider,
    /// then the FSP id lookup itself. Provider I/O failures are wrapped
    /// as `FspIdLookupFailed`; an unassociated address is
    /// `NoSuchParticipant`.
    async fn resolve_fsp_id(&self, key: &PartyKey) -> Result<FspId> {
        let provider = self
            .resolve_oracle_provider(&key.party_type, key.currency.as_ref())
            .await?;
        let fsp_id = provider
            .get_participant_fsp_id(key)
            .await
            .map_err(|e| DomainError::FspIdLookupFailed {
                reason: e.to_string(),
            })?;
        let fsp_id = fsp_id.ok_or(DomainError::NoSuchParticipant {
            party_id: key.party_id.clone(),
        })?;
        Ok(fsp_id)
    }

    /// Check an FSP against the participant directory: it must exist,
    /// answer with the same id, and be active. Directory I/O failures
    /// propagate untyped and surface as the generic unknown event kind.
    async fn validate_participant(&self, fsp_id: &FspId) -> Result<()> {
        let participant = self
            .participants
            .get_participant_info(fsp_id)
            .await?
            .ok_or(DomainError::ParticipantNotFound {
                fsp_id: fsp_id.clone(),
            })?;
        if participant.id != *fsp_id {
            return Err(DomainError::ParticipantIdMismatch {
                requested: fsp_id.clone(),
                returned: participant.id,
            }
            .into());
        }
        if !participant.is_active {
            return Err(DomainError::ParticipantNotActive {
                fsp_id: fsp_id.clone(),
            }
            .into());
        }
        Ok(())
    }

    // ---- synchronous lookup ----

    /// Resolve one party address to its owning FSP id. Errors propagate
    /// to the caller; this path never publishes events.
    pub async fn get_account_lookup(&self, lookup: &ParticipantLookup) -> Result<FspId> {
        let key = PartyKey {
            party_type: lookup.party_type.clone(),
            party_id: lookup.party_id.clone(),
            party_sub_type: None,
            currency: lookup.currency.clone(),
        };
        self.resolve_fsp_id(&key).await
    }

    /// Resolve a batch of party addresses. Per-key failures are logged
    /// and swallowed as `None`; the batch itself always succeeds.
    pub async fn get_bulk_account_lookup(
        &self,
        lookups: &HashMap<String, ParticipantLookup>,
    ) -> HashMap<String, Option<FspId>> {
        let mut results = HashMap::with_capacity(lookups.len());
        for (request_id, lookup) in lookups {
            match self.get_account_lookup(lookup).await {
                Ok(fsp_id) => {
                    results.insert(request_id.clone(), Some(fsp_id));
                }
                Err(err) => {
                    warn!(
                        request_id = %request_id,
                        party_id = %lookup.party_id,
                        error = %err,
                        "bulk account lookup entry failed"
                    );
                    results.insert(request_id.clone(), None);
                }
            }
        }
        results
    }

    // ---- admin ----

    /// Register an oracle and bring its provider live. Duplicate name or
    /// routing key is rejected by the registry before any provider is
    /// built.
    pub async fn add_oracle(&self, input: CreateOracle) -> Result<Oracle> {
        let oracle = self.registry.add_oracle(input).await?;
        let provider = self.factory.create(&oracle)?;
        provider.init().await?;
        self.providers.write().insert(oracle.id.clone(), provider);
        info!(
            oracle_id = %oracle.id,
            name = %oracle.name,
            oracle_type = %oracle.oracle_type,
            "oracle added"
        );
        Ok(oracle)
    }

    /// Delete an oracle record and tear down its provider. Fails with
    /// `OracleNotFound` when the record does not exist.
    pub async fn remove_oracle(&self, id: &OracleId) -> Result<()> {
        self.registry.remove_oracle(id).await?;
        let provider = self.providers.write().remove(id);
        if let Some(provider) = provider {
            provider.destroy().await?;
        }
        info!(oracle_id = %id, "oracle removed");
        Ok(())
    }

    pub async fn get_all_oracles(&self) -> Result<Vec<Oracle>> {
        self.registry.get_all_oracles().await
    }

    pub async fn get_oracle_by_id(&self, id: &OracleId) -> Result<Oracle> {
        let oracle = self.registry.get_oracle_by_id(id).await?;
        let oracle = oracle.ok_or(DomainError::OracleNotFound {
            oracle_id: id.clone(),
        })?;
        Ok(oracle)
    }

    /// Probe one oracle's provider. Fails with `OracleNotFound` when no
    /// live provider carries the id.
    pub async fn health_check(&self, id: &OracleId) -> Result<bool> {
        let provider = self.providers.read().get(id).cloned();
        match provider {
            Some(provider) => provider.health_check().await,
            None => Err(DomainError::OracleNotFound {
                oracle_id: id.clone(),
            }
            .into()),
        }
    }

    /// Every association held by builtin oracles, concatenated across
    /// providers.
    pub async fn get_builtin_associations(&self) -> Result<Vec<Association>> {
        let mut associations = Vec::new();
        for (oracle, provider) in self.builtin_providers().await? {
            let mut items = provider.get_all_associations().await?;
            debug!(oracle_id = %oracle.id, count = items.len(), "builtin associations fetched");
            associations.append(&mut items);
        }
        Ok(associations)
    }

    /// Filtered association search across builtin oracles. Totals are
    /// summed; the merged page is clipped back to the requested size.
    pub async fn search_builtin_associations(
        &self,
        filter: &AssociationFilter,
        page: Page,
    ) -> Result<AssociationPage> {
        let mut items = Vec::new();
        let mut total = 0u64;
        for (_, provider) in self.builtin_providers().await? {
            let result = provider.search_associations(filter, page).await?;
            total += result.total;
            items.extend(result.items);
        }
        items.truncate(page.size as usize);
        Ok(AssociationPage {
            items,
            page: page.number,
            page_size: page.size,
            total,
        })
    }

    /// Distinct searchable terms merged across builtin oracles, each
    /// field's terms deduplicated and sorted.
    pub async fn get_search_keywords(&self) -> Result<Vec<SearchKeyword>> {
        let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (_, provider) in self.builtin_providers().await? {
            for keyword in provider.search_keywords().await? {
                merged
                    .entry(keyword.field_name)
                    .or_default()
                    .extend(keyword.distinct_terms);
            }
        }
        Ok(merged
            .into_iter()
            .map(|(field_name, terms)| SearchKeyword {
                field_name,
                distinct_terms: terms.into_iter().collect(),
            })
            .collect())
    }

    /// Snapshot of the live provider table. Mutating the returned
    /// collection never touches aggregate state.
    pub fn oracle_providers(&self) -> Vec<Arc<dyn OracleProvider>> {
        self.providers.read().values().cloned().collect()
    }

    /// Builtin oracles paired with their live providers. An oracle whose
    /// provider is missing fails the whole call as `NoSuchOracleProvider`.
    async fn builtin_providers(&self) -> Result<Vec<(Oracle, Arc<dyn OracleProvider>)>> {
        let oracles = self.registry.get_all_oracles().await?;
        let mut pairs = Vec::new();
        for oracle in oracles {
            if oracle.oracle_type != OracleType::Builtin {
                continue;
            }
            let provider = self.providers.read().get(&oracle.id).cloned();
            let provider = provider.ok_or(DomainError::NoSuchOracleProvider {
                oracle_id: oracle.id.clone(),
            })?;
            pairs.push((oracle, provider));
        }
        Ok(pairs)
    }
}
