//! In-memory fakes for the oracle registry, oracle providers and the
//! provider factory.
//!
//! All fakes share their state through `Arc`, so a clone kept by the test
//! observes everything the aggregate does through the moved-in copy.
//! Scripted failure knobs flip the corresponding calls into
//! infrastructure errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::app::factory::ProviderFactory;
use crate::domain::association::{
    Association, AssociationFilter, AssociationPage, Page, SearchKeyword,
};
use crate::domain::error::DomainError;
use crate::domain::ids::{Currency, FspId, OracleId, PartyType};
use crate::domain::oracle::{CreateOracle, Oracle};
use crate::domain::party::PartyKey;
use crate::error::{Error, Result};
use crate::port::oracle_provider::OracleProvider;
use crate::port::oracle_registry::OracleRegistry;

// ---------------------------------------------------------------------------
// InMemoryOracleRegistry
// ---------------------------------------------------------------------------

/// Registry fake with the same uniqueness and resolution semantics as the
/// durable one.
#[derive(Clone, Default)]
pub struct InMemoryOracleRegistry {
    oracles: Arc<RwLock<Vec<Oracle>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryOracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load records, bypassing uniqueness checks.
    pub fn with_oracles(self, oracles: Vec<Oracle>) -> Self {
        *self.oracles.write() = oracles;
        self
    }

    /// When set, every call fails with a scripted infrastructure error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.oracles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.read().is_empty()
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Database("scripted registry failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OracleRegistry for InMemoryOracleRegistry {
    async fn init(&self) -> Result<()> {
        self.check_failing()
    }

    async fn destroy(&self) -> Result<()> {
        self.check_failing()
    }

    async fn add_oracle(&self, input: CreateOracle) -> Result<Oracle> {
        self.check_failing()?;
        let oracle = input.into_oracle();
        let mut oracles = self.oracles.write();
        if oracles.iter().any(|o| o.id == oracle.id) {
            return Err(DomainError::DuplicateOracle {
                reason: format!("id '{}' already registered", oracle.id),
            }
            .into());
        }
        if oracles.iter().any(|o| o.name == oracle.name) {
            return Err(DomainError::DuplicateOracle {
                reason: format!("name '{}' already registered", oracle.name),
            }
            .into());
        }
        if oracles
            .iter()
            .any(|o| o.party_type == oracle.party_type && o.currency == oracle.currency)
        {
            return Err(DomainError::DuplicateOracle {
                reason: format!(
                    "party type '{}' already covered for this currency",
                    oracle.party_type
                ),
            }
            .into());
        }
        oracles.push(oracle.clone());
        Ok(oracle)
    }

    async fn remove_oracle(&self, id: &OracleId) -> Result<()> {
        self.check_failing()?;
        let mut oracles = self.oracles.write();
        let before = oracles.len();
        oracles.retain(|o| o.id != *id);
        if oracles.len() == before {
            return Err(DomainError::OracleNotFound {
                oracle_id: id.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn get_all_oracles(&self) -> Result<Vec<Oracle>> {
        self.check_failing()?;
        Ok(self.oracles.read().clone())
    }

    async fn get_oracle_by_id(&self, id: &OracleId) -> Result<Option<Oracle>> {
        self.check_failing()?;
        Ok(self.oracles.read().iter().find(|o| o.id == *id).cloned())
    }

    async fn get_oracle_by_name(&self, name: &str) -> Result<Option<Oracle>> {
        self.check_failing()?;
        Ok(self.oracles.read().iter().find(|o| o.name == name).cloned())
    }

    async fn get_oracle(
        &self,
        party_type: &PartyType,
        currency: Option<&Currency>,
    ) -> Result<Option<Oracle>> {
        self.check_failing()?;
        let oracles = self.oracles.read();
        let mut catch_all = None;
        for oracle in oracles.iter().filter(|o| o.party_type == *party_type) {
            match (&oracle.currency, currency) {
                (Some(have), Some(want)) if have == want => return Ok(Some(oracle.clone())),
                (None, _) => catch_all = Some(oracle.clone()),
                _ => {}
            }
        }
        Ok(catch_all)
    }
}

// ---------------------------------------------------------------------------
// InMemoryOracleProvider
// ---------------------------------------------------------------------------

/// Provider fake backed by a plain map.
///
/// Associate/disassociate follow the durable provider's consistency
/// rules; `fail_lookups` and `fail_writes` script infrastructure errors
/// per call family.
pub struct InMemoryOracleProvider {
    oracle_id: OracleId,
    party_type: PartyType,
    associations: RwLock<HashMap<PartyKey, FspId>>,
    healthy: AtomicBool,
    fail_lookups: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryOracleProvider {
    pub fn new(oracle_id: OracleId, party_type: PartyType) -> Self {
        Self {
            oracle_id,
            party_type,
            associations: RwLock::new(HashMap::new()),
            healthy: AtomicBool::new(true),
            fail_lookups: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Insert an association directly, bypassing consistency checks.
    pub fn seed(&self, fsp_id: impl Into<FspId>, key: PartyKey) {
        self.associations.write().insert(key, fsp_id.into());
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_fail_lookups(&self, failing: bool) {
        self.fail_lookups.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn association_count(&self) -> usize {
        self.associations.read().len()
    }

    fn snapshot(&self) -> Vec<Association> {
        let mut items: Vec<Association> = self
            .associations
            .read()
            .iter()
            .map(|(key, fsp_id)| Association {
                fsp_id: fsp_id.clone(),
                party_type: key.party_type.clone(),
                party_id: key.party_id.clone(),
                party_sub_type: key.party_sub_type.clone(),
                currency: key.currency.clone(),
            })
            .collect();
        items.sort_by(|a, b| {
            a.party_id.as_str().cmp(b.party_id.as_str()).then_with(|| {
                a.currency
                    .as_ref()
                    .map(Currency::as_str)
                    .cmp(&b.currency.as_ref().map(Currency::as_str))
            })
        });
        items
    }
}

#[async_trait]
impl OracleProvider for InMemoryOracleProvider {
    fn oracle_id(&self) -> &OracleId {
        &self.oracle_id
    }

    fn party_type(&self) -> &PartyType {
        &self.party_type
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    async fn get_participant_fsp_id(&self, key: &PartyKey) -> Result<Option<FspId>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted lookup failure".to_string()));
        }
        Ok(self.associations.read().get(key).cloned())
    }

    async fn associate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted write failure".to_string()));
        }
        let mut associations = self.associations.write();
        if associations.contains_key(key) {
            return Err(DomainError::AssociationExists {
                party_id: key.party_id.clone(),
            }
            .into());
        }
        associations.insert(key.clone(), fsp_id.clone());
        Ok(())
    }

    async fn disassociate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted write failure".to_string()));
        }
        let mut associations = self.associations.write();
        match associations.get(key) {
            Some(owner) if owner == fsp_id => {
                associations.remove(key);
                Ok(())
            }
            _ => Err(DomainError::AssociationNotFound {
                party_id: key.party_id.clone(),
            }
            .into()),
        }
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted lookup failure".to_string()));
        }
        Ok(self.snapshot())
    }

    async fn search_associations(
        &self,
        filter: &AssociationFilter,
        page: Page,
    ) -> Result<AssociationPage> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted lookup failure".to_string()));
        }
        let matches: Vec<Association> = self
            .snapshot()
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok(AssociationPage {
            items,
            page: page.number,
            page_size: page.size,
            total,
        })
    }

    async fn search_keywords(&self) -> Result<Vec<SearchKeyword>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted lookup failure".to_string()));
        }
        let associations = self.snapshot();
        let distinct = |terms: Vec<String>| {
            let mut terms: Vec<String> = terms.into_iter().filter(|t| !t.is_empty()).collect();
            terms.sort();
            terms.dedup();
            terms
        };
        Ok(vec![
            SearchKeyword {
                field_name: "fspId".to_string(),
                distinct_terms: distinct(
                    associations.iter().map(|a| a.fsp_id.to_string()).collect(),
                ),
            },
            SearchKeyword {
                field_name: "partyType".to_string(),
                distinct_terms: distinct(
                    associations
                        .iter()
                        .map(|a| a.party_type.to_string())
                        .collect(),
                ),
            },
            SearchKeyword {
                field_name: "partySubType".to_string(),
                distinct_terms: distinct(
                    associations
                        .iter()
                        .filter_map(|a| a.party_sub_type.clone())
                        .collect(),
                ),
            },
            SearchKeyword {
                field_name: "currency".to_string(),
                distinct_terms: distinct(
                    associations
                        .iter()
                        .filter_map(|a| a.currency.as_ref().map(ToString::to_string))
                        .collect(),
                ),
            },
        ])
    }
}

// ---------------------------------------------------------------------------
// InMemoryProviderFactory
// ---------------------------------------------------------------------------

/// Factory fake producing one [`InMemoryOracleProvider`] per oracle and
/// keeping a handle to each, so tests can reach the scripted knobs of
/// providers the aggregate built internally.
#[derive(Clone, Default)]
pub struct InMemoryProviderFactory {
    created: Arc<Mutex<Vec<Arc<InMemoryOracleProvider>>>>,
}

impl InMemoryProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<Arc<InMemoryOracleProvider>> {
        self.created.lock().clone()
    }

    pub fn provider_for(&self, oracle_id: &OracleId) -> Option<Arc<InMemoryOracleProvider>> {
        self.created
            .lock()
            .iter()
            .find(|p| p.oracle_id() == oracle_id)
            .cloned()
    }
}

impl ProviderFactory for InMemoryProviderFactory {
    fn create(&self, oracle: &Oracle) -> Result<Arc<dyn OracleProvider>> {
        let provider = Arc::new(InMemoryOracleProvider::new(
            oracle.id.clone(),
            oracle.party_type.clone(),
        ));
        self.created.lock().push(Arc::clone(&provider));
        Ok(provider)
    }
}
