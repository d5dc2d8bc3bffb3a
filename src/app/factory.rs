//! Oracle provider construction.
//!
//! Builds the right provider variant for an oracle record: builtin
//! providers share the service's database pool, remote providers get an
//! HTTP client configured from the service settings.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::outbound::http::RemoteOracleProvider;
use crate::adapter::outbound::sqlite::{BuiltinOracleProvider, DbPool};
use crate::domain::error::DomainError;
use crate::domain::oracle::{Oracle, OracleType};
use crate::error::Result;
use crate::infrastructure::config::{CacheConfig, RemoteOracleConfig};
use crate::port::oracle_provider::OracleProvider;

/// Builds providers for oracle records.
///
/// A trait seam so hosts and tests can substitute their own construction;
/// the service wires [`OracleProviderFactory`].
pub trait ProviderFactory: Send + Sync {
    fn create(&self, oracle: &Oracle) -> Result<Arc<dyn OracleProvider>>;
}

/// Standard factory covering every supported oracle type.
pub struct OracleProviderFactory {
    pool: DbPool,
    cache: CacheConfig,
    http: RemoteOracleConfig,
}

impl OracleProviderFactory {
    #[must_use]
    pub fn new(pool: DbPool, cache: CacheConfig, http: RemoteOracleConfig) -> Self {
        Self { pool, cache, http }
    }
}

impl ProviderFactory for OracleProviderFactory {
    fn create(&self, oracle: &Oracle) -> Result<Arc<dyn OracleProvider>> {
        let provider: Arc<dyn OracleProvider> = match oracle.oracle_type {
            OracleType::Builtin => {
                let mut provider = BuiltinOracleProvider::new(
                    oracle.id.clone(),
                    oracle.party_type.clone(),
                    oracle.currency.clone(),
                    self.pool.clone(),
                );
                if self.cache.enabled {
                    provider = provider.with_cache(self.cache.ttl());
                }
                Arc::new(provider)
            }
            OracleType::RemoteHttp => {
                let endpoint =
                    oracle
                        .endpoint
                        .as_deref()
                        .ok_or_else(|| DomainError::InvalidOracle {
                            reason: format!("remote oracle '{}' has no endpoint", oracle.name),
                        })?;
                Arc::new(RemoteOracleProvider::from_config(
                    oracle.id.clone(),
                    oracle.party_type.clone(),
                    endpoint,
                    &self.http,
                )?)
            }
        };

        debug!(
            oracle_id = %oracle.id,
            oracle_type = %oracle.oracle_type,
            party_type = %oracle.party_type,
            "oracle provider built"
        );
        Ok(provider)
    }
}
