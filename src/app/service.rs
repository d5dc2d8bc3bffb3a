//! Service lifecycle.
//!
//! Wires the configured adapters into a [`LookupAggregate`] and manages
//! startup and shutdown. Transports stay outside: the host hands in the
//! participant directory and event publisher it wants the aggregate to
//! use, and drives the returned aggregate itself.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::sqlite::{create_pool, SqliteOracleRegistry};
use crate::app::aggregate::LookupAggregate;
use crate::app::factory::OracleProviderFactory;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::participants::ParticipantDirectory;
use crate::port::publisher::EventPublisher;

/// A running lookup service.
pub struct Service {
    aggregate: Arc<LookupAggregate>,
}

impl Service {
    /// Bring the service up: connection pool, oracle registry, provider
    /// factory, then aggregate init (which runs migrations and starts
    /// one provider per registered oracle).
    pub async fn start(
        config: &Config,
        participants: Arc<dyn ParticipantDirectory>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self> {
        info!(database = %config.database, "starting lookup service");

        let pool = create_pool(&config.database)?;
        let registry = SqliteOracleRegistry::new(pool.clone());
        let factory = OracleProviderFactory::new(
            pool,
            config.cache.clone(),
            config.remote_oracle.clone(),
        );
        let aggregate = Arc::new(LookupAggregate::new(
            Box::new(registry),
            participants,
            publisher,
            Box::new(factory),
        ));
        aggregate.init().await?;

        Ok(Self { aggregate })
    }

    /// The running aggregate, for transports and admin surfaces to drive.
    pub fn aggregate(&self) -> Arc<LookupAggregate> {
        Arc::clone(&self.aggregate)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.aggregate.destroy().await
    }
}
