//! Remote oracle provider: delegates lookups and association writes to an
//! external oracle over its REST surface.
//!
//! Routes follow the common oracle convention:
//! - `GET  /participants/{partyType}/{partyId}[/{partySubType}]?currency=`
//! - `POST /participants/...` with an `fspId` body to associate
//! - `DELETE /participants/...` to disassociate
//! - `GET  /health`
//!
//! A missing association is a 404, mapped to `None`. Admin listing and
//! search stay local to builtin oracles; remote oracles reject them.

pub mod dto;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, warn};
use url::Url;

use self::dto::FspIdPayload;
use crate::domain::association::{
    Association, AssociationFilter, AssociationPage, Page, SearchKeyword,
};
use crate::domain::error::DomainError;
use crate::domain::ids::{FspId, OracleId, PartyType};
use crate::domain::party::PartyKey;
use crate::error::{Error, Result};
use crate::infrastructure::config::RemoteOracleConfig;
use crate::port::oracle_provider::OracleProvider;

/// HTTP-backed oracle provider.
#[derive(Debug)]
pub struct RemoteOracleProvider {
    oracle_id: OracleId,
    party_type: PartyType,
    base_url: Url,
    http: HttpClient,
}

impl RemoteOracleProvider {
    /// Create a provider with default client settings.
    pub fn new(oracle_id: OracleId, party_type: PartyType, endpoint: &str) -> Result<Self> {
        let base_url = Url::parse(endpoint)?;
        if base_url.cannot_be_a_base() {
            return Err(DomainError::InvalidOracle {
                reason: format!("endpoint '{endpoint}' cannot carry request paths"),
            }
            .into());
        }
        Ok(Self {
            oracle_id,
            party_type,
            base_url,
            http: HttpClient::new(),
        })
    }

    /// Create a provider with timeouts taken from config.
    pub fn from_config(
        oracle_id: OracleId,
        party_type: PartyType,
        endpoint: &str,
        config: &RemoteOracleConfig,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        let mut provider = Self::new(oracle_id, party_type, endpoint)?;
        provider.http = http;
        Ok(provider)
    }

    /// Participant route for a party address.
    fn participants_url(&self, key: &PartyKey) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Domain(DomainError::InvalidOracle {
                    reason: "endpoint cannot carry request paths".to_string(),
                })
            })?;
            segments.pop_if_empty();
            segments.push("participants");
            segments.push(key.party_type.as_str());
            segments.push(key.party_id.as_str());
            if let Some(sub_type) = &key.party_sub_type {
                segments.push(sub_type);
            }
        }
        if let Some(currency) = &key.currency {
            url.query_pairs_mut()
                .append_pair("currency", currency.as_str());
        }
        Ok(url)
    }

    fn health_url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Domain(DomainError::InvalidOracle {
                    reason: "endpoint cannot carry request paths".to_string(),
                })
            })?;
            segments.pop_if_empty();
            segments.push("health");
        }
        Ok(url)
    }

    fn unsupported(operation: &'static str) -> Error {
        DomainError::UnsupportedOperation { operation }.into()
    }
}

#[async_trait]
impl OracleProvider for RemoteOracleProvider {
    fn oracle_id(&self) -> &OracleId {
        &self.oracle_id
    }

    fn party_type(&self) -> &PartyType {
        &self.party_type
    }

    async fn init(&self) -> Result<()> {
        debug!(
            oracle_id = %self.oracle_id,
            endpoint = %self.base_url,
            "remote oracle attached"
        );
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        debug!(oracle_id = %self.oracle_id, "remote oracle detached");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.health_url()?;
        match self.http.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(err) => {
                debug!(oracle_id = %self.oracle_id, error = %err, "health probe failed");
                Ok(false)
            }
        }
    }

    async fn get_participant_fsp_id(&self, key: &PartyKey) -> Result<Option<FspId>> {
        let url = self.participants_url(key)?;
        let response = self.http.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let payload: FspIdPayload = response.json().await?;
                Ok(Some(FspId::new(payload.fsp_id)))
            }
            status => Err(Error::RemoteOracle(format!(
                "lookup for party '{}' returned {status}",
                key.party_id
            ))),
        }
    }

    async fn associate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        let url = self.participants_url(key)?;
        let body = FspIdPayload {
            fsp_id: fsp_id.as_str().to_string(),
        };
        let response = self.http.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Error::RemoteOracle(format!(
                "associate for party '{}' returned {}",
                key.party_id,
                response.status()
            )));
        }
        Ok(())
    }

    async fn disassociate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        let url = self.participants_url(key)?;
        let body = FspIdPayload {
            fsp_id: fsp_id.as_str().to_string(),
        };
        let response = self.http.delete(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Error::RemoteOracle(format!(
                "disassociate for party '{}' returned {}",
                key.party_id,
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>> {
        Err(Self::unsupported("get_all_associations"))
    }

    async fn search_associations(
        &self,
        _filter: &AssociationFilter,
        _page: Page,
    ) -> Result<AssociationPage> {
        Err(Self::unsupported("search_associations"))
    }

    async fn search_keywords(&self) -> Result<Vec<SearchKeyword>> {
        Err(Self::unsupported("search_keywords"))
    }
}
