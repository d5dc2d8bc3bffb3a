//! Oracle registry port: durable storage and resolution of oracle
//! routing entries.

use async_trait::async_trait;

use crate::domain::ids::{Currency, OracleId, PartyType};
use crate::domain::oracle::{CreateOracle, Oracle};
use crate::error::Result;

/// Store of registered oracles, keyed for resolution by party type and
/// currency.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Uniqueness of name and of the `(party_type, currency)` pair is the
///   store's job; violations surface as `DomainError::DuplicateOracle`
#[async_trait]
pub trait OracleRegistry: Send + Sync {
    /// Prepare the registry for use (connections, schema).
    async fn init(&self) -> Result<()>;

    /// Release registry resources.
    async fn destroy(&self) -> Result<()>;

    /// Persist a new oracle, minting an id when the input has none.
    async fn add_oracle(&self, input: CreateOracle) -> Result<Oracle>;

    /// Delete an oracle. Fails with `DomainError::OracleNotFound` when no
    /// record matches.
    async fn remove_oracle(&self, id: &OracleId) -> Result<()>;

    async fn get_all_oracles(&self) -> Result<Vec<Oracle>>;

    async fn get_oracle_by_id(&self, id: &OracleId) -> Result<Option<Oracle>>;

    async fn get_oracle_by_name(&self, name: &str) -> Result<Option<Oracle>>;

    /// Resolve the oracle responsible for a party type and currency.
    ///
    /// A currency-specific entry wins; otherwise the catch-all entry for
    /// the party type (stored without currency) is returned.
    async fn get_oracle(
        &self,
        party_type: &PartyType,
        currency: Option<&Currency>,
    ) -> Result<Option<Oracle>>;
}
