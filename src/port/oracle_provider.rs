//! Oracle provider port: the uniform surface the aggregate drives,
//! whatever kind of oracle sits behind it.

use async_trait::async_trait;

use crate::domain::association::{Association, AssociationFilter, AssociationPage, Page, SearchKeyword};
use crate::domain::ids::{FspId, OracleId, PartyType};
use crate::domain::party::PartyKey;
use crate::error::Result;

/// One live oracle. Builtin providers own local association storage;
/// remote providers delegate every call to an external service.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Admin listing/search calls are optional: kinds that cannot serve
///   them fail with `DomainError::UnsupportedOperation`
#[async_trait]
pub trait OracleProvider: Send + Sync {
    /// Id of the oracle record this provider serves.
    fn oracle_id(&self) -> &OracleId;

    /// Party type this provider is registered for.
    fn party_type(&self) -> &PartyType;

    /// Prepare the provider for use.
    async fn init(&self) -> Result<()>;

    /// Release provider resources.
    async fn destroy(&self) -> Result<()>;

    /// Probe liveness. `Ok(false)` means the backend answered unhealthy
    /// or not at all.
    async fn health_check(&self) -> Result<bool>;

    /// Look up the FSP currently associated with a party address.
    async fn get_participant_fsp_id(&self, key: &PartyKey) -> Result<Option<FspId>>;

    /// Record that `fsp_id` owns the party address. Occupied addresses
    /// fail with `DomainError::AssociationExists`.
    async fn associate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()>;

    /// Drop the claim on a party address. Unknown addresses fail with
    /// `DomainError::AssociationNotFound`.
    async fn disassociate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()>;

    /// Every association this provider holds.
    async fn get_all_associations(&self) -> Result<Vec<Association>>;

    /// Filtered, paged association search.
    async fn search_associations(
        &self,
        filter: &AssociationFilter,
        page: Page,
    ) -> Result<AssociationPage>;

    /// Distinct values per searchable field, for admin autocompletion.
    async fn search_keywords(&self) -> Result<Vec<SearchKeyword>>;
}

impl std::fmt::Debug for dyn OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleProvider")
            .field("oracle_id", self.oracle_id())
            .field("party_type", self.party_type())
            .finish_non_exhaustive()
    }
}
