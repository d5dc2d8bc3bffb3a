//! Builtin oracle provider: association storage owned by this service.
//!
//! Builtin oracles require no external party; their associations live in
//! the local database, scoped per provider by the oracle's party type
//! (and currency, when the oracle is currency-specific). Tuple uniqueness
//! is enforced by the unique index, not by read-then-write checks.

use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::Sqlite;
use tracing::debug;

use crate::adapter::outbound::sqlite::cache::AssociationCache;
use crate::adapter::outbound::sqlite::connection::{
    configure_sqlite_connection, DbConnection, DbPool,
};
use crate::adapter::outbound::sqlite::model::{to_column, AssociationRow, NewAssociationRow};
use crate::adapter::outbound::sqlite::schema::associations;
use crate::domain::association::{
    Association, AssociationFilter, AssociationPage, Page, SearchKeyword,
};
use crate::domain::error::DomainError;
use crate::domain::ids::{Currency, FspId, OracleId, PartyType};
use crate::domain::party::PartyKey;
use crate::error::{Error, Result};
use crate::port::oracle_provider::OracleProvider;

/// Database-backed oracle provider.
pub struct BuiltinOracleProvider {
    oracle_id: OracleId,
    party_type: PartyType,
    currency: Option<Currency>,
    pool: DbPool,
    cache: Option<AssociationCache>,
}

impl BuiltinOracleProvider {
    /// Create a provider without a cache.
    #[must_use]
    pub fn new(
        oracle_id: OracleId,
        party_type: PartyType,
        currency: Option<Currency>,
        pool: DbPool,
    ) -> Self {
        Self {
            oracle_id,
            party_type,
            currency,
            pool,
            cache: None,
        }
    }

    /// Enable the positive-lookup TTL cache.
    #[must_use]
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(AssociationCache::new(ttl));
        self
    }

    fn conn(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    /// Query over the slice of the associations table this oracle owns.
    fn scoped(&self) -> associations::BoxedQuery<'static, Sqlite> {
        let mut query = associations::table
            .filter(associations::party_type.eq(self.party_type.as_str().to_string()))
            .into_boxed();
        if let Some(currency) = &self.currency {
            query = query.filter(associations::currency.eq(currency.as_str().to_string()));
        }
        query
    }

    fn filtered(&self, filter: &AssociationFilter) -> associations::BoxedQuery<'static, Sqlite> {
        let mut query = self.scoped();
        if let Some(fsp_id) = &filter.fsp_id {
            query = query.filter(associations::fsp_id.eq(fsp_id.as_str().to_string()));
        }
        if let Some(party_type) = &filter.party_type {
            query = query.filter(associations::party_type.eq(party_type.as_str().to_string()));
        }
        if let Some(party_id) = &filter.party_id {
            query = query.filter(associations::party_id.eq(party_id.as_str().to_string()));
        }
        if let Some(sub_type) = &filter.party_sub_type {
            query = query.filter(associations::party_sub_type.eq(sub_type.clone()));
        }
        if let Some(currency) = &filter.currency {
            query = query.filter(associations::currency.eq(currency.as_str().to_string()));
        }
        query
    }

    fn distinct_terms(rows: Vec<String>) -> Vec<String> {
        let mut terms: Vec<String> = rows.into_iter().filter(|t| !t.is_empty()).collect();
        terms.sort();
        terms.dedup();
        terms
    }
}

#[async_trait]
impl OracleProvider for BuiltinOracleProvider {
    fn oracle_id(&self) -> &OracleId {
        &self.oracle_id
    }

    fn party_type(&self) -> &PartyType {
        &self.party_type
    }

    async fn init(&self) -> Result<()> {
        let mut conn = self.conn()?;
        configure_sqlite_connection(&mut conn)?;
        debug!(oracle_id = %self.oracle_id, party_type = %self.party_type, "builtin oracle ready");
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        debug!(oracle_id = %self.oracle_id, "builtin oracle shut down");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(mut conn) = self.pool.get() else {
            return Ok(false);
        };
        Ok(diesel::sql_query("SELECT 1").execute(&mut conn).is_ok())
    }

    async fn get_participant_fsp_id(&self, key: &PartyKey) -> Result<Option<FspId>> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(key) {
                return Ok(Some(hit));
            }
        }

        let mut conn = self.conn()?;
        let fsp_id: Option<String> = associations::table
            .filter(associations::party_type.eq(key.party_type.as_str()))
            .filter(associations::party_id.eq(key.party_id.as_str()))
            .filter(associations::party_sub_type.eq(to_column(key.party_sub_type.as_deref())))
            .filter(associations::currency.eq(to_column(key.currency.as_ref().map(Currency::as_str))))
            .select(associations::fsp_id)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        let fsp_id = fsp_id.map(FspId::new);
        if let (Some(cache), Some(found)) = (&self.cache, &fsp_id) {
            cache.insert(key.clone(), found.clone());
        }
        Ok(fsp_id)
    }

    async fn associate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        let row = NewAssociationRow::from_parts(fsp_id, key);
        let mut conn = self.conn()?;

        match diesel::insert_into(associations::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(DomainError::AssociationExists {
                    party_id: key.party_id.clone(),
                }
                .into());
            }
            Err(e) => return Err(Error::Database(e.to_string())),
        }

        if let Some(cache) = &self.cache {
            cache.invalidate(key);
        }
        debug!(
            oracle_id = %self.oracle_id,
            fsp_id = %fsp_id,
            party_id = %key.party_id,
            "participant associated"
        );
        Ok(())
    }

    async fn disassociate_participant(&self, fsp_id: &FspId, key: &PartyKey) -> Result<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            associations::table
                .filter(associations::fsp_id.eq(fsp_id.as_str()))
                .filter(associations::party_type.eq(key.party_type.as_str()))
                .filter(associations::party_id.eq(key.party_id.as_str()))
                .filter(associations::party_sub_type.eq(to_column(key.party_sub_type.as_deref())))
                .filter(
                    associations::currency.eq(to_column(key.currency.as_ref().map(Currency::as_str))),
                ),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        if deleted == 0 {
            return Err(DomainError::AssociationNotFound {
                party_id: key.party_id.clone(),
            }
            .into());
        }

        if let Some(cache) = &self.cache {
            cache.invalidate(key);
        }
        debug!(
            oracle_id = %self.oracle_id,
            fsp_id = %fsp_id,
            party_id = %key.party_id,
            "participant disassociated"
        );
        Ok(())
    }

    async fn get_all_associations(&self) -> Result<Vec<Association>> {
        let mut conn = self.conn()?;
        let rows: Vec<AssociationRow> = self
            .scoped()
            .order(associations::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(Association::from).collect())
    }

    async fn search_associations(
        &self,
        filter: &AssociationFilter,
        page: Page,
    ) -> Result<AssociationPage> {
        let mut conn = self.conn()?;

        let total: i64 = self
            .filtered(filter)
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        let rows: Vec<AssociationRow> = self
            .filtered(filter)
            .order(associations::id.asc())
            .limit(i64::from(page.size))
            .offset(page.offset() as i64)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(AssociationPage {
            items: rows.into_iter().map(Association::from).collect(),
            page: page.number,
            page_size: page.size,
            total: total as u64,
        })
    }

    async fn search_keywords(&self) -> Result<Vec<SearchKeyword>> {
        let mut conn = self.conn()?;

        let fsp_ids: Vec<String> = self
            .scoped()
            .select(associations::fsp_id)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let party_types: Vec<String> = self
            .scoped()
            .select(associations::party_type)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let sub_types: Vec<String> = self
            .scoped()
            .select(associations::party_sub_type)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let currencies: Vec<String> = self
            .scoped()
            .select(associations::currency)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(vec![
            SearchKeyword {
                field_name: "fspId".to_string(),
                distinct_terms: Self::distinct_terms(fsp_ids),
            },
            SearchKeyword {
                field_name: "partyType".to_string(),
                distinct_terms: Self::distinct_terms(party_types),
            },
            SearchKeyword {
                field_name: "partySubType".to_string(),
                distinct_terms: Self::distinct_terms(sub_types),
            },
            SearchKeyword {
                field_name: "currency".to_string(),
                distinct_terms: Self::distinct_terms(currencies),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::connection::{create_pool, run_migrations, test_pool};

    fn provider(pool: &DbPool) -> BuiltinOracleProvider {
        BuiltinOracleProvider::new(
            OracleId::new("oracle-1"),
            PartyType::new("MSISDN"),
            None,
            pool.clone(),
        )
    }

    fn key(party_id: &str) -> PartyKey {
        PartyKey::new("MSISDN", party_id)
    }

    #[tokio::test]
    async fn associate_then_lookup() {
        let pool = test_pool();
        let provider = provider(&pool);

        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();

        let found = provider.get_participant_fsp_id(&key("party1")).await.unwrap();
        assert_eq!(found, Some(FspId::new("fsp1")));

        let missing = provider.get_participant_fsp_id(&key("party2")).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn occupied_address_rejects_second_claim() {
        let pool = test_pool();
        let provider = provider(&pool);
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();

        let err = provider
            .associate_participant(&FspId::new("fsp2"), &key("party1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::AssociationExists { party_id }) if party_id.as_str() == "party1"
        ));
    }

    #[tokio::test]
    async fn refined_addresses_are_distinct() {
        let pool = test_pool();
        let provider = provider(&pool);
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        provider
            .associate_participant(&FspId::new("fsp2"), &key("party1").with_currency("USD"))
            .await
            .unwrap();

        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            Some(FspId::new("fsp1"))
        );
        assert_eq!(
            provider
                .get_participant_fsp_id(&key("party1").with_currency("USD"))
                .await
                .unwrap(),
            Some(FspId::new("fsp2"))
        );
    }

    #[tokio::test]
    async fn disassociate_requires_existing_claim() {
        let pool = test_pool();
        let provider = provider(&pool);

        let err = provider
            .disassociate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::AssociationNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn disassociate_checks_the_claiming_fsp() {
        let pool = test_pool();
        let provider = provider(&pool);
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();

        let err = provider
            .disassociate_participant(&FspId::new("other"), &key("party1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::AssociationNotFound { .. })
        ));

        provider
            .disassociate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_oracle() {
        let pool = test_pool();
        let msisdn = provider(&pool);
        let email = BuiltinOracleProvider::new(
            OracleId::new("oracle-2"),
            PartyType::new("EMAIL"),
            None,
            pool.clone(),
        );

        msisdn
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        email
            .associate_participant(&FspId::new("fsp2"), &PartyKey::new("EMAIL", "a@b.c"))
            .await
            .unwrap();

        let mine = msisdn.get_all_associations().await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].party_type, PartyType::new("MSISDN"));

        let theirs = email.get_all_associations().await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].party_id.as_str(), "a@b.c");
    }

    #[tokio::test]
    async fn currency_specific_oracle_sees_only_its_currency() {
        let pool = test_pool();
        let catch_all = provider(&pool);
        let usd = BuiltinOracleProvider::new(
            OracleId::new("oracle-usd"),
            PartyType::new("MSISDN"),
            Some(Currency::new("USD")),
            pool.clone(),
        );

        catch_all
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        usd.associate_participant(&FspId::new("fsp2"), &key("party2").with_currency("USD"))
            .await
            .unwrap();

        let scoped = usd.get_all_associations().await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].party_id.as_str(), "party2");

        // The catch-all oracle owns the whole party type.
        assert_eq!(catch_all.get_all_associations().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_filters_and_pages() {
        let pool = test_pool();
        let provider = provider(&pool);
        for i in 0..5 {
            let fsp = if i % 2 == 0 { "fsp-even" } else { "fsp-odd" };
            provider
                .associate_participant(&FspId::new(fsp), &key(&format!("party{i}")))
                .await
                .unwrap();
        }

        let filter = AssociationFilter {
            fsp_id: Some(FspId::new("fsp-even")),
            ..Default::default()
        };
        let page = provider
            .search_associations(&filter, Page::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 2);

        let rest = provider
            .search_associations(&filter, Page::new(2, 2))
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.total, 3);
    }

    #[tokio::test]
    async fn search_keywords_lists_distinct_terms() {
        let pool = test_pool();
        let provider = provider(&pool);
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party2").with_currency("USD"))
            .await
            .unwrap();
        provider
            .associate_participant(&FspId::new("fsp2"), &key("party3").with_currency("USD"))
            .await
            .unwrap();

        let keywords = provider.search_keywords().await.unwrap();
        let by_field = |name: &str| {
            keywords
                .iter()
                .find(|k| k.field_name == name)
                .map(|k| k.distinct_terms.clone())
                .unwrap()
        };
        assert_eq!(by_field("fspId"), vec!["fsp1", "fsp2"]);
        assert_eq!(by_field("partyType"), vec!["MSISDN"]);
        // Empty markers never leak out as terms.
        assert_eq!(by_field("partySubType"), Vec::<String>::new());
        assert_eq!(by_field("currency"), vec!["USD"]);
    }

    #[tokio::test]
    async fn cache_serves_stale_until_invalidated() {
        let pool = test_pool();
        let provider = provider(&pool).with_cache(Duration::from_secs(60));
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();

        // Prime the cache.
        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            Some(FspId::new("fsp1"))
        );

        // Delete behind the provider's back; the cached claim survives.
        let mut conn = pool.get().unwrap();
        diesel::delete(associations::table).execute(&mut conn).unwrap();
        drop(conn);
        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            Some(FspId::new("fsp1"))
        );
    }

    #[tokio::test]
    async fn writes_invalidate_the_cached_key() {
        let pool = test_pool();
        let provider = provider(&pool).with_cache(Duration::from_secs(60));
        provider
            .associate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        assert!(provider
            .get_participant_fsp_id(&key("party1"))
            .await
            .unwrap()
            .is_some());

        provider
            .disassociate_participant(&FspId::new("fsp1"), &key("party1"))
            .await
            .unwrap();
        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn associations_survive_reconnects() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        {
            let pool = create_pool(&path).unwrap();
            run_migrations(&pool).unwrap();
            let provider = provider(&pool);
            provider
                .associate_participant(&FspId::new("fsp1"), &key("party1"))
                .await
                .unwrap();
        }

        let pool = create_pool(&path).unwrap();
        run_migrations(&pool).unwrap();
        let provider = provider(&pool);
        assert_eq!(
            provider.get_participant_fsp_id(&key("party1")).await.unwrap(),
            Some(FspId::new("fsp1"))
        );
    }
}
