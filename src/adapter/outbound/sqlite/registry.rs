//! SQLite oracle registry implementation.
//!
//! Persistent storage for oracle routing entries using SQLite and Diesel
//! ORM. Uniqueness of the name and of the `(party_type, currency)` pair
//! is enforced by unique indexes rather than read-then-write checks.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use tracing::debug;

use crate::adapter::outbound::sqlite::connection::{
    configure_sqlite_connection, run_migrations, DbConnection, DbPool,
};
use crate::adapter::outbound::sqlite::model::{to_column, OracleRow};
use crate::adapter::outbound::sqlite::schema::oracles;
use crate::domain::error::DomainError;
use crate::domain::ids::{Currency, OracleId, PartyType};
use crate::domain::oracle::{CreateOracle, Oracle};
use crate::error::{Error, Result};
use crate::port::oracle_registry::OracleRegistry;

/// SQLite-backed oracle registry.
pub struct SqliteOracleRegistry {
    /// Database connection pool, shared with builtin providers.
    pool: DbPool,
}

impl SqliteOracleRegistry {
    /// Create a new registry over the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl OracleRegistry for SqliteOracleRegistry {
    async fn init(&self) -> Result<()> {
        run_migrations(&self.pool)?;
        let mut conn = self.conn()?;
        configure_sqlite_connection(&mut conn)?;
        debug!("oracle registry ready");
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        // Connections close when the pool is dropped.
        debug!("oracle registry shut down");
        Ok(())
    }

    async fn add_oracle(&self, input: CreateOracle) -> Result<Oracle> {
        let oracle = input.into_oracle();
        let row = OracleRow::from_oracle(&oracle);
        let mut conn = self.conn()?;

        match diesel::insert_into(oracles::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => Ok(oracle),
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                Err(DomainError::DuplicateOracle {
                    reason: info.message().to_string(),
                }
                .into())
            }
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    async fn remove_oracle(&self, id: &OracleId) -> Result<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(oracles::table.find(id.as_str()))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        if deleted == 0 {
            return Err(DomainError::OracleNotFound {
                oracle_id: id.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn get_all_oracles(&self) -> Result<Vec<Oracle>> {
        let mut conn = self.conn()?;
        let rows: Vec<OracleRow> = oracles::table
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(OracleRow::into_oracle).collect()
    }

    async fn get_oracle_by_id(&self, id: &OracleId) -> Result<Option<Oracle>> {
        let mut conn = self.conn()?;
        let row: Option<OracleRow> = oracles::table
            .find(id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(OracleRow::into_oracle).transpose()
    }

    async fn get_oracle_by_name(&self, name: &str) -> Result<Option<Oracle>> {
        let mut conn = self.conn()?;
        let row: Option<OracleRow> = oracles::table
            .filter(oracles::name.eq(name))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(OracleRow::into_oracle).transpose()
    }

    async fn get_oracle(
        &self,
        party_type: &PartyType,
        currency: Option<&Currency>,
    ) -> Result<Option<Oracle>> {
        let currency_col = to_column(currency.map(Currency::as_str));
        let mut conn = self.conn()?;

        let rows: Vec<OracleRow> = oracles::table
            .filter(oracles::party_type.eq(party_type.as_str()))
            .filter(oracles::currency.eq_any([currency_col.as_str(), ""]))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        // Currency-specific entry wins over the catch-all one.
        let mut exact = None;
        let mut catch_all = None;
        for row in rows {
            if !currency_col.is_empty() && row.currency == currency_col {
                exact = Some(row);
            } else if row.currency.is_empty() {
                catch_all = Some(row);
            }
        }
        exact
            .or(catch_all)
            .map(OracleRow::into_oracle)
            .transpose()
    }
}
