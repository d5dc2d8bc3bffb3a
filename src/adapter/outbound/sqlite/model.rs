//! Database model types for Diesel ORM.
//!
//! Optional key columns (`currency`, `party_sub_type`) are stored as `''`
//! instead of NULL so the unique indexes compare them; the conversions
//! here normalize in both directions.

use std::str::FromStr;

use chrono::Utc;
use diesel::prelude::*;

use super::schema::{associations, oracles};
use crate::domain::association::Association;
use crate::domain::ids::{Currency, FspId, OracleId, PartyId, PartyType};
use crate::domain::oracle::{Oracle, OracleType};
use crate::domain::party::PartyKey;
use crate::error::{Error, Result};

/// Database row for an oracle.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = oracles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OracleRow {
    pub id: String,
    pub name: String,
    pub oracle_type: String,
    pub party_type: String,
    pub currency: String,
    pub endpoint: Option<String>,
    pub created_at: String,
}

impl OracleRow {
    pub fn from_oracle(oracle: &Oracle) -> Self {
        Self {
            id: oracle.id.as_str().to_string(),
            name: oracle.name.clone(),
            oracle_type: oracle.oracle_type.as_str().to_string(),
            party_type: oracle.party_type.as_str().to_string(),
            currency: to_column(oracle.currency.as_ref().map(Currency::as_str)),
            endpoint: oracle.endpoint.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the domain record. Fails when the stored type string is
    /// not a supported oracle kind.
    pub fn into_oracle(self) -> Result<Oracle> {
        let oracle_type = OracleType::from_str(&self.oracle_type).map_err(Error::Domain)?;
        Ok(Oracle {
            id: OracleId::new(self.id),
            name: self.name,
            oracle_type,
            party_type: PartyType::new(self.party_type),
            currency: from_column(self.currency).map(Currency::new),
            endpoint: self.endpoint,
        })
    }
}

/// Database row for an association (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = associations)]
pub struct NewAssociationRow {
    pub fsp_id: String,
    pub party_type: String,
    pub party_id: String,
    pub party_sub_type: String,
    pub currency: String,
    pub created_at: String,
}

impl NewAssociationRow {
    pub fn from_parts(fsp_id: &FspId, key: &PartyKey) -> Self {
        Self {
            fsp_id: fsp_id.as_str().to_string(),
            party_type: key.party_type.as_str().to_string(),
            party_id: key.party_id.as_str().to_string(),
            party_sub_type: to_column(key.party_sub_type.as_deref()),
            currency: to_column(key.currency.as_ref().map(Currency::as_str)),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Database row for an association (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = associations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssociationRow {
    pub id: i32,
    pub fsp_id: String,
    pub party_type: String,
    pub party_id: String,
    pub party_sub_type: String,
    pub currency: String,
    pub created_at: String,
}

impl From<AssociationRow> for Association {
    fn from(row: AssociationRow) -> Self {
        Association {
            fsp_id: FspId::new(row.fsp_id),
            party_type: PartyType::new(row.party_type),
            party_id: PartyId::new(row.party_id),
            party_sub_type: from_column(row.party_sub_type),
            currency: from_column(row.currency).map(Currency::new),
        }
    }
}

/// Column form of an optional key field.
pub fn to_column(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Domain form of an optional key column.
pub fn from_column(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
