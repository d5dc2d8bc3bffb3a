//! Party-to-FSP associations held by builtin oracles, plus the filter and
//! paging types the admin search surface uses.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{Currency, FspId, PartyId, PartyType};
use crate::domain::party::PartyKey;

/// A stored claim that `fsp_id` owns the party address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub fsp_id: FspId,
    pub party_type: PartyType,
    pub party_id: PartyId,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl Association {
    pub fn key(&self) -> PartyKey {
        PartyKey {
            party_type: self.party_type.clone(),
            party_id: self.party_id.clone(),
            party_sub_type: self.party_sub_type.clone(),
            currency: self.currency.clone(),
        }
    }
}

/// Conjunctive search filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationFilter {
    #[serde(default)]
    pub fsp_id: Option<FspId>,
    #[serde(default)]
    pub party_type: Option<PartyType>,
    #[serde(default)]
    pub party_id: Option<PartyId>,
    #[serde(default)]
    pub party_sub_type: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl AssociationFilter {
    pub fn matches(&self, association: &Association) -> bool {
        self.fsp_id
            .as_ref()
            .map_or(true, |v| *v == association.fsp_id)
            && self
                .party_type
                .as_ref()
                .map_or(true, |v| *v == association.party_type)
            && self
                .party_id
                .as_ref()
                .map_or(true, |v| *v == association.party_id)
            && self
                .party_sub_type
                .as_ref()
                .map_or(true, |v| Some(v) == association.party_sub_type.as_ref())
            && self
                .currency
                .as_ref()
                .map_or(true, |v| Some(v) == association.currency.as_ref())
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One-based page request. Sizes are clamped to [1, MAX_PAGE_SIZE].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Index of the first record on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of association search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationPage {
    pub items: Vec<Association>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Distinct values seen for one searchable field, driving admin search
/// autocompletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchKeyword {
    pub field_name: String,
    pub distinct_terms: Vec<String>,
}
