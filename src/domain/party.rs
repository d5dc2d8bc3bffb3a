//! Party addressing: the tuple every lookup, association and cache entry
//! keys on.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{Currency, PartyId, PartyType};

/// Fully qualified party address.
///
/// Sub type and currency are optional refinements; two keys differing only
/// in an absent-vs-present refinement are distinct addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyKey {
    pub party_type: PartyType,
    pub party_id: PartyId,
    pub party_sub_type: Option<String>,
    pub currency: Option<Currency>,
}

impl PartyKey {
    pub fn new(party_type: impl Into<PartyType>, party_id: impl Into<PartyId>) -> Self {
        Self {
            party_type: party_type.into(),
            party_id: party_id.into(),
            party_sub_type: None,
            currency: None,
        }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.party_sub_type = Some(sub_type.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<Currency>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// One entry of a synchronous account-lookup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLookup {
    pub party_id: PartyId,
    pub party_type: PartyType,
    #[serde(default)]
    pub currency: Option<Currency>,
}
