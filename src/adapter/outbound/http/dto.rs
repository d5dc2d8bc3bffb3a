//! Wire DTOs for the remote oracle REST surface.

use serde::{Deserialize, Serialize};

/// Body of lookup responses and association requests: the FSP said to own
/// the party address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FspIdPayload {
    pub fsp_id: String,
}
