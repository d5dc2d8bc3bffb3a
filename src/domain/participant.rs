//! Participant directory records, as returned by the platform's
//! participant service.

use serde::{Deserialize, Serialize};

use crate::domain::ids::FspId;

/// Directory entry for one financial service provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: FspId,
    /// Directory-defined classification (e.g. `DFSP`, `HUB`).
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
}

impl Participant {
    pub fn new(id: impl Into<FspId>, kind: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_wire_shape() {
        let p = Participant::new("fsp1", "DFSP", true);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "fsp1");
        assert_eq!(json["type"], "DFSP");
        assert_eq!(json["isActive"], true);
    }
}
