//! Participant directory port: identity and liveness checks against the
//! platform's participant service.

use async_trait::async_trait;

use crate::domain::ids::FspId;
use crate::domain::participant::Participant;
use crate::error::Result;

/// Read-only view of the participant directory.
///
/// The aggregate only ever checks existence, id agreement and the active
/// flag; everything else about participants stays in the directory.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Fetch one participant record, `None` when the directory has no
    /// entry for the id.
    async fn get_participant_info(&self, fsp_id: &FspId) -> Result<Option<Participant>>;
}
