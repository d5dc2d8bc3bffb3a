//! Scripted external collaborators: participant directory and event
//! publisher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::domain::ids::FspId;
use crate::domain::message::OutboundMessage;
use crate::domain::participant::Participant;
use crate::error::{Error, Result};
use crate::port::participants::ParticipantDirectory;
use crate::port::publisher::EventPublisher;

// ---------------------------------------------------------------------------
// StaticParticipantDirectory
// ---------------------------------------------------------------------------

/// Directory fake answering from a fixed table.
///
/// `with_entry` scripts pathological directories, e.g. one returning a
/// record whose id disagrees with the query.
#[derive(Clone, Default)]
pub struct StaticParticipantDirectory {
    entries: Arc<RwLock<HashMap<FspId, Participant>>>,
    failing: Arc<AtomicBool>,
}

impl StaticParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active participant.
    pub fn with_active(self, fsp_id: &str) -> Self {
        self.entries.write().insert(
            FspId::new(fsp_id),
            Participant::new(fsp_id, "DFSP", true),
        );
        self
    }

    /// Register an inactive participant.
    pub fn with_inactive(self, fsp_id: &str) -> Self {
        self.entries.write().insert(
            FspId::new(fsp_id),
            Participant::new(fsp_id, "DFSP", false),
        );
        self
    }

    /// Register an arbitrary record under `fsp_id`, which may disagree
    /// with the record's own id.
    pub fn with_entry(self, fsp_id: &str, participant: Participant) -> Self {
        self.entries.write().insert(FspId::new(fsp_id), participant);
        self
    }

    /// When set, every call fails with a scripted infrastructure error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParticipantDirectory for StaticParticipantDirectory {
    async fn get_participant_info(&self, fsp_id: &FspId) -> Result<Option<Participant>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Connection("scripted directory failure".to_string()));
        }
        Ok(self.entries.read().get(fsp_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisher
// ---------------------------------------------------------------------------

/// Publisher fake recording every outbound envelope.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    /// The most recent envelope.
    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    /// When set, publishing fails with a scripted transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Publish("scripted publish failure".to_string()));
        }
        self.sent.lock().push(message);
        Ok(())
    }
}
