//! Thread-safe TTL cache for resolved party-to-FSP associations.
//!
//! Only positive lookups are cached; a miss always goes back to storage,
//! and writers invalidate the touched key so admins never read a stale
//! claim after an associate/disassociate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::domain::ids::FspId;
use crate::domain::party::PartyKey;

struct CacheEntry {
    fsp_id: FspId,
    cached_at: Instant,
}

/// Thread-safe cache of party address to FSP id resolutions.
pub struct AssociationCache {
    entries: RwLock<HashMap<PartyKey, CacheEntry>>,
    ttl: Duration,
}

impl AssociationCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a live entry; expired entries are evicted on the way out.
    #[must_use]
    pub fn get(&self, key: &PartyKey) -> Option<FspId> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.cached_at.elapsed() < self.ttl => {
                    return Some(entry.fsp_id.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(key);
        }
        None
    }

    /// Record a positive resolution.
    pub fn insert(&self, key: PartyKey, fsp_id: FspId) {
        self.entries.write().insert(
            key,
            CacheEntry {
                fsp_id,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop one key, typically after the association changed underneath.
    pub fn invalidate(&self, key: &PartyKey) {
        self.entries.write().remove(key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
