//! A short-lived cache of booth rosters.
//!
//! Drilling into several households of the same booth should not refetch the
//! roster each time. Entries are kept for a fixed window and are not
//! invalidated on writes: callers that modify voters should call `invalidate`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use log::debug;

use crate::config::*;
use crate::roster::{fetch_full_roster, RosterSource};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(PartialEq, Debug, Clone)]
pub struct CachedRoster {
    pub data: Vec<VoterRecord>,
    pub fetched_at: SystemTime,
}

impl CachedRoster {
    /// An entry is stale once `ttl` has elapsed. A clock going backwards
    /// does not make an entry stale.
    pub fn is_stale(&self, now: SystemTime, ttl: Duration) -> bool {
        match now.duration_since(self.fetched_at) {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RosterCache {
    ttl: Duration,
    entries: HashMap<String, CachedRoster>,
}

impl Default for RosterCache {
    fn default() -> Self {
        RosterCache::new(DEFAULT_TTL)
    }
}

impl RosterCache {
    pub fn new(ttl: Duration) -> RosterCache {
        RosterCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the roster of a booth if it is still fresh.
    pub fn get(&self, booth_id: &str, now: SystemTime) -> Option<&[VoterRecord]> {
        self.entries
            .get(booth_id)
            .filter(|e| !e.is_stale(now, self.ttl))
            .map(|e| e.data.as_slice())
    }

    pub fn insert(&mut self, booth_id: &str, data: Vec<VoterRecord>, now: SystemTime) {
        self.entries.insert(
            booth_id.to_string(),
            CachedRoster {
                data,
                fetched_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, booth_id: &str) {
        self.entries.remove(booth_id);
    }

    /// Drops all the stale entries.
    pub fn evict_stale(&mut self, now: SystemTime) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| !e.is_stale(now, ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached roster, or fetches and caches it if missing or stale.
    /// A miss also drops the stale entries of the other booths.
    pub fn get_or_fetch<S: RosterSource + ?Sized>(
        &mut self,
        source: &mut S,
        booth_id: &str,
        now: SystemTime,
    ) -> Result<&[VoterRecord], RosterError> {
        let fresh = self.get(booth_id, now).is_some();
        if !fresh {
            debug!("RosterCache: miss for booth {}", booth_id);
            self.evict_stale(now);
            let roster = fetch_full_roster(source, booth_id)?;
            self.insert(booth_id, roster.voters, now);
        } else {
            debug!("RosterCache: hit for booth {}", booth_id);
        }
        Ok(self
            .entries
            .get(booth_id)
            .map(|e| e.data.as_slice())
            .unwrap_or(&[]))
    }
}
