//! Per-connection friendship cache
//!
//! Remembers the answer to "are these two users friends" for a short time so
//! a burst of sends does not hit the store once per message. Entries are
//! keyed by the unordered pair and expire after the configured TTL.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::shared::messaging::ParticipantPair;

#[derive(Debug)]
pub struct FriendshipCache {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<ParticipantPair, (bool, Instant)>,
}

impl FriendshipCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Fresh cached answer for the pair, if any
    pub fn get(&mut self, pair: &ParticipantPair) -> Option<bool> {
        let (friends, inserted_at) = *self.entries.get(pair)?;
        if inserted_at.elapsed() < self.ttl {
            return Some(friends);
        }
        self.entries.remove(pair);
        None
    }

    pub fn insert(&mut self, pair: ParticipantPair, friends: bool) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&pair) {
            self.evict();
        }
        self.entries.insert(pair, (friends, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, then the oldest one if still full
    fn evict(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, at)| at.elapsed() < ttl);
        if self.entries.len() < self.capacity {
            return;
        }
        if let Some(oldest) = self
            .entries
            .iter()
            .min_by_key(|(_, (_, at))| *at)
            .map(|(pair, _)| *pair)
        {
            self.entries.remove(&oldest);
        }
    }
}
