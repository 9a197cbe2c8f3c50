//! Pair-list cache: in memory, persisted to disk as JSON.
//!
//! Disk entries survive restarts and act as a stale fallback when an
//! exchange cannot be reached.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::types::Exchange;

/// Cached pair list with the time it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PairsEntry {
    pairs: Vec<String>,
    /// Unix seconds.
    timestamp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Per-exchange pair lists with expiry.
pub struct PairsCache {
    cache_dir: PathBuf,
    ttl: Duration,
    memory: DashMap<Exchange, PairsEntry>,
}

impl PairsCache {
    /// Create a cache rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                warn!("Failed to create pairs cache directory: {}", e);
            }
        }
        Self {
            cache_dir,
            ttl,
            memory: DashMap::new(),
        }
    }

    fn path(&self, exchange: Exchange) -> PathBuf {
        self.cache_dir.join(format!("{}_pairs.json", exchange.as_str()))
    }

    fn is_fresh(&self, entry: &PairsEntry) -> bool {
        now_secs().saturating_sub(entry.timestamp) <= self.ttl.as_secs()
    }

    fn load_disk(&self, exchange: Exchange) -> Option<PairsEntry> {
        let content = fs::read_to_string(self.path(exchange)).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to parse pairs cache for {}: {}", exchange, e);
                None
            }
        }
    }

    /// Unexpired pairs, from memory first and then disk.
    pub fn get(&self, exchange: Exchange) -> Option<Vec<String>> {
        if let Some(entry) = self.memory.get(&exchange) {
            if self.is_fresh(&entry) {
                return Some(entry.pairs.clone());
            }
        }

        let entry = self.load_disk(exchange)?;
        if !self.is_fresh(&entry) {
            debug!("Pairs cache for {} expired", exchange);
            return None;
        }
        debug!("Loaded {} {} pairs from disk", entry.pairs.len(), exchange);
        let pairs = entry.pairs.clone();
        self.memory.insert(exchange, entry);
        Some(pairs)
    }

    /// Pairs regardless of age (fallback when the exchange is unreachable).
    pub fn get_stale(&self, exchange: Exchange) -> Option<Vec<String>> {
        if let Some(entry) = self.memory.get(&exchange) {
            return Some(entry.pairs.clone());
        }
        let entry = self.load_disk(exchange)?;
        debug!("Using stale pairs cache for {}", exchange);
        Some(entry.pairs)
    }

    /// Store a freshly fetched list in memory and on disk.
    pub fn set(&self, exchange: Exchange, pairs: &[String]) {
        let entry = PairsEntry {
            pairs: pairs.to_vec(),
            timestamp: now_secs(),
        };

        match serde_json::to_string(&entry) {
            Ok(content) => {
                if let Err(e) = fs::write(self.path(exchange), content) {
                    warn!("Failed to write pairs cache for {}: {}", exchange, e);
                } else {
                    debug!("Cached {} {} pairs to disk", pairs.len(), exchange);
                }
            }
            Err(e) => warn!("Failed to serialize pairs cache for {}: {}", exchange, e),
        }

        self.memory.insert(exchange, entry);
    }
}
