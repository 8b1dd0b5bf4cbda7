//! Bounded in-memory cache of resolved records.
//!
//! Grounded on the source's `memorycache` package: an `RwLock`-guarded map
//! plus a deadline-sorted index, cost-accounted at a flat 50 bytes per
//! entry, with a background sweep evicting expired entries and a read path
//! that answers every hit with the same synthetic `base_ttl` rather than
//! the residual time left on the entry. That last part looks like a bug on
//! first read of the source; it's kept here deliberately; see
//! [`Config::base_ttl`].

mod deadline;
mod key;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use sinkdns_proto::{Question, Record};
use sinkdns_resolver::{Feed, Resolve};

pub use key::CacheKey;

use deadline::DeadlineIndex;

/// Flat accounting cost per entry, matching the source's `cost = 50`.
const COST_PER_ENTRY: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// Total cache budget in bytes; divided by [`COST_PER_ENTRY`] to get the
    /// maximum number of entries held at once.
    pub capacity_bytes: usize,
    /// Minimum TTL, in seconds, a fed record must carry to be worth storing,
    /// and the synthetic TTL returned on every cache hit in place of the
    /// record's residual lifetime. The entry's own expiry deadline is
    /// computed from the record's own TTL, not from this value. A value of
    /// `0` disables the cache entirely (no GC task is spawned and every
    /// lookup misses, matching the source's `baseTtl > 0` gate on starting
    /// the GC goroutine). A fed record whose own TTL is below `base_ttl` is
    /// dropped rather than stored — it isn't persistent enough to be worth
    /// the slot.
    pub base_ttl: u32,
    /// How often the background sweep looks for expired entries.
    pub gc_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: 1_000_000,
            base_ttl: 600,
            gc_interval: Duration::from_secs(60),
        }
    }
}

struct Inner {
    entries: HashMap<CacheKey, Record>,
    deadlines: DeadlineIndex,
}

#[derive(Debug)]
pub struct TtlCache {
    config: Config,
    max_entries: usize,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl TtlCache {
    pub fn new(config: Config) -> Self {
        let max_entries = (config.capacity_bytes / COST_PER_ENTRY).max(1);
        Self {
            config,
            max_entries,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                deadlines: DeadlineIndex::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything. Used when the server is reconfigured with a new
    /// blocklist/upstream set and stale answers must not survive the swap.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.entries.clear();
        inner.deadlines = DeadlineIndex::new();
    }

    /// Removes every entry whose deadline has passed. Pure, synchronous,
    /// never crosses an `.await` — safe to call from a plain sync lock.
    pub fn gc(&self) {
        if self.config.base_ttl == 0 {
            return;
        }
        let now = Instant::now();
        let mut inner = self.inner.write().unwrap();
        let expired = inner.deadlines.drain_expired(now);
        for key in expired {
            inner.entries.remove(&key);
        }
    }

    fn insert(&self, key: CacheKey, record: Record) {
        if self.config.base_ttl == 0 || record.ttl() < self.config.base_ttl {
            return;
        }
        let mut inner = self.inner.write().unwrap();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            if let Some(oldest) = inner.deadlines.pop_oldest() {
                inner.entries.remove(&oldest);
            }
        } else {
            inner.deadlines.remove(key);
        }

        let expiry = Instant::now() + Duration::from_secs(record.ttl() as u64);
        inner.deadlines.insert(expiry, key);
        inner.entries.insert(key, record);
    }

    fn lookup(&self, key: CacheKey) -> Option<Record> {
        let inner = self.inner.read().unwrap();
        inner.entries.get(&key).cloned()
    }

    /// Spawns the background GC sweep. A no-op, never-returning task when
    /// `base_ttl` is `0`, mirroring the source's decision not to start a GC
    /// goroutine at all in that case — here it's simpler to just spawn a
    /// task that waits on shutdown instead of branching at the call site.
    pub fn spawn_gc(
        self: Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let interval = self.config.gc_interval;
        tokio::spawn(async move {
            if self.config.base_ttl == 0 {
                let _ = shutdown.changed().await;
                return;
            }
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::trace!("cache gc sweep");
                        self.gc();
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }
}

impl Feed for TtlCache {
    fn feed(&self, question: &Question, record: &Record) {
        let key = CacheKey::new(&question.name, question.qtype);
        self.insert(key, record.clone());
    }
}

#[async_trait::async_trait]
impl Resolve for TtlCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        let key = CacheKey::new(&question.name, question.qtype);
        self.lookup(key).map(|record| record.with_ttl(self.config.base_ttl))
    }
}
