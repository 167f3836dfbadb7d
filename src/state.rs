use crate::config::AppConfig;
use crate::store::TradeStore;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Request Counters (lock-free) ──

pub struct RequestCounters {
    pub trades_listed: AtomicU64,
    pub trades_created: AtomicU64,
    pub trades_updated: AtomicU64,
    pub requests_failed: AtomicU64,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self {
            trades_listed: AtomicU64::new(0),
            trades_created: AtomicU64::new(0),
            trades_updated: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for RequestCounters {
    fn default() -> Self {
        Self::new()
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    // The storage collaborator; the server never computes metrics
    pub store: Arc<dyn TradeStore>,
    pub counters: RequestCounters,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn TradeStore>) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            counters: RequestCounters::new(),
        })
    }
}
