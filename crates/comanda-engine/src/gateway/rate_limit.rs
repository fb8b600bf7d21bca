//! # Rate Limiting
//!
//! Fixed-window request counters for the customer gateway and the payment
//! path.
//!
//! State is in-process and best-effort: a restart clears all windows, and
//! a multi-instance deployment would need a shared store for a real
//! cluster-wide guarantee. That is a known limitation, not a correctness
//! requirement of the engines.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Pluggable rate-limit backend.
///
/// Implementations record the attempt and answer whether it is allowed;
/// counting rejected attempts too is deliberate, so hammering a limited
/// key never opens the window early.
#[async_trait::async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records an attempt under `key`; returns `false` when rate-limited.
    async fn check(&self, key: &str) -> bool;
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory fixed-window rate limiter.
#[derive(Clone)]
pub struct MemoryRateLimiter {
    inner: Arc<Mutex<HashMap<String, WindowEntry>>>,
    max_requests: u32,
    window: Duration,
}

impl MemoryRateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per key.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        MemoryRateLimiter {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Removes entries whose window expired long ago.
    ///
    /// Call periodically from a maintenance task; correctness doesn't
    /// depend on it, only memory usage.
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = self.window * 5;
        let now = Instant::now();
        map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
    }
}

#[async_trait::async_trait]
impl RateLimitStore for MemoryRateLimiter {
    async fn check(&self, key: &str) -> bool {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        let entry = map.entry(key.to_owned()).or_insert_with(|| WindowEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= self.max_requests
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
