//! # CSRF Token Store
//!
//! Short-lived tokens for the unauthenticated customer self-order path.
//!
//! A token is issued when a customer scans a table's QR code and must be
//! presented on every subsequent submission. Tokens expire after
//! [`TOKEN_TTL`], are bound to the table they were issued for, and live in
//! process memory only - a restart invalidates everything outstanding,
//! which just forces a re-scan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;

/// How long an issued token stays valid.
pub const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Token length in characters.
const TOKEN_LEN: usize = 32;

/// Pluggable token backend.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Issues a fresh token bound to a table.
    async fn issue(&self, table_id: &str) -> String;

    /// Validates a token for a table. Unknown, expired, or wrong-table
    /// tokens all fail identically.
    async fn validate(&self, token: &str, table_id: &str) -> bool;

    /// Drops expired tokens.
    async fn evict_expired(&self);
}

struct TokenEntry {
    table_id: String,
    issued_at: Instant,
}

/// In-memory token store.
#[derive(Clone)]
pub struct MemoryTokenStore {
    inner: Arc<Mutex<HashMap<String, TokenEntry>>>,
    ttl: Duration,
}

impl MemoryTokenStore {
    /// Creates a store with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(TOKEN_TTL)
    }

    /// Creates a store with a custom TTL (tests shorten it).
    pub fn with_ttl(ttl: Duration) -> Self {
        MemoryTokenStore {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn issue(&self, table_id: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        let mut map = self.inner.lock().await;
        map.insert(
            token.clone(),
            TokenEntry {
                table_id: table_id.to_string(),
                issued_at: Instant::now(),
            },
        );

        token
    }

    async fn validate(&self, token: &str, table_id: &str) -> bool {
        let map = self.inner.lock().await;
        match map.get(token) {
            Some(entry) => {
                entry.table_id == table_id && entry.issued_at.elapsed() < self.ttl
            }
            None => false,
        }
    }

    async fn evict_expired(&self) {
        let mut map = self.inner.lock().await;
        let ttl = self.ttl;
        map.retain(|_, entry| entry.issued_at.elapsed() < ttl);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_validate() {
        let store = MemoryTokenStore::new();
        let token = store.issue("table-1").await;

        assert!(store.validate(&token, "table-1").await);
        // Bound to the issuing table
        assert!(!store.validate(&token, "table-2").await);
        // Unknown token
        assert!(!store.validate("bogus", "table-1").await);
    }

    #[tokio::test]
    async fn test_expiry() {
        let store = MemoryTokenStore::with_ttl(Duration::from_millis(10));
        let token = store.issue("table-1").await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.validate(&token, "table-1").await);

        store.evict_expired().await;
        assert!(store.inner.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = MemoryTokenStore::new();
        let a = store.issue("table-1").await;
        let b = store.issue("table-1").await;
        assert_ne!(a, b);
    }
}
