//! Single-use OAuth state tokens

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use rand::RngCore;

/// How long an issued state stays redeemable
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

const STATE_BYTES: usize = 32;

/// Outstanding authorization states.
///
/// A token is redeemable at most once, even under concurrent callbacks.
#[derive(Debug)]
pub struct AuthStateStore {
    issued: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl Default for AuthStateStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_STATE_TTL)
    }
}

impl AuthStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose states expire after `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { issued: Mutex::new(HashMap::new()), ttl }
    }

    /// Mint and record a fresh URL-safe state token (256 bits).
    ///
    /// Expired entries are pruned on every issue.
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; STATE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let now = Instant::now();
        let mut issued = self.issued.lock();
        issued.retain(|_, at| now.duration_since(*at) < self.ttl);
        issued.insert(token.clone(), now);
        token
    }

    /// Remove `token` and report whether it was outstanding and unexpired
    pub fn consume(&self, token: &str) -> bool {
        self.issued.lock().remove(token).is_some_and(|at| at.elapsed() < self.ttl)
    }

    /// Number of issued, unconsumed states
    pub fn outstanding(&self) -> usize {
        self.issued.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn issued_tokens_are_unique_and_url_safe() {
        let store = AuthStateStore::new();
        let a = store.issue();
        let b = store.issue();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_is_consumed_once() {
        let store = AuthStateStore::new();
        let token = store.issue();

        assert!(store.consume(&token));
        assert!(!store.consume(&token));
        assert!(!store.consume("never-issued"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let store = AuthStateStore::with_ttl(Duration::ZERO);
        let token = store.issue();
        assert!(!store.consume(&token));
    }

    #[test]
    fn issue_prunes_expired_entries() {
        let store = AuthStateStore::with_ttl(Duration::ZERO);
        store.issue();
        store.issue();
        assert_eq!(store.outstanding(), 1);
    }

    #[test]
    fn concurrent_consume_succeeds_exactly_once() {
        let store = Arc::new(AuthStateStore::new());
        let token = store.issue();
        let wins = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..16 {
                let store = Arc::clone(&store);
                let wins = Arc::clone(&wins);
                let token = token.clone();
                scope.spawn(move || {
                    if store.consume(&token) {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
