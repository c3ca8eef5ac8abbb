/// Clock abstraction and single-entry token cache
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Source of the current time, injected so expiry can be tested
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Cached bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Process-wide cache for one identity domain.
///
/// Readers racing on an expired entry may each refresh; the last write wins.
#[derive(Clone)]
pub struct TokenCache {
    clock: Arc<dyn Clock>,
    entry: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entry: Arc::new(RwLock::new(None)),
        }
    }

    /// Token value if present and unexpired
    pub async fn get(&self) -> Option<String> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|token| self.clock.now() < token.expires_at)
            .map(|token| token.value.clone())
    }

    /// Store a token valid for `ttl` from now
    pub async fn store(&self, value: String, ttl: Duration) -> CachedToken {
        let token = CachedToken {
            value,
            expires_at: self
                .clock
                .now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        *self.entry.write().await = Some(token.clone());
        token
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
