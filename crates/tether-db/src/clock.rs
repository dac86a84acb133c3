//! Time sources and the idle timeout policy.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Reads [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one clone and hand
/// another to the manager.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Starts at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// How long a connection may sit unused before it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTimeout {
    /// Never evict.
    Disabled,
    /// Evict once idle for strictly longer than this.
    After(Duration),
}

impl IdleTimeout {
    /// Five minutes.
    pub const DEFAULT: Self = Self::After(Duration::from_secs(300));

    /// Interprets a configured number of seconds. Zero or negative disables
    /// eviction.
    pub fn from_secs(secs: i64) -> Self {
        match u64::try_from(secs) {
            Ok(0) | Err(_) => Self::Disabled,
            Ok(secs) => Self::After(Duration::from_secs(secs)),
        }
    }

    /// The limit, or `None` when disabled.
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::After(limit) => Some(limit),
        }
    }

    /// Returns `true` if a handle idle for `idle_for` must be evicted.
    pub fn is_exceeded_by(self, idle_for: Duration) -> bool {
        match self {
            Self::Disabled => false,
            Self::After(limit) => idle_for > limit,
        }
    }
}

impl Default for IdleTimeout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Duration> for IdleTimeout {
    fn from(limit: Duration) -> Self {
        if limit.is_zero() {
            Self::Disabled
        } else {
            Self::After(limit)
        }
    }
}
