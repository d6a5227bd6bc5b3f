use crate::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// This is the only source of persisted timestamps; a system clock set
/// before the epoch collapses to 0.
pub fn now_millis() -> Timestamp {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        Err(_) => 0,
    }
}

/// Capability for resolving "now" on read paths.
///
/// A `Clock` built with [`Clock::system`] always answers with the real wall
/// clock. Only a clock built with [`Clock::with_override_enabled`] honors a
/// caller-supplied override, which is how tests fast-forward time without
/// waiting. Overrides never feed persisted timestamps: creation code calls
/// [`now_millis`] directly and never goes through `resolve`.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    allow_override: bool,
}

impl Clock {
    /// A clock that ignores override requests
    pub fn system() -> Self {
        Self {
            allow_override: false,
        }
    }

    /// A clock that honors per-call overrides
    pub fn with_override_enabled() -> Self {
        Self {
            allow_override: true,
        }
    }

    pub fn allows_override(&self) -> bool {
        self.allow_override
    }

    /// Resolve "now" for a single read, preferring `requested` only when
    /// overrides are enabled.
    pub fn resolve(&self, requested: Option<Timestamp>) -> Timestamp {
        if self.allow_override {
            requested.unwrap_or_else(now_millis)
        } else {
            now_millis()
        }
    }
}
