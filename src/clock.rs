//! Time source for ledger save stamps.
//!
//! Every sealed ledger records when it was written; the console shows that
//! stamp on start and after each save.

use chrono::{DateTime, Utc};

/// Where save timestamps come from.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, so saved records are reproducible.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

#[cfg(any(test, feature = "test-seams"))]
impl FixedClock {
    /// Pin the clock to an RFC 3339 timestamp. Panics on malformed input.
    pub fn at(timestamp: &str) -> Self {
        let instant = DateTime::parse_from_rfc3339(timestamp)
            .expect("valid RFC 3339 timestamp")
            .with_timezone(&Utc);
        Self(instant)
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render a save stamp with minute precision, e.g. `2026-05-04 10:00 UTC`.
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
