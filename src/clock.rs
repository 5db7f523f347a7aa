// src/clock.rs
// Injectable time source. Handlers and caches never read the system clock
// directly; tests swap in `FixedClock` to pin season boundaries and cache
// bucket rollover.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::timeutil::BERLIN;

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current instant in the dashboard's civil timezone.
    fn now_berlin(&self) -> DateTime<Tz> {
        self.now_utc().with_timezone(&BERLIN)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a known instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
