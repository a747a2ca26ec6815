//! System-time backed clock adapter.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock adapter that reads the host's wall clock.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
