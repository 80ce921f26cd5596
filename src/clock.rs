#[cfg(test)]
use std::sync::Mutex;

use time::OffsetDateTime;
#[cfg(test)]
use time::Duration;

/// Source of the current time, injected so age checks can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock frozen at a fixed instant, advanced by hand.
#[cfg(test)]
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<OffsetDateTime>,
}

#[cfg(test)]
impl MockClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

#[cfg(test)]
impl Default for MockClock {
    fn default() -> Self {
        Self::new(time::macros::datetime!(2024-09-02 12:00 UTC))
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
