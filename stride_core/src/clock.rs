//! Time sources for the timer and scheduler.
//!
//! Production code reads the system clock; tests drive a [`ManualClock`].

use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic and calendar time
pub trait Clock {
    /// Monotonic instant used for interval countdowns
    fn instant(&self) -> Instant;

    /// Local wall-clock date and time
    fn local_now(&self) -> NaiveDateTime;

    /// Local calendar date
    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn instant(&self) -> Instant {
        (**self).instant()
    }

    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn instant(&self) -> Instant {
        (**self).instant()
    }

    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }
}

/// The real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to
///
/// Instants and wall time advance together, so a test can simulate both a
/// running countdown and the passing of calendar days.
#[derive(Debug)]
pub struct ManualClock {
    base_instant: Instant,
    base_local: NaiveDateTime,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            base_instant: Instant::now(),
            base_local: start,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Clock starting at 08:00 on the given date
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(8, 0, 0).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn advance_days(&self, days: u64) {
        self.advance(Duration::from_secs(days * 24 * 60 * 60));
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.base_instant + self.offset()
    }

    fn local_now(&self) -> NaiveDateTime {
        let offset = ChronoDuration::from_std(self.offset()).unwrap_or(ChronoDuration::zero());
        self.base_local + offset
    }
}
