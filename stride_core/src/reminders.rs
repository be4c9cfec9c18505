//! Workout reminders.
//!
//! Every change to the plan hands the whole session list to a
//! [`ReminderSink`], which replaces whatever it scheduled before. Delivery
//! (desktop notifications, cron, a phone) is somebody else's job; the
//! bundled sink writes the schedule to `reminders.json`.

use crate::clock::Clock;
use crate::store::write_json_atomic;
use crate::{Error, Result, Session};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// File name of the written reminder schedule
pub const REMINDERS_FILE: &str = "reminders.json";

/// Title used for every reminder
pub const REMINDER_TITLE: &str = "Today's workout";

/// One pending reminder for one session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub session_id: Uuid,
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
}

/// Receives the full plan whenever it changes
pub trait ReminderSink {
    /// Replace all previously scheduled reminders with ones for `sessions`
    fn schedule_all(&mut self, sessions: &[Session]) -> Result<()>;
}

impl<R: ReminderSink + ?Sized> ReminderSink for Box<R> {
    fn schedule_all(&mut self, sessions: &[Session]) -> Result<()> {
        (**self).schedule_all(sessions)
    }
}

/// Reminders for every incomplete session whose fire time is after `now`
pub fn plan_reminders(sessions: &[Session], now: NaiveDateTime, hour: u32) -> Vec<Reminder> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();

    sessions
        .iter()
        .filter(|s| !s.completed)
        .map(|s| Reminder {
            session_id: s.id,
            fire_at: s.date.and_time(at),
            title: REMINDER_TITLE.to_string(),
            body: s.title(),
        })
        .filter(|r| r.fire_at > now)
        .collect()
}

/// Discards everything; used when reminders are disabled
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReminders;

impl ReminderSink for NoReminders {
    fn schedule_all(&mut self, _sessions: &[Session]) -> Result<()> {
        Ok(())
    }
}

/// Writes the pending reminder schedule to a JSON file
pub struct JsonReminderSink<C: Clock> {
    path: PathBuf,
    hour: u32,
    clock: C,
}

impl<C: Clock> JsonReminderSink<C> {
    pub fn new(dir: impl Into<PathBuf>, hour: u32, clock: C) -> Result<Self> {
        if hour > 23 {
            return Err(Error::Config(format!("reminder hour must be 0-23, got {}", hour)));
        }
        Ok(Self {
            path: dir.into().join(REMINDERS_FILE),
            hour,
            clock,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read back the last written schedule
    pub fn load(&self) -> Result<Vec<Reminder>> {
        Ok(crate::store::read_json(&self.path)?.unwrap_or_default())
    }
}

impl<C: Clock> ReminderSink for JsonReminderSink<C> {
    fn schedule_all(&mut self, sessions: &[Session]) -> Result<()> {
        let reminders = plan_reminders(sessions, self.clock.local_now(), self.hour);
        write_json_atomic(&self.path, &reminders)?;
        tracing::info!("Scheduled {} reminders", reminders.len());
        Ok(())
    }
}
