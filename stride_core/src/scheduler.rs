//! Session scheduler: the single owner of the training plan.
//!
//! All plan mutations go through `&mut SessionScheduler`, which persists the
//! full list and hands it to the reminder sink after every change. Storage
//! and reminder failures are logged and swallowed; the in-memory plan stays
//! authoritative and an unsaved plan is written again on the next change.

use crate::clock::Clock;
use crate::program;
use crate::reminders::ReminderSink;
use crate::store::PlanStore;
use crate::{Error, Result, Session, WeekSummary};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use uuid::Uuid;

pub struct SessionScheduler<S: PlanStore, R: ReminderSink, C: Clock> {
    store: S,
    reminders: R,
    clock: C,
    sessions: Vec<Session>,
    start_date: Option<NaiveDate>,
    active_session: Option<Uuid>,
    unsaved: bool,
    clear_pending: bool,
}

/// `date` moved by `days`, or `None` outside chrono's date range
fn offset_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Next (week, day) label slot
fn next_label(week: u32, day: u8) -> (u32, u8) {
    if day < program::SESSIONS_PER_WEEK {
        (week, day + 1)
    } else {
        (week + 1, 1)
    }
}

impl<S: PlanStore, R: ReminderSink, C: Clock> SessionScheduler<S, R, C> {
    /// Load the stored plan
    ///
    /// If the plan is gone but a start date survived, the plan is generated
    /// again from that date.
    pub fn open(store: S, reminders: R, clock: C) -> Self {
        let sessions = store.load_sessions().unwrap_or_else(|e| {
            tracing::warn!("Failed to load sessions: {}. Starting empty.", e);
            Vec::new()
        });
        let start_date = store.load_start_date().unwrap_or_else(|e| {
            tracing::warn!("Failed to load start date: {}", e);
            None
        });

        let mut scheduler = Self {
            store,
            reminders,
            clock,
            sessions,
            start_date,
            active_session: None,
            unsaved: false,
            clear_pending: false,
        };

        if scheduler.sessions.is_empty() {
            if let Some(start) = scheduler.start_date {
                tracing::info!("Plan missing, regenerating from {}", start);
                // Cannot fail: the plan is empty
                let _ = scheduler.initialise(start);
            }
        }

        scheduler
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// First incomplete session in plan order
    pub fn next_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| !s.completed)
    }

    /// True while a save has failed and not yet been retried successfully
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Consecutive days, counting back from today, with a completed session
    ///
    /// Zero when nothing was completed today.
    pub fn current_streak(&self) -> u32 {
        let mut day = self.clock.today();
        let mut streak = 0;
        while self
            .sessions
            .iter()
            .any(|s| s.completed && s.date == day)
        {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }

    /// Plan grouped by week number, ascending
    pub fn weeks(&self) -> Vec<WeekSummary> {
        let mut grouped: BTreeMap<u32, Vec<Session>> = BTreeMap::new();
        for session in &self.sessions {
            grouped.entry(session.week).or_default().push(session.clone());
        }

        grouped
            .into_iter()
            .map(|(week, sessions)| WeekSummary {
                week,
                done: sessions.iter().all(|s| s.completed),
                sessions,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Active workout
    // ------------------------------------------------------------------

    pub fn active_session(&self) -> Option<Uuid> {
        self.active_session
    }

    /// Mark `id` as the workout in progress
    pub fn begin_workout(&mut self, id: Uuid) -> Result<()> {
        if self.session(id).is_none() {
            return Err(Error::SessionNotFound(id));
        }
        if let Some(current) = self.active_session {
            if current != id {
                tracing::warn!("Replacing active workout {} with {}", current, id);
            }
        }
        self.active_session = Some(id);
        Ok(())
    }

    /// Clear the workout in progress without touching the plan
    pub fn end_workout(&mut self) {
        self.active_session = None;
    }

    /// End the active workout and record `id` as completed today
    ///
    /// A session that is already completed is left alone rather than
    /// toggled back to incomplete.
    pub fn complete_workout(&mut self, id: Uuid) -> Result<()> {
        self.end_workout();
        let session = self.session(id).ok_or(Error::SessionNotFound(id))?;
        if session.completed {
            tracing::info!("{} already completed", session.title());
            return Ok(());
        }
        self.toggle(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Generate a fresh plan starting on `start`
    ///
    /// Only allowed while the plan is empty.
    pub fn initialise(&mut self, start: NaiveDate) -> Result<()> {
        if !self.sessions.is_empty() {
            return Err(Error::PlanAlreadyInitialised);
        }

        self.sessions = program::generate(start);
        self.start_date = Some(start);
        // Both stored files are overwritten below
        self.clear_pending = false;
        if let Err(e) = self.store.save_start_date(start) {
            tracing::warn!("Failed to save start date: {}", e);
        }
        tracing::info!(
            "Initialised plan with {} sessions from {}",
            self.sessions.len(),
            start
        );
        self.commit();
        Ok(())
    }

    /// Forget the plan and the start date. Nothing is regenerated.
    pub fn reset(&mut self) {
        self.sessions.clear();
        self.start_date = None;
        self.active_session = None;

        match self.store.clear() {
            Ok(()) => {
                self.unsaved = false;
                self.clear_pending = false;
            }
            Err(e) => {
                tracing::warn!("Failed to clear stored plan: {}. Will retry on next change.", e);
                self.unsaved = true;
                self.clear_pending = true;
            }
        }
        if let Err(e) = self.reminders.schedule_all(&[]) {
            tracing::warn!("Failed to clear reminders: {}", e);
        }
        tracing::info!("Plan reset");
    }

    /// Flip completion of one session and resequence the plan
    ///
    /// A session that becomes completed is dated today. Returns the new
    /// completion state, or `None` if no session has this id.
    pub fn toggle(&mut self, id: Uuid) -> Option<bool> {
        let today = self.clock.today();
        let session = self.sessions.iter_mut().find(|s| s.id == id)?;

        session.completed = !session.completed;
        if session.completed {
            session.date = today;
        }
        let completed = session.completed;
        tracing::info!(
            "{} marked {}",
            session.title(),
            if completed { "completed" } else { "incomplete" }
        );

        self.resequence();
        Some(completed)
    }

    /// Reassign dates and labels after a completion change
    ///
    /// Walks the plan in list order. Completed sessions keep their date and
    /// move the anchor to it; each incomplete session lands two days after
    /// the anchor. Labels are handed out in order to every session.
    ///
    /// If a date would fall outside the representable range the plan is
    /// left as it was.
    pub fn resequence(&mut self) {
        let mut anchor = self.start_date.unwrap_or_else(|| self.clock.today());
        let mut dates = Vec::with_capacity(self.sessions.len());

        for session in &self.sessions {
            if session.completed {
                anchor = session.date;
            } else {
                match offset_date(anchor, program::SESSION_SPACING_DAYS) {
                    Some(next) => anchor = next,
                    None => {
                        tracing::warn!("Resequencing past {} is out of range; plan unchanged", anchor);
                        return;
                    }
                }
            }
            dates.push(anchor);
        }

        let (mut week, mut day) = (1, 1);
        for (session, date) in self.sessions.iter_mut().zip(dates) {
            if !session.completed {
                session.date = date;
                session.week = week;
                session.day = day;
            }
            (week, day) = next_label(week, day);
        }

        tracing::debug!("Resequenced {} sessions", self.sessions.len());
        self.commit();
    }

    /// Move every incomplete session by `days` (negative moves earlier)
    ///
    /// Returns `false` and leaves the plan untouched when any session would
    /// land outside the representable date range.
    pub fn shift_plan(&mut self, days: i64) -> bool {
        if days == 0 {
            return true;
        }

        let moved: Option<Vec<NaiveDate>> = self
            .sessions
            .iter()
            .filter(|s| !s.completed)
            .map(|s| offset_date(s.date, days))
            .collect();
        let Some(moved) = moved else {
            tracing::warn!("Shift by {} days is out of range; plan unchanged", days);
            return false;
        };

        let shifted = moved.len();
        for (session, date) in self.sessions.iter_mut().filter(|s| !s.completed).zip(moved) {
            session.date = date;
        }

        tracing::info!("Shifted {} sessions by {} days", shifted, days);
        self.commit();
        true
    }

    /// Retry a save that failed earlier
    pub fn flush(&mut self) -> Result<()> {
        if !self.unsaved {
            return Ok(());
        }
        self.persist()?;
        self.unsaved = false;
        Ok(())
    }

    /// Write the plan, or finish a reset whose removal failed
    fn persist(&mut self) -> Result<()> {
        if self.clear_pending {
            self.store.clear()?;
            self.clear_pending = false;
            return Ok(());
        }
        self.store.save_sessions(&self.sessions)
    }

    /// Persist the plan and refresh reminders
    fn commit(&mut self) {
        match self.persist() {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                tracing::warn!("Failed to save plan: {}. Will retry on next change.", e);
                self.unsaved = true;
            }
        }

        if let Err(e) = self.reminders.schedule_all(&self.sessions) {
            tracing::warn!("Failed to schedule reminders: {}", e);
        }
    }
}
