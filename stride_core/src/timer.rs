//! Interval countdown engine.
//!
//! The timer walks one session's intervals in order. It is driven from the
//! outside: something calls [`IntervalTimer::step`] on a fixed cadence (see
//! `workout::WorkoutRunner`), and every call returns the events it produced.
//!
//! Remaining time is derived from the wall clock elapsed since an anchor
//! rather than from counting steps, so a late or skipped step does not make
//! the countdown drift.

use crate::clock::Clock;
use crate::types::{Interval, IntervalKind};
use crate::{Error, Result};
use std::time::Instant;

/// Lifecycle of a single workout countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Something observable happened in the countdown
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Current interval and its remaining seconds
    Tick { index: usize, remaining: u32 },
    /// A new interval began (not emitted for the first one)
    IntervalChanged { index: usize, kind: IntervalKind },
    /// The last interval ran out
    Finished,
}

/// Countdown over a fixed list of intervals
pub struct IntervalTimer<C: Clock> {
    clock: C,
    intervals: Vec<Interval>,
    state: TimerState,
    index: usize,
    remaining: u32,
    total_remaining: u32,
    anchor: Option<Instant>,
    remaining_at_anchor: u32,
}

impl<C: Clock> IntervalTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            intervals: Vec::new(),
            state: TimerState::Idle,
            index: 0,
            remaining: 0,
            total_remaining: 0,
            anchor: None,
            remaining_at_anchor: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_interval(&self) -> Option<&Interval> {
        match self.state {
            TimerState::Running | TimerState::Paused => self.intervals.get(self.index),
            TimerState::Idle | TimerState::Finished => None,
        }
    }

    /// Seconds left in the current interval
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds left in the whole session
    pub fn total_remaining(&self) -> u32 {
        self.total_remaining
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Begin counting down `intervals` from the first one
    ///
    /// Fails without touching state if the list is empty or the timer has
    /// been started before.
    pub fn start(&mut self, intervals: Vec<Interval>) -> Result<Vec<TimerEvent>> {
        if self.state != TimerState::Idle {
            return Err(Error::TimerAlreadyStarted);
        }
        let first = intervals.first().ok_or(Error::EmptyWorkout)?;

        self.index = 0;
        self.remaining = first.duration_seconds;
        self.total_remaining = intervals.iter().map(|i| i.duration_seconds).sum();
        self.anchor = Some(self.clock.instant());
        self.remaining_at_anchor = self.remaining;
        self.intervals = intervals;
        self.state = TimerState::Running;

        tracing::info!(
            "Workout started: {} intervals, {} seconds total",
            self.intervals.len(),
            self.total_remaining
        );

        Ok(vec![TimerEvent::Tick {
            index: 0,
            remaining: self.remaining,
        }])
    }

    /// Freeze the countdown. Ignored unless running.
    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            tracing::debug!("pause() ignored in state {:?}", self.state);
            return;
        }
        self.state = TimerState::Paused;
        self.anchor = None;
        tracing::info!(
            "Workout paused at interval {} with {}s remaining",
            self.index,
            self.remaining
        );
    }

    /// Continue from the frozen remaining time. Ignored unless paused.
    pub fn resume(&mut self) {
        if self.state != TimerState::Paused {
            tracing::debug!("resume() ignored in state {:?}", self.state);
            return;
        }
        self.anchor = Some(self.clock.instant());
        self.remaining_at_anchor = self.remaining;
        self.state = TimerState::Running;
        tracing::info!("Workout resumed at interval {}", self.index);
    }

    /// Periodic advancement
    ///
    /// Does nothing unless running. The session-wide counter drops by one per
    /// call; the interval countdown is recomputed from the anchor. Crossing
    /// zero moves to the next interval and returns immediately, so the new
    /// interval's first tick is not processed in the same call.
    pub fn step(&mut self) -> Vec<TimerEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }

        if let Some(anchor) = self.anchor {
            let elapsed = self.clock.instant().saturating_duration_since(anchor).as_secs();
            let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
            self.remaining = self.remaining_at_anchor.saturating_sub(elapsed);
        }
        self.total_remaining = self.total_remaining.saturating_sub(1);

        tracing::trace!(
            "Interval {}, remaining {}s, total remaining {}s",
            self.index,
            self.remaining,
            self.total_remaining
        );

        if self.remaining > 0 {
            return vec![TimerEvent::Tick {
                index: self.index,
                remaining: self.remaining,
            }];
        }

        self.index += 1;
        let Some(next) = self.intervals.get(self.index) else {
            self.state = TimerState::Finished;
            self.anchor = None;
            self.total_remaining = 0;
            tracing::info!("Workout finished");
            return vec![TimerEvent::Finished];
        };

        self.remaining = next.duration_seconds;
        self.remaining_at_anchor = self.remaining;
        self.anchor = Some(self.clock.instant());
        tracing::debug!(
            "Interval {} started: {} for {}s",
            self.index,
            next.kind,
            self.remaining
        );

        vec![
            TimerEvent::Tick {
                index: self.index,
                remaining: self.remaining,
            },
            TimerEvent::IntervalChanged {
                index: self.index,
                kind: next.kind,
            },
        ]
    }
}
