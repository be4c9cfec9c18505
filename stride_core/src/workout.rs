//! Live workout runner.
//!
//! Owns an [`IntervalTimer`] on a dedicated thread and steps it on a fixed
//! cadence. Pause, resume and abandon requests arrive over a channel and are
//! handled on the same thread, so control calls and steps never interleave.

use crate::clock::Clock;
use crate::timer::{IntervalTimer, TimerEvent};
use crate::types::Interval;
use crate::{Error, Result};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Requests accepted by a running workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutControl {
    Pause,
    Resume,
    Abandon,
}

/// How a workout ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutOutcome {
    Finished,
    Abandoned,
}

/// Handle to a workout running on its own thread
pub struct WorkoutRunner {
    control: Sender<WorkoutControl>,
    handle: JoinHandle<WorkoutOutcome>,
}

impl WorkoutRunner {
    /// Start the countdown and the stepping thread
    ///
    /// `observer` sees every timer event, beginning with the initial tick.
    /// An empty interval list is rejected before any thread is spawned.
    pub fn spawn<C, F>(
        clock: C,
        intervals: Vec<Interval>,
        cadence: Duration,
        mut observer: F,
    ) -> Result<Self>
    where
        C: Clock + Send + 'static,
        F: FnMut(&TimerEvent) + Send + 'static,
    {
        if cadence.is_zero() {
            return Err(Error::Config("timer cadence must be positive".into()));
        }

        let mut timer = IntervalTimer::new(clock);
        let initial = timer.start(intervals)?;
        let (control, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("workout-timer".into())
            .spawn(move || {
                for event in &initial {
                    observer(event);
                }

                let mut next_step = Instant::now() + cadence;
                loop {
                    let wait = next_step.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Ok(WorkoutControl::Pause) => timer.pause(),
                        Ok(WorkoutControl::Resume) => timer.resume(),
                        Ok(WorkoutControl::Abandon) | Err(RecvTimeoutError::Disconnected) => {
                            timer.pause();
                            tracing::info!("Workout abandoned at interval {}", timer.current_index());
                            return WorkoutOutcome::Abandoned;
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            let now = Instant::now();
                            next_step += cadence;
                            if next_step < now {
                                // Thread was starved; don't burst to catch up
                                next_step = now + cadence;
                            }

                            for event in timer.step() {
                                observer(&event);
                            }
                            if timer.is_finished() {
                                return WorkoutOutcome::Finished;
                            }
                        }
                    }
                }
            })?;

        Ok(Self { control, handle })
    }

    pub fn pause(&self) {
        self.send(WorkoutControl::Pause);
    }

    pub fn resume(&self) {
        self.send(WorkoutControl::Resume);
    }

    pub fn abandon(&self) {
        self.send(WorkoutControl::Abandon);
    }

    /// Forward a control request; ignored once the workout has ended
    pub fn send(&self, request: WorkoutControl) {
        if self.control.send(request).is_err() {
            tracing::debug!("Workout already ended, dropping {:?}", request);
        }
    }

    /// Control handle that can be moved to another thread (e.g. stdin reader)
    pub fn controller(&self) -> Sender<WorkoutControl> {
        self.control.clone()
    }

    pub fn is_done(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the workout to finish or be abandoned
    pub fn join(self) -> Result<WorkoutOutcome> {
        let WorkoutRunner { control, handle } = self;
        let outcome = handle
            .join()
            .map_err(|_| Error::Other("workout timer thread panicked".into()));
        drop(control);
        outcome
    }
}
