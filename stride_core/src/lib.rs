#![forbid(unsafe_code)]

//! Core domain model and business logic for Stride, a run/walk training plan.
//!
//! This crate provides:
//! - Domain types (intervals, sessions, week summaries)
//! - The built-in nine week program
//! - The interval countdown timer and its threaded runner
//! - Cue dispatch for interval changes
//! - The session scheduler (resequencing, shifting, streaks)
//! - Persistence and reminder scheduling

pub mod types;
pub mod error;
pub mod clock;
pub mod config;
pub mod logging;
pub mod program;
pub mod timer;
pub mod workout;
pub mod cues;
pub mod store;
pub mod reminders;
pub mod scheduler;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use timer::{IntervalTimer, TimerEvent, TimerState};
pub use workout::{WorkoutControl, WorkoutOutcome, WorkoutRunner};
pub use cues::{CueDispatcher, CueSink};
pub use store::{JsonPlanStore, PlanStore};
pub use reminders::{JsonReminderSink, NoReminders, Reminder, ReminderSink};
pub use scheduler::SessionScheduler;
