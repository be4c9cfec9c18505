//! Core domain types for the Stride training plan.
//!
//! This module defines the fundamental types used throughout the system:
//! - Intervals (one contiguous run or walk segment)
//! - Sessions (one scheduled workout with its own date and completion state)
//! - Week summaries for the grouped plan view

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Interval Types
// ============================================================================

/// Whether an interval is spent running or walking
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Run,
    Walk,
}

impl IntervalKind {
    /// Spoken/displayed label ("Run" or "Walk")
    pub fn label(&self) -> &'static str {
        match self {
            IntervalKind::Run => "Run",
            IntervalKind::Walk => "Walk",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One contiguous run or walk segment with a fixed duration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: IntervalKind,
    pub duration_seconds: u32,
}

impl Interval {
    pub fn new(kind: IntervalKind, duration_seconds: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            duration_seconds,
        }
    }

    pub fn run(duration_seconds: u32) -> Self {
        Self::new(IntervalKind::Run, duration_seconds)
    }

    pub fn walk(duration_seconds: u32) -> Self {
        Self::new(IntervalKind::Walk, duration_seconds)
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// One scheduled workout in the plan
///
/// `intervals` is fixed at creation. Only `week`, `day`, `date` and
/// `completed` are rewritten, and only by the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub week: u32,
    pub day: u8,
    pub intervals: Vec<Interval>,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

impl Session {
    pub fn new(week: u32, day: u8, intervals: Vec<Interval>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            week,
            day,
            intervals,
            date,
            completed: false,
        }
    }

    /// Display title, e.g. "Week 3 • Day 2"
    pub fn title(&self) -> String {
        format!("Week {} • Day {}", self.week, self.day)
    }

    /// Sum of all interval durations in seconds
    pub fn total_seconds(&self) -> u32 {
        self.intervals.iter().map(|i| i.duration_seconds).sum()
    }
}

/// One week of the plan as shown in the grouped list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekSummary {
    pub week: u32,
    pub sessions: Vec<Session>,
    /// True when every session in the week is completed
    pub done: bool,
}

impl WeekSummary {
    pub fn title(&self) -> String {
        format!("Week {}", self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_title() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let session = Session::new(3, 2, vec![Interval::walk(300)], date);
        assert_eq!(session.title(), "Week 3 • Day 2");
    }

    #[test]
    fn test_total_seconds() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let session = Session::new(
            1,
            1,
            vec![Interval::walk(300), Interval::run(60), Interval::walk(90)],
            date,
        );
        assert_eq!(session.total_seconds(), 450);
    }

    #[test]
    fn test_interval_serializes_kind_as_type() {
        let json = serde_json::to_value(Interval::run(60)).unwrap();
        assert_eq!(json["type"], "run");
        assert_eq!(json["duration_seconds"], 60);
    }

    #[test]
    fn test_missing_completed_defaults_false() {
        let json = r#"{
            "id": "8f2c7c1e-6d43-4a55-9a7e-6d3f0b0d1a11",
            "week": 1,
            "day": 1,
            "intervals": [{"id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427", "type": "walk", "duration_seconds": 300}],
            "date": "2025-05-05"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(!session.completed);
        assert_eq!(session.intervals[0].kind, IntervalKind::Walk);
    }
}
