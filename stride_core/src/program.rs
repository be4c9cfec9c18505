//! Built-in nine week run/walk curriculum.
//!
//! The table below is the only program Stride knows about. Every session is
//! wrapped in a five minute warm-up walk and a five minute cool-down walk.

use crate::types::{Interval, IntervalKind, Session};
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;

/// Sessions scheduled per program week
pub const SESSIONS_PER_WEEK: u8 = 3;

/// Calendar days between consecutive sessions
pub const SESSION_SPACING_DAYS: i64 = 2;

/// Warm-up and cool-down walk length in seconds
pub const WARMUP_SECONDS: u32 = 300;

type Pattern = Vec<(IntervalKind, u32)>;

/// Cached curriculum: one entry per week, three day patterns per week
static PROGRAM: Lazy<Vec<[Pattern; 3]>> = Lazy::new(build_program_table);

fn r(seconds: u32) -> (IntervalKind, u32) {
    (IntervalKind::Run, seconds)
}

fn w(seconds: u32) -> (IntervalKind, u32) {
    (IntervalKind::Walk, seconds)
}

fn repeat(pair: [(IntervalKind, u32); 2], count: usize) -> Pattern {
    pair.iter().copied().cycle().take(count * 2).collect()
}

fn same_every_day(pattern: Pattern) -> [Pattern; 3] {
    [pattern.clone(), pattern.clone(), pattern]
}

fn build_program_table() -> Vec<[Pattern; 3]> {
    vec![
        // Week 1: run 60 / walk 90 x 8
        same_every_day(repeat([r(60), w(90)], 8)),
        // Week 2: run 90 / walk 120 x 6
        same_every_day(repeat([r(90), w(120)], 6)),
        // Week 3
        same_every_day(vec![
            r(90),
            w(90),
            r(180),
            w(180),
            r(90),
            w(90),
            r(180),
            w(180),
        ]),
        // Week 4
        same_every_day(vec![r(180), w(90), r(300), w(150), r(180), w(90), r(300)]),
        // Week 5
        [
            repeat([r(300), w(180)], 3),
            vec![r(480), w(300), r(480)],
            vec![r(1200)],
        ],
        // Week 6
        [
            vec![r(300), w(180), r(480), w(180), r(300)],
            vec![r(600), w(180), r(600)],
            vec![r(1500)],
        ],
        // Weeks 7-9: continuous runs of 25, 28 and 30 minutes
        same_every_day(vec![r(1500)]),
        same_every_day(vec![r(1680)]),
        same_every_day(vec![r(1800)]),
    ]
}

/// Number of weeks in the built-in program
pub fn program_weeks() -> u32 {
    PROGRAM.len() as u32
}

/// Generate the full plan starting on `start`
///
/// Sessions come out in program order, labelled week 1 day 1 onwards and
/// spaced [`SESSION_SPACING_DAYS`] apart. The same start date always yields
/// the same labels, dates and interval lists.
pub fn generate(start: NaiveDate) -> Vec<Session> {
    let mut sessions = Vec::with_capacity(PROGRAM.len() * SESSIONS_PER_WEEK as usize);
    let mut date = start;

    for (week_idx, days) in PROGRAM.iter().enumerate() {
        for (day_idx, pattern) in days.iter().enumerate() {
            let mut intervals = Vec::with_capacity(pattern.len() + 2);
            intervals.push(Interval::walk(WARMUP_SECONDS));
            intervals.extend(pattern.iter().map(|&(kind, secs)| Interval::new(kind, secs)));
            intervals.push(Interval::walk(WARMUP_SECONDS));

            sessions.push(Session::new(
                week_idx as u32 + 1,
                day_idx as u8 + 1,
                intervals,
                date,
            ));
            date += Duration::days(SESSION_SPACING_DAYS);
        }
    }

    tracing::debug!(
        "Generated {} sessions starting {}",
        sessions.len(),
        start
    );
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use chrono::Datelike;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()
    }

    #[test]
    fn test_monday_start_yields_27_sessions() {
        let start = monday();
        assert_eq!(start.weekday(), Weekday::Mon);

        let sessions = generate(start);
        assert_eq!(sessions.len(), 27);
        assert_eq!(sessions[0].date, start);

        for pair in sessions.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(2));
        }
    }

    #[test]
    fn test_labels_cycle_through_three_days() {
        let sessions = generate(monday());
        for (i, session) in sessions.iter().enumerate() {
            assert_eq!(session.week, i as u32 / 3 + 1);
            assert_eq!(session.day, (i % 3) as u8 + 1);
        }
        assert_eq!(sessions.last().unwrap().week, program_weeks());
    }

    #[test]
    fn test_every_session_bracketed_by_warmup_and_cooldown() {
        for session in generate(monday()) {
            let first = session.intervals.first().unwrap();
            let last = session.intervals.last().unwrap();
            assert_eq!(first.kind, IntervalKind::Walk);
            assert_eq!(first.duration_seconds, WARMUP_SECONDS);
            assert_eq!(last.kind, IntervalKind::Walk);
            assert_eq!(last.duration_seconds, WARMUP_SECONDS);
            assert!(session.intervals.iter().all(|i| i.duration_seconds > 0));
        }
    }

    #[test]
    fn test_week_one_pattern() {
        let sessions = generate(monday());
        let intervals = &sessions[0].intervals;
        // warm-up + 8 x (run, walk) + cool-down
        assert_eq!(intervals.len(), 18);
        assert_eq!(intervals[1].kind, IntervalKind::Run);
        assert_eq!(intervals[1].duration_seconds, 60);
        assert_eq!(intervals[2].kind, IntervalKind::Walk);
        assert_eq!(intervals[2].duration_seconds, 90);
    }

    #[test]
    fn test_week_five_days_differ() {
        let sessions = generate(monday());
        let run_seconds: Vec<u32> = sessions[12..15]
            .iter()
            .map(|s| {
                s.intervals
                    .iter()
                    .filter(|i| i.kind == IntervalKind::Run)
                    .map(|i| i.duration_seconds)
                    .sum()
            })
            .collect();
        assert_eq!(run_seconds, vec![900, 960, 1200]);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(monday());
        let b = generate(monday());

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!((x.week, x.day, x.date), (y.week, y.day, y.date));
            let xs: Vec<_> = x.intervals.iter().map(|i| (i.kind, i.duration_seconds)).collect();
            let ys: Vec<_> = y.intervals.iter().map(|i| (i.kind, i.duration_seconds)).collect();
            assert_eq!(xs, ys);
        }
    }
}
