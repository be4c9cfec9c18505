//! Audio/speech cue dispatch.
//!
//! Turns timer events into spoken cues: the interval label once per interval
//! and "Finished" once at the end. Actual playback belongs to a [`CueSink`].

use crate::timer::TimerEvent;
use crate::types::Interval;

/// Label spoken when the last interval ends
pub const FINISHED_CUE: &str = "Finished";

/// Something that can announce a cue to the user
pub trait CueSink {
    fn speak(&mut self, label: &str);
}

/// Cue sink that records labels, useful for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingCues {
    pub spoken: Vec<String>,
}

impl CueSink for RecordingCues {
    fn speak(&mut self, label: &str) {
        self.spoken.push(label.to_string());
    }
}

/// Maps timer events to cues, at most one per interval index
///
/// A transition produces both a full-duration tick and an interval-change
/// event for the same index; only the first one that arrives is spoken.
pub struct CueDispatcher<S: CueSink> {
    sink: S,
    intervals: Vec<Interval>,
    last_spoken: Option<usize>,
    finished_spoken: bool,
}

impl<S: CueSink> CueDispatcher<S> {
    pub fn new(sink: S, intervals: Vec<Interval>) -> Self {
        Self {
            sink,
            intervals,
            last_spoken: None,
            finished_spoken: false,
        }
    }

    pub fn handle(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::Tick { index, .. } | TimerEvent::IntervalChanged { index, .. } => {
                self.announce_interval(*index)
            }
            TimerEvent::Finished => {
                if !self.finished_spoken {
                    self.finished_spoken = true;
                    self.sink.speak(FINISHED_CUE);
                }
            }
        }
    }

    fn announce_interval(&mut self, index: usize) {
        if self.last_spoken == Some(index) {
            return;
        }
        let Some(interval) = self.intervals.get(index) else {
            tracing::warn!("No interval at index {} to announce", index);
            return;
        };
        self.last_spoken = Some(index);
        tracing::debug!("Cue for interval {}: {}", index, interval.kind);
        self.sink.speak(interval.kind.label());
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
