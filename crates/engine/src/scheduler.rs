use std::time::Duration;

use tactus_domain::{PlaybackState, ScheduledBeat};

/// Wall-clock interval between scheduling passes.
pub const LOOKAHEAD: Duration = Duration::from_millis(25);
/// How far ahead of the clock a pass schedules, in seconds.
pub const SCHEDULE_AHEAD_TIME: f64 = 0.1;
/// Gap between starting and the first click, in seconds.
pub const START_LEAD: f64 = 0.05;

/// Lookahead scheduler.
///
/// Beat times are absolute clock-domain values advanced by whole beat
/// lengths, so late or irregular polls never accumulate drift: they can
/// only make a click get queued closer to its due time. Each pass reads
/// `state.bpm` per beat, so a tempo edit applies from the next beat queued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scheduler {
    pub lookahead: Duration,
    pub schedule_ahead: f64,
    pub start_lead: f64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            lookahead: LOOKAHEAD,
            schedule_ahead: SCHEDULE_AHEAD_TIME,
            start_lead: START_LEAD,
        }
    }

    /// Puts `state` at the top of a bar with the first beat just ahead of `now`.
    pub fn prime(&self, state: &mut PlaybackState, now: f64) {
        state.current_beat = 1;
        state.next_note_time = now + self.start_lead;
    }

    /// Returns every beat due before `now + schedule_ahead`, oldest first,
    /// advancing `state` past them.
    pub fn poll(&self, state: &mut PlaybackState, now: f64) -> Vec<ScheduledBeat> {
        let horizon = now + self.schedule_ahead;
        let mut beats = Vec::new();
        while state.next_note_time < horizon {
            beats.push(ScheduledBeat::new(state.current_beat, state.next_note_time));
            state.next_note_time += state.bpm.seconds_per_beat();
            state.advance_beat();
        }
        beats
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
