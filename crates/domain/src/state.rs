use crate::tempo::{Bpm, TimeSignature, Volume};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn label(self) -> &'static str {
        match self {
            TransportState::Stopped => "STOPPED",
            TransportState::Running => "RUNNING",
        }
    }
}

/// One click produced by a scheduling pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledBeat {
    /// 1-based position inside the bar.
    pub beat: u8,
    /// Clock-domain time in seconds.
    pub time: f64,
    pub downbeat: bool,
}

impl ScheduledBeat {
    pub fn new(beat: u8, time: f64) -> Self {
        Self {
            beat,
            time,
            downbeat: beat == 1,
        }
    }
}

/// Everything the transport knows about playback.
///
/// `current_beat` stays inside `1..=beats_per_bar`; the mutators below keep
/// that true when the bar length changes.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub transport: TransportState,
    pub bpm: Bpm,
    pub time_signature: TimeSignature,
    pub current_beat: u8,
    pub next_note_time: f64,
    pub volume: Volume,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            transport: TransportState::Stopped,
            bpm: Bpm::DEFAULT,
            time_signature: TimeSignature::COMMON,
            current_beat: 1,
            next_note_time: 0.0,
            volume: Volume::DEFAULT,
        }
    }

    pub fn is_running(&self) -> bool {
        self.transport == TransportState::Running
    }

    pub fn beats_per_bar(&self) -> u8 {
        self.time_signature.beats_per_bar()
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.current_beat = 1;
    }

    /// Moves to the following beat, wrapping to 1 after the last beat of the bar.
    pub fn advance_beat(&mut self) {
        self.current_beat = if self.current_beat >= self.beats_per_bar() {
            1
        } else {
            self.current_beat + 1
        };
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_at_bar_end() {
        let mut state = PlaybackState::new();
        state.set_time_signature(TimeSignature::new(3).unwrap());
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(state.current_beat);
            state.advance_beat();
        }
        assert_eq!(seen, [1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn time_signature_change_resets_beat() {
        let mut state = PlaybackState::new();
        state.advance_beat();
        state.advance_beat();
        assert_eq!(state.current_beat, 3);
        state.set_time_signature(TimeSignature::new(2).unwrap());
        assert_eq!(state.current_beat, 1);
    }

    #[test]
    fn downbeat_is_beat_one() {
        assert!(ScheduledBeat::new(1, 0.0).downbeat);
        assert!(!ScheduledBeat::new(2, 0.5).downbeat);
    }
}
