use serde::{Deserialize, Serialize};

use crate::state::PlaybackState;
use crate::tempo::{Bpm, TimeSignature, Volume};

/// Durable projection of [`PlaybackState`].
///
/// Values are stored loosely typed so that a hand-edited or stale record
/// still loads; [`PersistedSettings::apply_to`] does the clamping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSettings {
    pub bpm: i64,
    pub time_signature: String,
    /// Percent, `0..=100`.
    pub volume: i64,
}

impl PersistedSettings {
    pub fn from_state(state: &PlaybackState) -> Self {
        Self {
            bpm: state.bpm.get() as i64,
            time_signature: state.time_signature.to_string(),
            volume: state.volume.percent() as i64,
        }
    }

    /// Copies the stored values onto `state`. A zero bpm or an unreadable
    /// time signature leaves the current value in place.
    pub fn apply_to(&self, state: &mut PlaybackState) {
        if self.bpm != 0 {
            state.bpm = Bpm::clamped(self.bpm);
        }
        if let Ok(time_signature) = self.time_signature.parse::<TimeSignature>() {
            state.set_time_signature(time_signature);
        }
        state.volume = Volume::from_percent(self.volume);
    }
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self::from_state(&PlaybackState::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_of_state() {
        let mut state = PlaybackState::new();
        state.bpm = Bpm::clamped(96);
        state.set_time_signature(TimeSignature::new(6).unwrap());
        state.volume = Volume::from_percent(73);

        let settings = PersistedSettings::from_state(&state);
        assert_eq!(settings.bpm, 96);
        assert_eq!(settings.time_signature, "6/4");
        assert_eq!(settings.volume, 73);

        let mut restored = PlaybackState::new();
        settings.apply_to(&mut restored);
        assert_eq!(restored.bpm, state.bpm);
        assert_eq!(restored.time_signature, state.time_signature);
        assert_eq!(restored.volume.percent(), 73);
    }

    #[test]
    fn apply_clamps_and_skips_bad_values() {
        let settings = PersistedSettings {
            bpm: 999,
            time_signature: "12/4".into(),
            volume: -20,
        };
        let mut state = PlaybackState::new();
        settings.apply_to(&mut state);
        assert_eq!(state.bpm.get(), 240);
        assert_eq!(state.beats_per_bar(), 4);
        assert_eq!(state.volume.gain(), 0.0);

        let zero = PersistedSettings {
            bpm: 0,
            ..PersistedSettings::default()
        };
        let mut state = PlaybackState::new();
        zero.apply_to(&mut state);
        assert_eq!(state.bpm, Bpm::DEFAULT);
    }
}
