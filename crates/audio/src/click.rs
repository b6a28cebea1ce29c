use tracing::{debug, warn};

use crate::backend::AudioBackend;
use crate::dsp::{Breakpoint, Envelope, Tone, Waveform};

const ATTACK: f64 = 0.005;
const DECAY: f64 = 0.01;
const SUSTAIN_LEVEL: f32 = 0.8;
const RELEASE: f64 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickVoice {
    pub frequency: f32,
    /// Seconds until the envelope reaches silence.
    pub duration: f64,
}

/// A5, long.
pub const DOWNBEAT_VOICE: ClickVoice = ClickVoice {
    frequency: 880.0,
    duration: 0.1,
};

/// A4, short.
pub const BEAT_VOICE: ClickVoice = ClickVoice {
    frequency: 440.0,
    duration: 0.05,
};

/// Turns beats into enveloped sine tones and hands them to a backend.
#[derive(Clone, Debug)]
pub struct ClickEmitter {
    downbeat: ClickVoice,
    beat: ClickVoice,
}

impl ClickEmitter {
    pub fn new(downbeat: ClickVoice, beat: ClickVoice) -> Self {
        Self { downbeat, beat }
    }

    pub fn tone(&self, time: f64, downbeat: bool) -> Tone {
        let voice = if downbeat { self.downbeat } else { self.beat };
        Tone {
            frequency: voice.frequency,
            waveform: Waveform::Sine,
            start: time,
            stop: time + voice.duration + RELEASE,
            envelope: Envelope::new(vec![
                Breakpoint {
                    offset: 0.0,
                    gain: 0.0,
                },
                Breakpoint {
                    offset: ATTACK,
                    gain: 1.0,
                },
                Breakpoint {
                    offset: ATTACK + DECAY,
                    gain: SUSTAIN_LEVEL,
                },
                Breakpoint {
                    offset: voice.duration,
                    gain: 0.0,
                },
            ]),
        }
    }

    /// Queues one click. A backend failure costs this click only.
    pub fn emit(&self, backend: &dyn AudioBackend, time: f64, downbeat: bool) {
        let tone = self.tone(time, downbeat);
        debug!(time, downbeat, frequency = tone.frequency, "emitting click");
        if let Err(err) = backend.schedule_tone(tone) {
            warn!(?err, time, "click dropped");
        }
    }
}

impl Default for ClickEmitter {
    fn default() -> Self {
        Self::new(DOWNBEAT_VOICE, BEAT_VOICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OfflineBackend;
    use approx::assert_relative_eq;

    #[test]
    fn downbeat_is_higher_and_longer() {
        let emitter = ClickEmitter::default();
        let down = emitter.tone(1.0, true);
        let other = emitter.tone(1.0, false);
        assert_eq!(down.frequency, 880.0);
        assert_eq!(other.frequency, 440.0);
        assert_relative_eq!(down.stop, 1.12, epsilon = 1e-9);
        assert_relative_eq!(other.stop, 1.07, epsilon = 1e-9);
    }

    #[test]
    fn envelope_follows_attack_decay_release() {
        let tone = ClickEmitter::default().tone(0.0, false);
        let env = &tone.envelope;
        assert_relative_eq!(env.gain_at(0.0), 0.0);
        assert_relative_eq!(env.gain_at(0.005), 1.0, epsilon = 1e-6);
        assert_relative_eq!(env.gain_at(0.015), 0.8, epsilon = 1e-6);
        assert_relative_eq!(env.gain_at(0.05), 0.0, epsilon = 1e-6);
        assert!(env.gain_at(0.03) < 0.8 && env.gain_at(0.03) > 0.0);
    }

    #[test]
    fn rapid_emits_are_independent_tones() {
        let backend = OfflineBackend::default();
        let emitter = ClickEmitter::default();
        for i in 0..16 {
            emitter.emit(&backend, i as f64 * 0.01, i % 4 == 0);
        }
        let tones = backend.tones();
        assert_eq!(tones.len(), 16);
        assert!(tones.windows(2).all(|w| w[0].start < w[1].start));
    }
}
