use std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

impl Waveform {
    /// One period over `phase` in `0.0..1.0`.
    fn sample(self, phase: f64) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin() as f32,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => (1.0 - 4.0 * (phase - 0.5).abs()) as f32,
        }
    }
}

/// Gain breakpoint, `offset` seconds after the tone starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breakpoint {
    pub offset: f64,
    pub gain: f32,
}

/// Piecewise-linear gain curve. Before the first breakpoint the first gain
/// holds, after the last the last gain holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    points: Vec<Breakpoint>,
}

impl Envelope {
    pub fn new(mut points: Vec<Breakpoint>) -> Self {
        points.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { points }
    }

    pub fn gain_at(&self, offset: f64) -> f32 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };
        if offset <= first.offset {
            return first.gain;
        }
        if offset >= last.offset {
            return last.gain;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if offset <= b.offset {
                let span = b.offset - a.offset;
                if span <= 0.0 {
                    return b.gain;
                }
                let t = ((offset - a.offset) / span) as f32;
                return a.gain + (b.gain - a.gain) * t;
            }
        }
        last.gain
    }
}

/// A single sound-producing instruction: an oscillator that runs from
/// `start` to `stop` (clock-domain seconds) shaped by `envelope`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub waveform: Waveform,
    pub start: f64,
    pub stop: f64,
    pub envelope: Envelope,
}

impl Tone {
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && time < self.stop
    }

    pub fn is_finished_at(&self, time: f64) -> bool {
        time >= self.stop
    }

    pub fn sample_at(&self, time: f64) -> f32 {
        if !self.is_active_at(time) {
            return 0.0;
        }
        let elapsed = time - self.start;
        let phase = (elapsed * self.frequency as f64).fract();
        self.waveform.sample(phase) * self.envelope.gain_at(elapsed)
    }
}

/// Mixes `tones` into an interleaved `buffer` whose first frame sits at
/// `start_time`. Every channel receives the same signal; the result is
/// clamped to `-1.0..=1.0`.
pub fn mix_into(
    buffer: &mut [f32],
    channels: usize,
    start_time: f64,
    sample_rate: u32,
    master_gain: f32,
    tones: &[Tone],
) {
    let channels = channels.max(1);
    let step = 1.0 / sample_rate.max(1) as f64;
    for (index, frame) in buffer.chunks_mut(channels).enumerate() {
        let time = start_time + index as f64 * step;
        let mut value = 0.0f32;
        for tone in tones {
            value += tone.sample_at(time);
        }
        let value = (value * master_gain).clamp(-1.0, 1.0);
        for sample in frame {
            *sample = value;
        }
    }
}
