use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::debug;

use crate::dsp::{mix_into, Tone};
use crate::error::AudioError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

/// Monotonic time source, in seconds.
pub trait Clock: Send + Sync {
    fn current_time(&self) -> f64;
}

/// The audio subsystem as seen by the metronome.
pub trait AudioBackend: Clock {
    fn set_master_volume(&self, volume: f32);
    /// Brings a suspended output to life. Called on every transport start.
    fn resume(&self) -> Result<(), AudioError>;
    fn schedule_tone(&self, tone: Tone) -> Result<(), AudioError>;
}

/// Used when no output device exists. Keeps time, discards sound.
pub struct NullBackend {
    origin: Instant,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for NullBackend {
    fn current_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl AudioBackend for NullBackend {
    fn set_master_volume(&self, _volume: f32) {}

    fn resume(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn schedule_tone(&self, tone: Tone) -> Result<(), AudioError> {
        debug!(start = tone.start, frequency = tone.frequency, "null backend dropped tone");
        Ok(())
    }
}

/// Backend with a hand-driven clock that keeps every scheduled tone.
///
/// Lets callers run the metronome faster or slower than real time and render
/// the result into a buffer.
pub struct OfflineBackend {
    config: StreamConfig,
    now: AtomicU64,
    volume: AtomicU32,
    resumed: AtomicBool,
    tones: Mutex<Vec<Tone>>,
}

impl OfflineBackend {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            now: AtomicU64::new(0f64.to_bits()),
            volume: AtomicU32::new(1f32.to_bits()),
            resumed: AtomicBool::new(false),
            tones: Mutex::new(Vec::new()),
        }
    }

    pub fn set_time(&self, seconds: f64) {
        self.now.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set_time(self.current_time() + seconds);
    }

    pub fn master_volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::SeqCst))
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed.load(Ordering::SeqCst)
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.tones
            .lock()
            .map(|tones| tones.clone())
            .unwrap_or_default()
    }

    /// Renders `frames` interleaved frames starting at `start` seconds.
    pub fn render(&self, start: f64, frames: usize) -> Vec<f32> {
        let channels = self.config.channels as usize;
        let mut buffer = vec![0.0f32; frames * channels];
        let tones = self.tones();
        mix_into(
            &mut buffer,
            channels,
            start,
            self.config.sample_rate,
            self.master_volume(),
            &tones,
        );
        buffer
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl Clock for OfflineBackend {
    fn current_time(&self) -> f64 {
        f64::from_bits(self.now.load(Ordering::SeqCst))
    }
}

impl AudioBackend for OfflineBackend {
    fn set_master_volume(&self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::SeqCst);
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.resumed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn schedule_tone(&self, tone: Tone) -> Result<(), AudioError> {
        let mut tones = self
            .tones
            .lock()
            .map_err(|_| AudioError::Stream("tone list poisoned".into()))?;
        tones.push(tone);
        Ok(())
    }
}
