use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use tracing::{debug, error, info};

use crate::backend::{AudioBackend, Clock, StreamConfig};
use crate::dsp::{mix_into, Tone};
use crate::error::AudioError;

const TONE_QUEUE_CAPACITY: usize = 256;
const MAX_ACTIVE_TONES: usize = 64;

struct Shared {
    sample_rate: u32,
    frames: AtomicU64,
    volume: AtomicU32,
    resumed: AtomicBool,
    /// Tones the callback had no voice for, since last reported.
    dropped: AtomicU64,
}

/// Keeps the device stream alive. Dropping it stops all output.
///
/// `cpal::Stream` is not `Send` on every platform, so the stream stays with
/// whoever opened it while the [`CpalBackend`] half travels to the engine.
pub struct OutputStream {
    _stream: cpal::Stream,
}

/// Output on a cpal device. The clock counts rendered frames, so scheduled
/// tones line up with the samples actually written.
pub struct CpalBackend {
    shared: Arc<Shared>,
    queue: Mutex<HeapProducer<Tone>>,
}

impl CpalBackend {
    /// Opens `device_name`, or the host's default output when `None` or not found.
    /// Output stays silent until [`AudioBackend::resume`] is called.
    pub fn open(device_name: Option<&str>) -> Result<(OutputStream, CpalBackend), AudioError> {
        let device = find_output_device(device_name).ok_or(AudioError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|err| AudioError::Stream(err.to_string()))?;
        let sample_format = supported.sample_format();
        let stream_config = supported.config();
        let config = StreamConfig {
            sample_rate: stream_config.sample_rate.0,
            channels: stream_config.channels,
        };
        let shared = Arc::new(Shared {
            sample_rate: config.sample_rate,
            frames: AtomicU64::new(0),
            volume: AtomicU32::new(1f32.to_bits()),
            resumed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        });
        let (producer, consumer) = HeapRb::<Tone>::new(TONE_QUEUE_CAPACITY).split();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, shared.clone(), consumer)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, shared.clone(), consumer)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, shared.clone(), consumer)?,
            other => {
                return Err(AudioError::Stream(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };
        stream
            .play()
            .map_err(|err| AudioError::Stream(err.to_string()))?;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate = config.sample_rate,
            channels = config.channels,
            "audio output opened"
        );

        Ok((
            OutputStream { _stream: stream },
            CpalBackend {
                shared,
                queue: Mutex::new(producer),
            },
        ))
    }

}

impl Clock for CpalBackend {
    fn current_time(&self) -> f64 {
        self.shared.frames.load(Ordering::SeqCst) as f64 / self.shared.sample_rate as f64
    }
}

impl AudioBackend for CpalBackend {
    fn set_master_volume(&self, volume: f32) {
        self.shared
            .volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    fn resume(&self) -> Result<(), AudioError> {
        if !self.shared.resumed.swap(true, Ordering::SeqCst) {
            debug!("audio output resumed");
        }
        Ok(())
    }

    fn schedule_tone(&self, tone: Tone) -> Result<(), AudioError> {
        let dropped = self.shared.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            debug!(dropped, "tones dropped, all voices busy");
        }
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| AudioError::Stream("tone queue poisoned".into()))?;
        queue.push(tone).map_err(|_| AudioError::QueueFull)
    }
}

pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.output_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(err) => {
            error!(%err, "failed to enumerate output devices");
            Vec::new()
        }
    }
}

fn find_output_device(target: Option<&str>) -> Option<cpal::Device> {
    if let Some(name) = target {
        for host_id in cpal::available_hosts() {
            let Ok(host) = cpal::host_from_id(host_id) else {
                continue;
            };
            let Ok(devices) = host.output_devices() else {
                continue;
            };
            for device in devices {
                if device.name().map(|n| n == name).unwrap_or(false) {
                    return Some(device);
                }
            }
        }
        info!(device = name, "output device not found, using default");
    }
    cpal::default_host().default_output_device()
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Shared>,
    mut queue: HeapConsumer<Tone>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut active: Vec<Tone> = Vec::with_capacity(MAX_ACTIVE_TONES);
    let mut mix: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = (data.len() / channels.max(1)) as u64;
                let first_frame = shared.frames.fetch_add(frames, Ordering::SeqCst);
                let start_time = first_frame as f64 / shared.sample_rate as f64;

                while let Some(tone) = queue.pop() {
                    admit(&mut active, tone, &shared.dropped);
                }
                active.retain(|tone| !tone.is_finished_at(start_time));

                let gain = if shared.resumed.load(Ordering::Relaxed) {
                    f32::from_bits(shared.volume.load(Ordering::Relaxed))
                } else {
                    0.0
                };
                mix.resize(data.len(), 0.0);
                mix_into(&mut mix, channels, start_time, shared.sample_rate, gain, &active);
                for (out, sample) in data.iter_mut().zip(mix.iter()) {
                    *out = T::from_sample(*sample);
                }
            },
            |err| error!(%err, "audio output stream error"),
            None,
        )
        .map_err(|err| AudioError::Stream(err.to_string()))
}

fn admit(active: &mut Vec<Tone>, tone: Tone, dropped: &AtomicU64) {
    if active.len() < MAX_ACTIVE_TONES {
        active.push(tone);
    } else {
        dropped.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Breakpoint, Envelope, Waveform};

    fn tone(start: f64) -> Tone {
        Tone {
            frequency: 440.0,
            waveform: Waveform::Sine,
            start,
            stop: start + 0.05,
            envelope: Envelope::new(vec![Breakpoint { offset: 0.0, gain: 1.0 }]),
        }
    }

    #[test]
    fn full_voice_table_counts_drops() {
        let dropped = AtomicU64::new(0);
        let mut active = Vec::new();
        for i in 0..MAX_ACTIVE_TONES + 3 {
            admit(&mut active, tone(i as f64), &dropped);
        }
        assert_eq!(active.len(), MAX_ACTIVE_TONES);
        assert_eq!(dropped.load(Ordering::Relaxed), 3);
    }
}
