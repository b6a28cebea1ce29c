use std::sync::Arc;

use tactus_audio::{AudioBackend, ClickEmitter};
use tactus_commands::CommandTarget;
use tactus_domain::{
    Bpm, PersistedSettings, PlaybackState, ScheduledBeat, TimeSignature, TransportState, Volume,
};
use tactus_services::SettingsStore;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduler::Scheduler;
use crate::tap::TapTempo;

#[derive(Clone, Debug, PartialEq)]
pub enum MetronomeEvent {
    /// Sent after every transport transition and parameter change.
    StateChanged(PlaybackState),
    /// Sent when a beat is handed to the audio backend, ahead of its due time.
    Beat(ScheduledBeat),
    Tapped { estimate: Option<Bpm> },
}

type Observer = Box<dyn Fn(&MetronomeEvent) + Send>;

/// One metronome: playback state, scheduler and tap buffer, plus the
/// collaborators it talks to. Every mutation goes through the methods
/// below, which notify observers and persist settings.
///
/// Observers run synchronously inside these calls and must not call back
/// into the metronome.
pub struct Metronome {
    state: PlaybackState,
    scheduler: Scheduler,
    taps: TapTempo,
    clicks: ClickEmitter,
    audio: Arc<dyn AudioBackend>,
    store: Arc<dyn SettingsStore>,
    observers: Vec<Observer>,
}

impl Metronome {
    /// Builds a stopped metronome from whatever `store` holds, falling back
    /// to defaults when it holds nothing readable.
    pub fn new(audio: Arc<dyn AudioBackend>, store: Arc<dyn SettingsStore>) -> Self {
        let mut state = PlaybackState::new();
        match store.load() {
            Ok(Some(settings)) => {
                settings.apply_to(&mut state);
                debug!(?settings, "settings restored");
            }
            Ok(None) => debug!("no stored settings, using defaults"),
            Err(err) => error!(?err, "error loading settings, using defaults"),
        }
        audio.set_master_volume(state.volume.gain());
        Self {
            state,
            scheduler: Scheduler::new(),
            taps: TapTempo::new(),
            clicks: ClickEmitter::default(),
            audio,
            store,
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn taps(&self) -> &TapTempo {
        &self.taps
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn subscribe(&mut self, observer: impl Fn(&MetronomeEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Returns `false` when already running. The first pass is scheduled
    /// before returning; re-arming later passes is up to the caller.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        if let Err(err) = self.audio.resume() {
            error!(?err, "audio output unavailable, running silent");
        }
        self.state.transport = TransportState::Running;
        self.scheduler
            .prime(&mut self.state, self.audio.current_time());
        self.poll();
        self.publish();
        self.persist();
        info!(
            bpm = self.state.bpm.get(),
            time_signature = %self.state.time_signature,
            "metronome started"
        );
        true
    }

    /// Returns `false` when already stopped. Clicks already queued on the
    /// backend still play.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state.transport = TransportState::Stopped;
        self.state.current_beat = 1;
        self.publish();
        self.persist();
        info!("metronome stopped");
        true
    }

    /// Returns whether the metronome is running afterwards.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    /// One scheduling pass against the backend clock. Does nothing while
    /// stopped. Returns the number of beats queued.
    pub fn poll(&mut self) -> usize {
        if !self.is_running() {
            return 0;
        }
        let now = self.audio.current_time();
        let beats = self.scheduler.poll(&mut self.state, now);
        for beat in &beats {
            self.clicks
                .emit(self.audio.as_ref(), beat.time, beat.downbeat);
            self.notify(&MetronomeEvent::Beat(*beat));
        }
        beats.len()
    }

    pub fn set_bpm(&mut self, bpm: i64) {
        self.state.bpm = Bpm::clamped(bpm);
        debug!(bpm = self.state.bpm.get(), "tempo set");
        self.publish();
        self.persist();
    }

    /// `percent` is clamped to `0..=100`.
    pub fn set_volume(&mut self, percent: i64) {
        self.state.volume = Volume::from_percent(percent);
        self.audio.set_master_volume(self.state.volume.gain());
        debug!(volume = %self.state.volume, "volume set");
        self.publish();
        self.persist();
    }

    /// Restarts counting from the downbeat.
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.state.set_time_signature(time_signature);
        info!(%time_signature, "time signature set");
        self.publish();
        self.persist();
    }

    /// Feeds a tap at `now_ms` to the estimator and applies any estimate as
    /// the new tempo.
    pub fn tap(&mut self, now_ms: u64) -> Option<Bpm> {
        let estimate = self.taps.record_tap(now_ms);
        if let Some(bpm) = estimate {
            info!(bpm = bpm.get(), "tap tempo calculated");
            self.set_bpm(bpm.get() as i64);
        }
        self.notify(&MetronomeEvent::Tapped { estimate });
        estimate
    }

    /// Drops stale taps without waiting for the next tap.
    pub fn expire_taps(&mut self, now_ms: u64) -> bool {
        self.taps.expire(now_ms)
    }

    fn publish(&self) {
        self.notify(&MetronomeEvent::StateChanged(self.state.clone()));
    }

    fn notify(&self, event: &MetronomeEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    fn persist(&self) {
        let settings = PersistedSettings::from_state(&self.state);
        if let Err(err) = self.store.save(&settings) {
            warn!(?err, "failed to persist settings");
        }
    }
}

impl CommandTarget for Metronome {
    fn start(&mut self) {
        Metronome::start(self);
    }

    fn stop(&mut self) {
        Metronome::stop(self);
    }

    fn set_bpm(&mut self, bpm: i64) {
        Metronome::set_bpm(self, bpm);
    }

    fn set_time_signature(&mut self, time_signature: TimeSignature) {
        Metronome::set_time_signature(self, time_signature);
    }

    fn set_volume(&mut self, percent: i64) {
        Metronome::set_volume(self, percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use approx::assert_relative_eq;
    use tactus_audio::OfflineBackend;
    use tactus_services::HostSettings;

    fn fixture() -> (Metronome, Arc<OfflineBackend>, HostSettings) {
        let audio = Arc::new(OfflineBackend::default());
        let store = HostSettings::new();
        let metronome = Metronome::new(audio.clone(), Arc::new(store.clone()));
        (metronome, audio, store)
    }

    #[test]
    fn set_bpm_clamps_and_persists() {
        let (mut metronome, _audio, store) = fixture();
        for (input, expected) in [(-10, 20), (0, 20), (20, 20), (97, 97), (240, 240), (500, 240)] {
            metronome.set_bpm(input);
            assert_eq!(metronome.state().bpm.get(), expected);
            assert_eq!(store.snapshot().unwrap().bpm, expected as i64);
        }
    }

    #[test]
    fn set_volume_clamps_and_reaches_backend() {
        let (mut metronome, audio, store) = fixture();
        for (input, expected) in [(-1, 0.0), (0, 0.0), (42, 0.42), (100, 1.0), (250, 1.0)] {
            metronome.set_volume(input);
            assert_relative_eq!(metronome.state().volume.gain(), expected, epsilon = 1e-6);
            assert_relative_eq!(audio.master_volume(), expected, epsilon = 1e-6);
        }
        assert_eq!(store.snapshot().unwrap().volume, 100);
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let (mut metronome, audio, _store) = fixture();
        assert!(metronome.start());
        let once = metronome.state().clone();
        let tones = audio.tones().len();

        assert!(!metronome.start());
        assert_eq!(metronome.state(), &once);
        assert_eq!(audio.tones().len(), tones);
        assert!(audio.is_resumed());
    }

    #[test]
    fn start_queues_the_first_downbeat() {
        let (mut metronome, audio, _store) = fixture();
        audio.set_time(3.0);
        metronome.start();
        let tones = audio.tones();
        assert_eq!(tones.len(), 1);
        assert_relative_eq!(tones[0].start, 3.05, epsilon = 1e-9);
        assert_eq!(tones[0].frequency, 880.0);
    }

    #[test]
    fn simulated_run_with_backend_clock() {
        let (mut metronome, audio, _store) = fixture();
        metronome.start();
        for _ in 0..79 {
            audio.advance(0.025);
            metronome.poll();
        }
        let starts: Vec<f64> = audio.tones().iter().map(|t| t.start).collect();
        assert_eq!(starts.len(), 5);
        assert_eq!(starts.iter().filter(|s| **s < 2.0).count(), 4);
        let pitches: Vec<f32> = audio.tones().iter().map(|t| t.frequency).collect();
        assert_eq!(pitches, [880.0, 440.0, 440.0, 440.0, 880.0]);
    }

    #[test]
    fn stop_resets_and_silences_future_polls() {
        let (mut metronome, audio, _store) = fixture();
        assert!(!metronome.stop());
        metronome.start();
        audio.advance(0.6);
        metronome.poll();
        assert_eq!(metronome.state().current_beat, 3);

        assert!(metronome.stop());
        assert_eq!(metronome.state().current_beat, 1);
        assert_eq!(metronome.state().transport, TransportState::Stopped);
        let queued = audio.tones().len();
        audio.advance(5.0);
        assert_eq!(metronome.poll(), 0);
        assert_eq!(audio.tones().len(), queued);
    }

    #[test]
    fn toggle_flips_state() {
        let (mut metronome, _audio, _store) = fixture();
        assert!(metronome.toggle());
        assert!(!metronome.toggle());
        assert!(!metronome.is_running());
    }

    #[test]
    fn time_signature_change_resets_beat() {
        let (mut metronome, audio, store) = fixture();
        metronome.start();
        audio.advance(0.6);
        metronome.poll();
        assert_ne!(metronome.state().current_beat, 1);

        metronome.set_time_signature(TimeSignature::new(3).unwrap());
        assert_eq!(metronome.state().current_beat, 1);
        assert_eq!(metronome.state().beats_per_bar(), 3);
        assert!(metronome.is_running());
        assert_eq!(store.snapshot().unwrap().time_signature, "3/4");
    }

    #[test]
    fn bpm_change_while_running_does_not_stop() {
        let (mut metronome, audio, _store) = fixture();
        metronome.start();
        metronome.set_bpm(60);
        assert!(metronome.is_running());
        audio.advance(0.5);
        metronome.poll();
        let starts: Vec<f64> = audio.tones().iter().map(|t| t.start).collect();
        // The beat queued at start was computed at 120 BPM; the next one
        // follows at the new tempo.
        assert_relative_eq!(starts[1] - starts[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(metronome.state().next_note_time, 1.55, epsilon = 1e-9);
    }

    #[test]
    fn taps_set_the_tempo() {
        let (mut metronome, _audio, _store) = fixture();
        assert_eq!(metronome.tap(10_000), None);
        assert_eq!(metronome.tap(10_750).map(Bpm::get), Some(80));
        assert_eq!(metronome.state().bpm.get(), 80);
        assert!(metronome.expire_taps(13_000));
        assert_eq!(metronome.tap(13_100), None);
        assert_eq!(metronome.state().bpm.get(), 80);
    }

    #[test]
    fn observers_see_state_beats_and_taps() {
        let (mut metronome, _audio, _store) = fixture();
        let seen: Arc<Mutex<Vec<MetronomeEvent>>> = Arc::default();
        let sink = seen.clone();
        metronome.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        metronome.start();
        metronome.tap(0);
        let events = seen.lock().unwrap().clone();
        assert!(matches!(events[0], MetronomeEvent::Beat(b) if b.beat == 1 && b.downbeat));
        assert!(matches!(&events[1], MetronomeEvent::StateChanged(s) if s.is_running()));
        assert_eq!(events[2], MetronomeEvent::Tapped { estimate: None });
    }

    #[test]
    fn settings_survive_a_restart() {
        let audio = Arc::new(OfflineBackend::default());
        let store = HostSettings::new();
        let mut first = Metronome::new(audio.clone(), Arc::new(store.clone()));
        first.set_bpm(150);
        first.set_time_signature(TimeSignature::new(6).unwrap());
        first.set_volume(35);

        let second = Metronome::new(audio.clone(), Arc::new(store));
        assert_eq!(second.state().bpm.get(), 150);
        assert_eq!(second.state().beats_per_bar(), 6);
        assert_eq!(second.state().volume.percent(), 35);
        assert!(!second.is_running());
        assert_relative_eq!(audio.master_volume(), 0.35, epsilon = 1e-6);
    }

    #[test]
    fn unreadable_store_falls_back_to_defaults() {
        struct Corrupt;
        impl SettingsStore for Corrupt {
            fn save(&self, _: &PersistedSettings) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("disk full"))
            }
            fn load(&self) -> anyhow::Result<Option<PersistedSettings>> {
                Err(anyhow::anyhow!("bad json"))
            }
        }

        let mut metronome = Metronome::new(Arc::new(OfflineBackend::default()), Arc::new(Corrupt));
        assert_eq!(metronome.state(), &PlaybackState::new());
        metronome.set_bpm(100);
        assert_eq!(metronome.state().bpm.get(), 100);
    }

    #[test]
    fn text_commands_drive_the_metronome() {
        let (mut metronome, _audio, _store) = fixture();
        tactus_commands::dispatch("hello [METRONOME: BPM 90] world", &mut metronome);
        assert_eq!(metronome.state().bpm.get(), 90);
        assert!(!metronome.is_running());

        tactus_commands::dispatch("[METRONOME: TIME 9]", &mut metronome);
        assert_eq!(metronome.state().beats_per_bar(), 4);

        tactus_commands::dispatch("[METRONOME: START] [METRONOME: VOLUME 10]", &mut metronome);
        assert!(metronome.is_running());
        assert_eq!(metronome.state().volume.percent(), 10);
    }
}
