use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tactus_commands::{dispatch, Command, CommandTarget};
use tactus_domain::{Bpm, PlaybackState, TimeSignature};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::transport::Metronome;

/// Runs a [`Metronome`] on a tokio runtime.
///
/// Holds the one lock that guards playback state and scheduler together,
/// and the handle of the poll task. Starting arms the task; stopping aborts
/// it, so no pass runs after `stop` returns.
pub struct Driver {
    metronome: Arc<Mutex<Metronome>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
    epoch: Instant,
}

impl Driver {
    pub fn new(metronome: Metronome, runtime: Handle) -> Self {
        Self {
            metronome: Arc::new(Mutex::new(metronome)),
            poll_task: Mutex::new(None),
            runtime,
            epoch: Instant::now(),
        }
    }

    /// Runs `f` with the metronome locked. Do not call back into the driver from `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Metronome) -> R) -> R {
        f(&mut lock(&self.metronome))
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.with(|m| m.state().clone())
    }

    pub fn is_running(&self) -> bool {
        self.with(|m| m.is_running())
    }

    /// Whether a poll task is pending.
    pub fn is_armed(&self) -> bool {
        lock(&self.poll_task)
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn start(&self) -> bool {
        let started = self.with(|m| m.start());
        if started {
            self.arm();
        }
        started
    }

    pub fn stop(&self) -> bool {
        let stopped = self.with(|m| m.stop());
        if stopped {
            self.disarm();
        }
        stopped
    }

    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    pub fn set_bpm(&self, bpm: i64) {
        self.with(|m| m.set_bpm(bpm));
    }

    pub fn set_volume(&self, percent: i64) {
        self.with(|m| m.set_volume(percent));
    }

    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.with(|m| m.set_time_signature(time_signature));
    }

    /// Tap stamped with the time since this driver was created.
    pub fn tap(&self) -> Option<Bpm> {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        self.with(|m| m.tap(now_ms))
    }

    /// Scans one inbound message for commands and applies them.
    pub fn handle_text(&self, message: &str) -> Vec<Command> {
        let mut target = self;
        dispatch(message, &mut target)
    }

    fn arm(&self) {
        let lookahead = self.with(|m| m.scheduler().lookahead);
        let task = self
            .runtime
            .spawn(poll_loop(Arc::clone(&self.metronome), lookahead));
        if let Some(previous) = lock(&self.poll_task).replace(task) {
            previous.abort();
        }
    }

    fn disarm(&self) {
        if let Some(task) = lock(&self.poll_task).take() {
            task.abort();
            debug!("poll task cancelled");
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl CommandTarget for &Driver {
    fn start(&mut self) {
        Driver::start(*self);
    }

    fn stop(&mut self) {
        Driver::stop(*self);
    }

    fn set_bpm(&mut self, bpm: i64) {
        Driver::set_bpm(*self, bpm);
    }

    fn set_time_signature(&mut self, time_signature: TimeSignature) {
        Driver::set_time_signature(*self, time_signature);
    }

    fn set_volume(&mut self, percent: i64) {
        Driver::set_volume(*self, percent);
    }
}

async fn poll_loop(metronome: Arc<Mutex<Metronome>>, lookahead: Duration) {
    loop {
        tokio::time::sleep(lookahead).await;
        let running = {
            let mut guard = lock(&metronome);
            guard.is_running() && {
                guard.poll();
                true
            }
        };
        if !running {
            break;
        }
    }
    debug!("poll loop finished");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
