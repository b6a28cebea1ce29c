use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tactus_domain::{Bpm, PlaybackState};
use tactus_engine::MetronomeEvent;
use tracing::trace;

use crate::indicator::BeatIndicator;
use crate::panel::status_line;
use crate::pulse::TapPulse;

/// Console rendering of a metronome, fed by its events.
#[derive(Clone, Debug)]
pub struct ConsoleView {
    state: PlaybackState,
    indicator: BeatIndicator,
    pulse: TapPulse,
    last_estimate: Option<Bpm>,
}

impl ConsoleView {
    pub fn new(state: &PlaybackState) -> Self {
        Self {
            state: state.clone(),
            indicator: BeatIndicator::from_state(state),
            pulse: TapPulse::default(),
            last_estimate: None,
        }
    }

    /// Folds `event` in and returns the line to show, if the event changes
    /// what is on screen.
    pub fn apply(&mut self, event: &MetronomeEvent, now: Instant) -> Option<String> {
        trace!(?event, "view event");
        match event {
            MetronomeEvent::StateChanged(state) => {
                if *state == self.state {
                    return None;
                }
                self.state = state.clone();
                self.indicator.sync(state);
                Some(self.render(now))
            }
            MetronomeEvent::Beat(beat) => {
                self.indicator.light(beat);
                Some(self.render(now))
            }
            MetronomeEvent::Tapped { estimate } => {
                self.pulse.trigger(now);
                if estimate.is_some() {
                    self.last_estimate = *estimate;
                }
                Some(self.render(now))
            }
        }
    }

    pub fn render(&self, now: Instant) -> String {
        let mut line = format!(
            "{}  {}  {}",
            self.indicator.render(),
            status_line(&self.state),
            self.pulse.render(now)
        );
        if let Some(estimate) = self.last_estimate {
            line.push_str(&format!(" ~{}", estimate.get()));
        }
        line
    }

    /// Wraps a shared view as a metronome observer that hands each
    /// rendered line to `sink`.
    pub fn observer(
        view: Arc<Mutex<ConsoleView>>,
        sink: impl Fn(&str) + Send + 'static,
    ) -> impl Fn(&MetronomeEvent) + Send + 'static {
        move |event| {
            let line = view
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(event, Instant::now());
            if let Some(line) = line {
                sink(&line);
            }
        }
    }
}
