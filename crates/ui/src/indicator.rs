use tactus_domain::{PlaybackState, ScheduledBeat};

/// One cell per beat of the bar, with the sounding beat lit.
///
/// The downbeat cell uses round brackets so the top of the bar stays
/// readable even when nothing is lit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeatIndicator {
    beats_per_bar: u8,
    lit: Option<u8>,
}

impl BeatIndicator {
    pub fn new(beats_per_bar: u8) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
            lit: None,
        }
    }

    pub fn from_state(state: &PlaybackState) -> Self {
        Self::new(state.beats_per_bar())
    }

    /// Resizes to the bar in `state`; a stopped transport clears the light.
    pub fn sync(&mut self, state: &PlaybackState) {
        if self.beats_per_bar != state.beats_per_bar() {
            self.beats_per_bar = state.beats_per_bar().max(1);
            self.lit = None;
        }
        if !state.is_running() {
            self.lit = None;
        }
    }

    pub fn light(&mut self, beat: &ScheduledBeat) {
        if (1..=self.beats_per_bar).contains(&beat.beat) {
            self.lit = Some(beat.beat);
        }
    }

    pub fn lit(&self) -> Option<u8> {
        self.lit
    }

    pub fn render(&self) -> String {
        (1..=self.beats_per_bar)
            .map(|beat| {
                let on = self.lit == Some(beat);
                match (beat == 1, on) {
                    (true, true) => "(X)",
                    (true, false) => "( )",
                    (false, true) => "[x]",
                    (false, false) => "[ ]",
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
