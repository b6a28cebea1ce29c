use std::time::{Duration, Instant};

/// How long the tap control stays lit after a tap.
pub const TAP_PULSE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, Default)]
pub struct TapPulse {
    until: Option<Instant>,
}

impl TapPulse {
    pub fn trigger(&mut self, now: Instant) {
        self.until = Some(now + TAP_PULSE);
    }

    pub fn is_lit(&self, now: Instant) -> bool {
        self.until.map(|until| now < until).unwrap_or(false)
    }

    pub fn render(&self, now: Instant) -> &'static str {
        if self.is_lit(now) {
            "TAP*"
        } else {
            "TAP"
        }
    }
}
