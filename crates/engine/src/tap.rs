use std::collections::VecDeque;

use tactus_domain::Bpm;

/// Taps kept for the estimate; older ones age out.
pub const TAP_HISTORY: usize = 4;
/// Silence after which the next tap starts a fresh sequence.
pub const TAP_RESET_MS: u64 = 2_000;

/// Tap-tempo estimator over the most recent taps.
#[derive(Clone, Debug, Default)]
pub struct TapTempo {
    taps: VecDeque<u64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(TAP_HISTORY + 1),
        }
    }

    /// Records a tap at `now_ms` and returns the tempo implied by the taps
    /// in the buffer, if there are at least two and they span a positive
    /// interval.
    pub fn record_tap(&mut self, now_ms: u64) -> Option<Bpm> {
        self.expire(now_ms);
        self.taps.push_back(now_ms);
        while self.taps.len() > TAP_HISTORY {
            self.taps.pop_front();
        }
        self.estimate()
    }

    /// Clears the buffer when the last tap is `TAP_RESET_MS` or more in the
    /// past. Returns whether anything was cleared.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.taps.back() {
            Some(&last) if now_ms.saturating_sub(last) >= TAP_RESET_MS => {
                self.taps.clear();
                true
            }
            _ => false,
        }
    }

    pub fn estimate(&self) -> Option<Bpm> {
        if self.taps.len() < 2 {
            return None;
        }
        let intervals: Vec<i64> = self
            .taps
            .iter()
            .zip(self.taps.iter().skip(1))
            .map(|(a, b)| *b as i64 - *a as i64)
            .collect();
        let average = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;
        Bpm::from_interval_ms(average)
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn taps(&self) -> impl Iterator<Item = u64> + '_ {
        self.taps.iter().copied()
    }

    pub fn clear(&mut self) {
        self.taps.clear();
    }
}
