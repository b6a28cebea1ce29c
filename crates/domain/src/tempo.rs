use std::fmt;
use std::str::FromStr;

use crate::DomainError;

pub const MIN_BPM: u32 = 20;
pub const MAX_BPM: u32 = 240;
pub const MIN_BEATS_PER_BAR: u8 = 1;
pub const MAX_BEATS_PER_BAR: u8 = 8;

/// Tempo in beats per minute, always inside `MIN_BPM..=MAX_BPM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bpm(u32);

impl Bpm {
    pub const DEFAULT: Bpm = Bpm(120);

    pub fn new(value: i64) -> Result<Self, DomainError> {
        let range = MIN_BPM as i64..=MAX_BPM as i64;
        if !range.contains(&value) {
            return Err(DomainError::out_of_range("bpm", value, range));
        }
        Ok(Self(value as u32))
    }

    /// Saturates any integer into the valid tempo range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_BPM as i64, MAX_BPM as i64) as u32)
    }

    /// Converts an average beat interval into a rounded, clamped tempo.
    /// Returns `None` for intervals that are zero, negative or not finite.
    pub fn from_interval_ms(interval_ms: f64) -> Option<Self> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            return None;
        }
        Some(Self::clamped((60_000.0 / interval_ms).round() as i64))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn seconds_per_beat(self) -> f64 {
        60.0 / self.0 as f64
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Master gain in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    pub const DEFAULT: Volume = Volume(0.5);

    pub fn from_percent(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as f32 / 100.0)
    }

    pub fn gain(self) -> f32 {
        self.0
    }

    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Beats per bar. The denominator is always a quarter note; it only
/// matters for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    beats_per_bar: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { beats_per_bar: 4 };

    /// Choices offered to the user, in display order.
    pub const OPTIONS: [TimeSignature; 5] = [
        TimeSignature { beats_per_bar: 1 },
        TimeSignature { beats_per_bar: 2 },
        TimeSignature { beats_per_bar: 3 },
        TimeSignature { beats_per_bar: 4 },
        TimeSignature { beats_per_bar: 6 },
    ];

    pub fn new(beats_per_bar: i64) -> Result<Self, DomainError> {
        let range = MIN_BEATS_PER_BAR as i64..=MAX_BEATS_PER_BAR as i64;
        if !range.contains(&beats_per_bar) {
            return Err(DomainError::out_of_range(
                "beats per bar",
                beats_per_bar,
                range,
            ));
        }
        Ok(Self {
            beats_per_bar: beats_per_bar as u8,
        })
    }

    pub fn clamped(beats_per_bar: i64) -> Self {
        Self {
            beats_per_bar: beats_per_bar
                .clamp(MIN_BEATS_PER_BAR as i64, MAX_BEATS_PER_BAR as i64)
                as u8,
        }
    }

    pub fn beats_per_bar(self) -> u8 {
        self.beats_per_bar
    }

    /// Label shown next to the option. Six beats are presented as "6/8" and a
    /// single beat as "1/1"; neither changes how beats are counted.
    pub fn label(self) -> String {
        match self.beats_per_bar {
            1 => "1/1".to_string(),
            6 => "6/8".to_string(),
            n => format!("{n}/4"),
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

/// Persisted form, always `N/4`.
impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/4", self.beats_per_bar)
    }
}

impl FromStr for TimeSignature {
    type Err = DomainError;

    /// Reads the numerator of `N/D` (or a bare `N`); the denominator is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numerator = s.split('/').next().unwrap_or_default().trim();
        let beats = numerator
            .parse::<i64>()
            .map_err(|_| DomainError::TimeSignature(s.to_string()))?;
        Self::new(beats)
    }
}
