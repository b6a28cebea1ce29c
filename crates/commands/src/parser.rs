use once_cell::sync::Lazy;
use regex::Regex;
use tactus_domain::TimeSignature;
use tracing::{info, warn};

static START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[METRONOME:\s*START\]").expect("start pattern"));
static STOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[METRONOME:\s*STOP\]").expect("stop pattern"));
static BPM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[METRONOME:\s*BPM\s*([0-9]+)\]").expect("bpm pattern"));
static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[METRONOME:\s*TIME\s*([0-9]+)\]").expect("time pattern"));
static VOLUME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[METRONOME:\s*VOLUME\s*([0-9]+)\]").expect("volume pattern"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Bpm(i64),
    /// Raw beats-per-bar argument, not yet validated.
    Time(i64),
    /// Percent.
    Volume(i64),
}

/// Receiver of parsed commands. Setters clamp their own input.
pub trait CommandTarget {
    fn start(&mut self);
    fn stop(&mut self);
    fn set_bpm(&mut self, bpm: i64);
    fn set_time_signature(&mut self, time_signature: TimeSignature);
    fn set_volume(&mut self, percent: i64);
}

/// Finds every directive in `message`. Each kind is matched independently
/// and at most once; results come back in the order start, stop, bpm,
/// time, volume regardless of where they appear in the text.
pub fn parse(message: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    if message.is_empty() {
        return commands;
    }
    if START.is_match(message) {
        commands.push(Command::Start);
    }
    if STOP.is_match(message) {
        commands.push(Command::Stop);
    }
    if let Some(value) = argument(&BPM, message) {
        commands.push(Command::Bpm(value));
    }
    if let Some(value) = argument(&TIME, message) {
        commands.push(Command::Time(value));
    }
    if let Some(value) = argument(&VOLUME, message) {
        commands.push(Command::Volume(value));
    }
    commands
}

/// Parses `message` and applies what it finds to `target`. Returns the
/// commands that were applied; an out-of-range TIME is logged and dropped.
pub fn dispatch<T: CommandTarget + ?Sized>(message: &str, target: &mut T) -> Vec<Command> {
    let mut applied = Vec::new();
    for command in parse(message) {
        match command {
            Command::Start => target.start(),
            Command::Stop => target.stop(),
            Command::Bpm(bpm) => target.set_bpm(bpm),
            Command::Time(beats) => match TimeSignature::new(beats) {
                Ok(time_signature) => target.set_time_signature(time_signature),
                Err(err) => {
                    warn!(beats, %err, "invalid time signature command");
                    continue;
                }
            },
            Command::Volume(percent) => target.set_volume(percent),
        }
        info!(?command, "text command applied");
        applied.push(command);
    }
    applied
}

// ASCII digits only, so the sole parse failure is overflow.
fn argument(pattern: &Regex, message: &str) -> Option<i64> {
    let captures = pattern.captures(message)?;
    let digits = captures.get(1)?.as_str();
    Some(digits.parse::<i64>().unwrap_or(i64::MAX))
}
