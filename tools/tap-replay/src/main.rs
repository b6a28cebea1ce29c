use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tactus_engine::TapTempo;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replay recorded tap timestamps through the tap-tempo estimator"
)]
struct Args {
    /// Path to a JSON array of tap times in milliseconds
    input: PathBuf,
    /// Print one JSON object per tap instead of a table
    #[arg(long)]
    json: bool,
}

/// A bare millisecond value or an object with a `timeMs` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TapRecord {
    Millis(u64),
    #[serde(rename_all = "camelCase")]
    Stamped { time_ms: u64 },
}

impl TapRecord {
    fn time_ms(&self) -> u64 {
        match self {
            TapRecord::Millis(ms) => *ms,
            TapRecord::Stamped { time_ms } => *time_ms,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayStep {
    time_ms: u64,
    reset: bool,
    buffered: usize,
    estimate: Option<u32>,
}

fn replay(taps: &[TapRecord]) -> Vec<ReplayStep> {
    let mut tempo = TapTempo::new();
    taps.iter()
        .map(|tap| {
            let time_ms = tap.time_ms();
            let reset = tempo.expire(time_ms);
            let estimate = tempo.record_tap(time_ms).map(|bpm| bpm.get());
            debug!(time_ms, reset, ?estimate, "tap");
            ReplayStep {
                time_ms,
                reset,
                buffered: tempo.len(),
                estimate,
            }
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let reader = BufReader::new(file);
    let taps: Vec<TapRecord> =
        serde_json::from_reader(reader).context("expected a JSON array of tap times")?;
    info!(count = taps.len(), "loaded taps");

    let steps = replay(&taps);
    for step in &steps {
        if args.json {
            println!("{}", serde_json::to_string(step)?);
            continue;
        }
        let estimate = step
            .estimate
            .map(|bpm| format!("{bpm} BPM"))
            .unwrap_or_else(|| "-".to_string());
        let marker = if step.reset { " (reset)" } else { "" };
        println!(
            "{:>8} ms  taps={}  {}{}",
            step.time_ms, step.buffered, estimate, marker
        );
    }
    if let Some(last) = steps.iter().rev().find_map(|step| step.estimate) {
        println!("Final estimate: {last} BPM");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_mixed_records() {
        let taps: Vec<TapRecord> =
            serde_json::from_str(r#"[0, {"timeMs": 500}, 1000, 1500, 5000, 5400]"#).unwrap();
        let steps = replay(&taps);
        let estimates: Vec<Option<u32>> = steps.iter().map(|s| s.estimate).collect();
        assert_eq!(
            estimates,
            [None, Some(120), Some(120), Some(120), None, Some(150)]
        );
        assert!(steps[4].reset);
        assert_eq!(steps[3].buffered, 4);
        assert_eq!(steps[4].buffered, 1);
    }

    #[test]
    fn step_serializes_camel_case() {
        let step = ReplayStep {
            time_ms: 10,
            reset: false,
            buffered: 1,
            estimate: None,
        };
        assert_eq!(
            serde_json::to_string(&step).unwrap(),
            r#"{"timeMs":10,"reset":false,"buffered":1,"estimate":null}"#
        );
    }
}
