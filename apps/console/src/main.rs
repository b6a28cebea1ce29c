mod input;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use tactus_audio::{list_output_devices, AudioBackend, CpalBackend, NullBackend, OutputStream};
use tactus_domain::{Bpm, TimeSignature};
use tactus_engine::{Driver, Metronome};
use tactus_services::{FileSettings, HostSettings, LayeredSettings};
use tactus_ui::{time_signature_options, ConsoleView};
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::input::{Input, HELP};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Console metronome with tap tempo and [METRONOME: ...] text commands"
)]
struct Cli {
    /// Tempo to start with, overriding saved settings (clamped to 20..240)
    #[arg(long)]
    bpm: Option<i64>,
    /// Beats per bar (clamped to 1..8)
    #[arg(long)]
    time: Option<i64>,
    /// Volume percent (clamped to 0..100)
    #[arg(long)]
    volume: Option<i64>,
    /// Settings file; defaults to the user config directory
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Output device name; defaults to the system default
    #[arg(long)]
    device: Option<String>,
    /// Print output devices and exit
    #[arg(long)]
    list_devices: bool,
    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,
    /// Start playing immediately
    #[arg(long)]
    start: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.list_devices {
        for name in list_output_devices() {
            println!("{name}");
        }
        return Ok(());
    }

    let rt = Runtime::new()?;
    // The stream must outlive the driver; dropping it silences output.
    let (_stream, audio) = open_audio(&cli);
    let store = settings_store(HostSettings::new(), cli.settings.clone());

    let mut metronome = Metronome::new(audio, Arc::new(store));
    let view = Arc::new(Mutex::new(ConsoleView::new(metronome.state())));
    metronome.subscribe(ConsoleView::observer(view, |line| println!("{line}")));
    let driver = Driver::new(metronome, rt.handle().clone());

    apply_overrides(&driver, &cli);
    if cli.start {
        driver.start();
    }
    info!(state = ?driver.snapshot(), "ready");
    println!("Type `help` for commands.");

    for line in io::stdin().lock().lines() {
        if handle_line(&driver, &line?) == Flow::Quit {
            break;
        }
    }
    driver.stop();
    Ok(())
}

fn open_audio(cli: &Cli) -> (Option<OutputStream>, Arc<dyn AudioBackend>) {
    if cli.no_audio {
        info!("audio disabled");
        return (None, Arc::new(NullBackend::new()));
    }
    match CpalBackend::open(cli.device.as_deref()) {
        Ok((stream, backend)) => {
            let backend: Arc<dyn AudioBackend> = Arc::new(backend);
            (Some(stream), backend)
        }
        Err(err) => {
            error!(%err, "no audio output, clicks will be silent");
            let backend: Arc<dyn AudioBackend> = Arc::new(NullBackend::new());
            (None, backend)
        }
    }
}

/// Host settings first, then the settings file when a location is known.
/// Loads take the first layer holding settings; saves reach both.
fn settings_store(host: HostSettings, path: Option<PathBuf>) -> LayeredSettings {
    let file = match path {
        Some(path) => Ok(FileSettings::new(path)),
        None => FileSettings::default_location(),
    };
    let layers = LayeredSettings::new().with_layer(host);
    match file {
        Ok(file) => {
            info!(path = %file.path().display(), "settings file");
            layers.with_layer(file)
        }
        Err(err) => {
            error!(?err, "no settings location, settings kept in memory");
            layers
        }
    }
}

fn apply_overrides(driver: &Driver, cli: &Cli) {
    if let Some(bpm) = cli.bpm {
        driver.set_bpm(bpm);
    }
    if let Some(beats) = cli.time {
        driver.set_time_signature(TimeSignature::clamped(beats));
    }
    if let Some(volume) = cli.volume {
        driver.set_volume(volume);
    }
}

fn handle_line(driver: &Driver, line: &str) -> Flow {
    match Input::parse(line) {
        Input::Tap => {
            driver.tap();
        }
        Input::Toggle => {
            driver.toggle();
        }
        Input::Start => {
            driver.start();
        }
        Input::Stop => {
            driver.stop();
        }
        Input::Bpm(bpm) => match Bpm::new(bpm) {
            Ok(bpm) => driver.set_bpm(bpm.get() as i64),
            Err(err) => println!("{err}, keeping {}", driver.snapshot().bpm),
        },
        Input::Time(beats) => match TimeSignature::new(beats) {
            Ok(time_signature) => driver.set_time_signature(time_signature),
            Err(err) => println!("{err}"),
        },
        Input::Volume(percent) => driver.set_volume(percent),
        Input::Options => {
            for (_, label) in time_signature_options() {
                println!("{label}");
            }
        }
        Input::Help => println!("{HELP}"),
        Input::Quit => return Flow::Quit,
        Input::Text(text) => {
            let applied = driver.handle_text(&text);
            if applied.is_empty() {
                println!("unrecognised input, type `help`");
            }
        }
    }
    Flow::Continue
}
