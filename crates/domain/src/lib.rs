pub mod error;
pub mod io;
pub mod settings;
pub mod state;
pub mod tempo;

pub use crate::error::DomainError;
pub use crate::io::{JsonSettingsFormat, SettingsFormat};
pub use crate::settings::PersistedSettings;
pub use crate::state::{PlaybackState, ScheduledBeat, TransportState};
pub use crate::tempo::{Bpm, TimeSignature, Volume};
