pub mod backend;
pub mod click;
pub mod device;
pub mod dsp;
pub mod error;

pub use backend::{AudioBackend, Clock, NullBackend, OfflineBackend, StreamConfig};
pub use click::{ClickEmitter, ClickVoice};
pub use device::{list_output_devices, CpalBackend, OutputStream};
pub use dsp::{mix_into, Breakpoint, Envelope, Tone, Waveform};
pub use error::AudioError;
