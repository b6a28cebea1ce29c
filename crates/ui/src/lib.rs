pub mod indicator;
pub mod panel;
pub mod pulse;
pub mod view;

pub use indicator::BeatIndicator;
pub use panel::{status_line, time_signature_options};
pub use pulse::{TapPulse, TAP_PULSE};
pub use view::ConsoleView;
