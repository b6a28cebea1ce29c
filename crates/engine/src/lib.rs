pub mod driver;
pub mod scheduler;
pub mod tap;
pub mod transport;

pub use driver::Driver;
pub use scheduler::Scheduler;
pub use tap::TapTempo;
pub use transport::{Metronome, MetronomeEvent};
