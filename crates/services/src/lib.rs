pub mod file;
pub mod host;
pub mod layered;

use anyhow::Result;
use tactus_domain::PersistedSettings;

pub use file::FileSettings;
pub use host::HostSettings;
pub use layered::LayeredSettings;

/// Best-effort durable storage for the flat settings record.
pub trait SettingsStore: Send + Sync {
    fn save(&self, settings: &PersistedSettings) -> Result<()>;
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<PersistedSettings>>;
}
