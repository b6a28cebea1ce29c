use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tactus_domain::{JsonSettingsFormat, PersistedSettings, SettingsFormat};
use tracing::debug;

use crate::SettingsStore;

/// JSON settings file on local disk.
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/tactus/settings.json`
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| anyhow!("no config dir"))?;
        Ok(Self::new(base.join("tactus").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    fn save(&self, settings: &PersistedSettings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create settings dir {:?}", dir))?;
        }
        let bytes = JsonSettingsFormat.encode(settings)?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("write settings {:?}", self.path))?;
        debug!(path = ?self.path, "settings written");
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSettings>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read settings {:?}", self.path))
            }
        };
        let settings = JsonSettingsFormat
            .decode(&bytes)
            .with_context(|| format!("decode settings {:?}", self.path))?;
        Ok(Some(settings))
    }
}
