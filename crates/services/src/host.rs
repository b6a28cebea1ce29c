use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tactus_domain::PersistedSettings;

use crate::SettingsStore;

/// Settings object owned by the embedding application. Clones share the
/// same slot, so the host can keep one and hand another to the metronome.
#[derive(Clone, Default)]
pub struct HostSettings {
    slot: Arc<Mutex<Option<PersistedSettings>>>,
}

impl HostSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: PersistedSettings) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(settings))),
        }
    }

    pub fn snapshot(&self) -> Option<PersistedSettings> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SettingsStore for HostSettings {
    fn save(&self, settings: &PersistedSettings) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("host settings lock poisoned"))?;
        *slot = Some(settings.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSettings>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("host settings lock poisoned"))?;
        Ok(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let host = HostSettings::new();
        assert!(host.load().unwrap().is_none());

        let handle = host.clone();
        let settings = PersistedSettings {
            bpm: 72,
            time_signature: "3/4".into(),
            volume: 20,
        };
        handle.save(&settings).unwrap();
        assert_eq!(host.snapshot(), Some(settings));
    }
}
