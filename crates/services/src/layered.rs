use anyhow::{anyhow, Result};
use tactus_domain::PersistedSettings;
use tracing::{error, warn};

use crate::SettingsStore;

/// Stores tried in order: every save goes to all of them, a load returns
/// the first layer that has settings. A failing layer is logged and skipped.
#[derive(Default)]
pub struct LayeredSettings {
    layers: Vec<Box<dyn SettingsStore>>,
}

impl LayeredSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl SettingsStore + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl SettingsStore for LayeredSettings {
    fn save(&self, settings: &PersistedSettings) -> Result<()> {
        let mut failures = 0usize;
        for (index, layer) in self.layers.iter().enumerate() {
            if let Err(err) = layer.save(settings) {
                warn!(layer = index, ?err, "settings layer failed to save");
                failures += 1;
            }
        }
        if failures > 0 && failures == self.layers.len() {
            return Err(anyhow!("no settings layer accepted the save"));
        }
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSettings>> {
        for (index, layer) in self.layers.iter().enumerate() {
            match layer.load() {
                Ok(Some(settings)) => return Ok(Some(settings)),
                Ok(None) => continue,
                Err(err) => error!(layer = index, ?err, "error loading settings"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostSettings;

    struct Broken;

    impl SettingsStore for Broken {
        fn save(&self, _settings: &PersistedSettings) -> Result<()> {
            Err(anyhow!("read-only"))
        }

        fn load(&self) -> Result<Option<PersistedSettings>> {
            Err(anyhow!("corrupt"))
        }
    }

    fn sample(bpm: i64) -> PersistedSettings {
        PersistedSettings {
            bpm,
            ..PersistedSettings::default()
        }
    }

    #[test]
    fn first_layer_with_settings_wins() {
        let empty = HostSettings::new();
        let stored = HostSettings::with(sample(100));
        let later = HostSettings::with(sample(60));
        let layered = LayeredSettings::new()
            .with_layer(empty)
            .with_layer(stored)
            .with_layer(later);
        assert_eq!(layered.load().unwrap().map(|s| s.bpm), Some(100));
    }

    #[test]
    fn broken_layer_is_skipped() {
        let fallback = HostSettings::with(sample(90));
        let layered = LayeredSettings::new().with_layer(Broken).with_layer(fallback.clone());
        assert_eq!(layered.load().unwrap().map(|s| s.bpm), Some(90));

        layered.save(&sample(180)).unwrap();
        assert_eq!(fallback.snapshot().map(|s| s.bpm), Some(180));
    }

    #[test]
    fn save_fails_only_when_every_layer_fails() {
        let layered = LayeredSettings::new().with_layer(Broken);
        assert!(layered.save(&sample(120)).is_err());
        assert!(layered.load().unwrap().is_none());
    }
}
