use crate::{error::DomainError, settings::PersistedSettings};

pub trait SettingsFormat {
    fn encode(&self, settings: &PersistedSettings) -> Result<Vec<u8>, DomainError>;
    fn decode(&self, bytes: &[u8]) -> Result<PersistedSettings, DomainError>;
}

/// `{"bpm":120,"timeSignature":"4/4","volume":50}`
pub struct JsonSettingsFormat;

impl SettingsFormat for JsonSettingsFormat {
    fn encode(&self, settings: &PersistedSettings) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(settings)
            .map_err(|err| DomainError::Serialization(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<PersistedSettings, DomainError> {
        serde_json::from_slice(bytes).map_err(|err| DomainError::Serialization(err.to_string()))
    }
}
