use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("tone queue is full")]
    QueueFull,
}
