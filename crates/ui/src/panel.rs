use tactus_domain::{PlaybackState, TimeSignature};

/// `RUNNING | 120 BPM | 4/4 | 50%`
pub fn status_line(state: &PlaybackState) -> String {
    format!(
        "{} | {} | {} | {}",
        state.transport.label(),
        state.bpm,
        state.time_signature.label(),
        state.volume
    )
}

/// The selectable bars with their display labels.
pub fn time_signature_options() -> impl Iterator<Item = (TimeSignature, String)> {
    TimeSignature::OPTIONS
        .into_iter()
        .map(|time_signature| (time_signature, time_signature.label()))
}
