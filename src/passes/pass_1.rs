//! Pass 1: Pitch Conversion

use crate::config::Config;
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;
use crate::peaks::{gradient, min_max_normalize};

/// Convert a frequency in Hz to a fractional MIDI note number (A4 = 440 Hz = 69)
pub fn hz_to_midi(hz: f64) -> f64 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Per-frame MIDI pitch and its normalized absolute gradient
pub fn midi_pitch_and_gradient(frequency: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let midi_pitch: Vec<f64> = frequency.iter().map(|&f| hz_to_midi(f)).collect();
    let change: Vec<f64> = gradient(&midi_pitch).iter().map(|g| g.abs()).collect();
    let pitch_gradient = min_max_normalize(&change);
    (midi_pitch, pitch_gradient)
}

pub fn run(state: &mut TranscriptionState, _config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 1: Pitch Conversion");

    let (midi_pitch, pitch_gradient) = midi_pitch_and_gradient(&state.features.frequency);
    if pitch_gradient.iter().all(|&g| g == 0.0) {
        log::debug!("  Pitch is constant, gradient is all zero");
    }

    state.midi_pitch = Some(midi_pitch);
    state.pitch_gradient = Some(pitch_gradient);
    Ok(())
}
