//! Pass 0: Velocity Mapping

use crate::config::{Config, VelocityConfig};
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;
use crate::peaks::mean_std;

/// Map RMS loudness to a velocity curve.
///
/// Values are clipped to `[0, mean + k * std]` and rescaled so the loudest
/// clipped frame lands on `max_velocity`. Silent input yields all zeros.
pub fn rms_to_velocity(rms: &[f64], config: &VelocityConfig) -> Vec<f64> {
    let (mean, std) = mean_std(rms);
    let upper = (mean + config.clip_std_multiplier * std).max(0.0);

    let clipped: Vec<f64> = rms.iter().map(|&r| r.max(0.0).min(upper)).collect();
    let peak = clipped.iter().copied().fold(0.0f64, f64::max);

    if peak <= 0.0 {
        return vec![0.0; rms.len()];
    }

    clipped
        .iter()
        .map(|&c| (c / peak * config.max_velocity).clamp(0.0, config.max_velocity))
        .collect()
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 0: Velocity Mapping");

    let velocity = rms_to_velocity(&state.features.rms, &config.velocity);
    if velocity.iter().all(|&v| v == 0.0) {
        log::warn!("  Loudness is silent throughout, all velocities are 0");
    }

    state.velocity = Some(velocity);
    Ok(())
}
