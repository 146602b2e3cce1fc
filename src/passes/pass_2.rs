//! Pass 2: Boundary Segmentation

use crate::analysis::Segment;
use crate::config::{Config, PeakConfig};
use crate::error::{Result as TranscriptionResult, TranscriptionError};
use crate::features::TranscriptionState;
use crate::peaks::{find_peaks, min_max_normalize, peak_widths, round_clamped, PeakCriteria};

/// Normalized segmentation signal: pitch movement weighted by pitch uncertainty
pub fn segmentation_signal(confidence: &[f64], pitch_gradient: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = confidence
        .iter()
        .zip(pitch_gradient)
        .map(|(&c, &g)| (1.0 - c) * g)
        .collect();
    min_max_normalize(&raw)
}

/// Turn boundary peaks of the segmentation signal into note segments.
///
/// Each boundary peak spans `[left_ip, right_ip]` at half prominence: the
/// right edge opens the next note and the left edge closes the previous
/// one. Segments of one frame or less are dropped.
pub fn segments_from_signal(
    signal: &[f64],
    segment_threshold: f64,
    peaks_config: &PeakConfig,
) -> Vec<Segment> {
    let n = signal.len();
    let criteria = PeakCriteria {
        height: None,
        distance: peaks_config.segment_distance,
        prominence: Some(segment_threshold),
    };

    let boundary_points = find_peaks(signal, &criteria);
    if boundary_points.is_empty() {
        log::debug!("  No boundary peaks, one segment spans the whole track");
    }

    let widths = peak_widths(signal, &boundary_points, peaks_config.width_rel_height);

    let note_starts = std::iter::once(0).chain(widths.iter().map(|w| round_clamped(w.right_ip, 0, n)));
    let note_ends = widths
        .iter()
        .map(|w| round_clamped(w.left_ip, 0, n))
        .chain(std::iter::once(n));

    note_starts
        .zip(note_ends)
        .filter(|&(s, e)| e > s + 1)
        .map(|(s, e)| Segment::new(s, e))
        .collect()
}

/// Compute note segments from confidence and the normalized pitch gradient
pub fn compute_note_segments(
    confidence: &[f64],
    pitch_gradient: &[f64],
    segment_threshold: f64,
    peaks_config: &PeakConfig,
) -> Vec<Segment> {
    let signal = segmentation_signal(confidence, pitch_gradient);
    segments_from_signal(&signal, segment_threshold, peaks_config)
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 2: Boundary Segmentation");

    let pitch_gradient = state.pitch_gradient.as_ref().ok_or_else(|| {
        TranscriptionError::ProcessingPipelineError("Pass 1 must be run before Pass 2".to_string())
    })?;

    let signal = segmentation_signal(&state.features.confidence, pitch_gradient);
    let segments = segments_from_signal(
        &signal,
        config.transcription.segment_threshold,
        &config.peaks,
    );

    log::info!("  ✓ Found {} note segments", segments.len());

    state.segmentation_signal = Some(signal);
    state.segments = Some(segments);
    Ok(())
}
