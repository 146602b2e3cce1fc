//! Pass 6: Onset Splitting

use crate::analysis::Note;
use crate::config::Config;
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;
use crate::peaks::{find_peaks, PeakCriteria};

/// Reduce the raw onset activation to an impulse train: one impulse per
/// peak at or above `onset_threshold`, peaks at least `distance` frames apart.
pub fn threshold_onset_activations(
    onset_activation: &[f64],
    onset_threshold: f64,
    distance: usize,
) -> Vec<bool> {
    let criteria = PeakCriteria {
        height: Some(onset_threshold),
        distance,
        prominence: None,
    };

    let mut impulses = vec![false; onset_activation.len()];
    for peak in find_peaks(onset_activation, &criteria) {
        impulses[peak] = true;
    }
    impulses
}

/// Split notes at the onset impulses inside them.
///
/// Candidate split points are visited in order with the note end as a final
/// sentinel. A sub-note is emitted only when it would be strictly longer than
/// `min_split_frames`; otherwise the candidate is skipped and the next one is
/// measured from the same starting frame. A too-short tail after the last
/// accepted split is dropped.
pub fn split_notes(notes: &[Note], impulses: &[bool], min_split_frames: f64) -> Vec<Note> {
    let mut split = Vec::with_capacity(notes.len());

    for note in notes {
        debug_assert!(note.end <= impulses.len());
        let split_points: Vec<usize> = (note.start..note.end).filter(|&i| impulses[i]).collect();

        if split_points.is_empty() {
            split.push(*note);
            continue;
        }

        let mut prev_split = note.start;
        for point in split_points.into_iter().chain(std::iter::once(note.end)) {
            if (point - prev_split) as f64 > min_split_frames {
                split.push(Note::new(note.pitch, prev_split, point, note.velocity));
                prev_split = point;
            }
        }
    }

    split
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 6: Onset Splitting");

    let impulses = threshold_onset_activations(
        &state.features.onset_activation,
        config.transcription.onset_threshold,
        config.peaks.onset_distance,
    );
    log::debug!(
        "  {} onset impulses at or above {}",
        impulses.iter().filter(|&&on| on).count(),
        config.transcription.onset_threshold
    );

    let notes = state.require_notes("Pass 6")?;
    let before = notes.len();
    let split = split_notes(notes, &impulses, config.transcription.min_split_frames());
    log::info!("  ✓ Split {} notes into {}", before, split.len());

    state.onset_impulses = Some(impulses);
    state.notes = Some(split);
    state.record_stage("split");
    Ok(())
}
