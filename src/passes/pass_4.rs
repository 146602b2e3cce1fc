//! Pass 4: Adjacent Note Merging

use crate::analysis::Note;
use crate::config::Config;
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;
use crate::peaks::median;

/// Collapse a run of notes into one spanning all of them
fn collapse_run(run: &[Note]) -> Option<Note> {
    match run {
        [] => None,
        [single] => Some(*single),
        [first, .., last] => {
            let pitches: Vec<f64> = run.iter().map(|n| n.pitch).collect();
            let velocity = run.iter().map(|n| n.velocity).fold(f64::NEG_INFINITY, f64::max);
            Some(Note::new(median(&pitches)?, first.start, last.end, velocity))
        }
    }
}

/// Merge runs of adjacent notes with similar pitch.
///
/// Each note is compared with its immediate successor in the input list,
/// never with the pitch of the run built so far, so a slow glide of small
/// steps ends up in a single note even when its ends are far apart.
pub fn merge_notes(notes: &[Note], max_pitch_difference: f64) -> Vec<Note> {
    let mut merged = Vec::with_capacity(notes.len());
    let mut run: Vec<Note> = Vec::new();

    for (i, note) in notes.iter().enumerate() {
        run.push(*note);

        let continues = notes
            .get(i + 1)
            .is_some_and(|next| (next.pitch - note.pitch).abs() < max_pitch_difference);

        if !continues {
            merged.extend(collapse_run(&run));
            run.clear();
        }
    }

    merged
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 4: Adjacent Note Merging");

    let notes = state.require_notes("Pass 4")?;
    let before = notes.len();
    let merged = merge_notes(notes, config.merge.max_pitch_difference);
    log::info!("  ✓ Merged {} notes into {}", before, merged.len());

    state.notes = Some(merged);
    state.record_stage("merge");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similar_neighbours_merge() {
        let notes = [
            Note::new(60.0, 0, 10, 50.0),
            Note::new(60.2, 10, 20, 70.0),
            Note::new(60.1, 22, 30, 60.0),
            Note::new(64.0, 30, 40, 40.0),
        ];
        let merged = merge_notes(&notes, 0.5);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], Note::new(60.1, 0, 30, 70.0));
        assert_eq!(merged[1], Note::new(64.0, 30, 40, 40.0));
    }

    #[test]
    fn test_single_note_passes_through() {
        let notes = [Note::new(69.0, 0, 200, 127.0)];
        assert_eq!(merge_notes(&notes, 0.5), notes.to_vec());
        assert!(merge_notes(&[], 0.5).is_empty());
    }

    #[test]
    fn test_step_wise_drift_merges() {
        // Each step is 0.4, end to end is 1.6
        let notes: Vec<Note> = (0..5)
            .map(|i| Note::new(60.0 + 0.4 * i as f64, i * 10, i * 10 + 10, 50.0))
            .collect();
        let merged = merge_notes(&notes, 0.5);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 0);
        assert_eq!(merged[0].end, 50);
        assert!((merged[0].pitch - 60.8).abs() < 1e-4);
    }
}
