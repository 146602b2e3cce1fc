//! Pass 7: Boundary Trimming

use crate::analysis::Note;
use crate::config::Config;
use crate::error::{Result as TranscriptionResult, TranscriptionError};
use crate::features::TranscriptionState;

/// Shrink a note inward while its edge frames are quieter than `trim_threshold`.
/// The note may collapse to zero length; emission drops it.
pub fn trim_note(note: Note, velocity: &[f64], trim_threshold: f64) -> Note {
    debug_assert!(note.end <= velocity.len());
    let mut start = note.start;
    let mut end = note.end;

    while start < end && velocity[start] < trim_threshold {
        start += 1;
    }
    while start < end && velocity[end - 1] < trim_threshold {
        end -= 1;
    }

    Note { start, end, ..note }
}

pub fn trim_notes(notes: &[Note], velocity: &[f64], trim_threshold: f64) -> Vec<Note> {
    notes
        .iter()
        .map(|&note| trim_note(note, velocity, trim_threshold))
        .collect()
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 7: Boundary Trimming");

    let velocity = state.velocity.as_ref().ok_or_else(|| {
        TranscriptionError::ProcessingPipelineError("Pass 0 must be run before Pass 7".to_string())
    })?;
    let notes = state.require_notes("Pass 7")?;
    let trimmed = trim_notes(notes, velocity, config.transcription.trim_threshold);

    state.notes = Some(trimmed);
    state.record_stage("trim");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_quiet_edges() {
        let velocity = [0.0, 0.5, 10.0, 20.0, 0.9, 0.0];
        let trimmed = trim_note(Note::new(60.0, 0, 6, 20.0), &velocity, 1.0);
        assert_eq!((trimmed.start, trimmed.end), (2, 4));
        assert_eq!(trimmed.pitch, 60.0);
        assert_eq!(trimmed.velocity, 20.0);
    }

    #[test]
    fn test_silent_note_collapses() {
        let velocity = [0.0; 10];
        let trimmed = trim_note(Note::new(60.0, 2, 8, 20.0), &velocity, 1.0);
        assert_eq!(trimmed.start, trimmed.end);
    }

    #[test]
    fn test_trimming_is_idempotent() {
        let velocity = [0.0, 3.0, 0.2, 5.0, 7.0, 0.1, 0.0];
        let once = trim_note(Note::new(60.0, 0, 7, 7.0), &velocity, 1.0);
        let twice = trim_note(once, &velocity, 1.0);
        assert_eq!(once, twice);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_note_past_velocity_end_panics() {
        trim_note(Note::new(60.0, 0, 8, 20.0), &[5.0; 6], 1.0);
    }
}
