//! Pass 3: Note Construction

use crate::analysis::{Note, Segment};
use crate::config::Config;
use crate::error::{Result as TranscriptionResult, TranscriptionError};
use crate::features::TranscriptionState;
use crate::peaks::median;

/// Build one note per segment: median pitch and peak velocity over its frames
pub fn create_notes(segments: &[Segment], midi_pitch: &[f64], velocity: &[f64]) -> Vec<Note> {
    segments
        .iter()
        .filter_map(|seg| {
            debug_assert!(seg.end <= midi_pitch.len() && seg.end <= velocity.len());
            let end = seg.end;
            if seg.start >= end {
                return None;
            }
            let pitch = median(&midi_pitch[seg.start..end])?;
            let peak_velocity = velocity[seg.start..end]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            Some(Note::new(pitch, seg.start, end, peak_velocity))
        })
        .collect()
}

pub fn run(state: &mut TranscriptionState, _config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 3: Note Construction");

    let missing = |pass: &str| {
        TranscriptionError::ProcessingPipelineError(format!("{} must be run before Pass 3", pass))
    };
    let segments = state.segments.as_ref().ok_or_else(|| missing("Pass 2"))?;
    let midi_pitch = state.midi_pitch.as_ref().ok_or_else(|| missing("Pass 1"))?;
    let velocity = state.velocity.as_ref().ok_or_else(|| missing("Pass 0"))?;

    let notes = create_notes(segments, midi_pitch, velocity);
    log::info!("  ✓ Created {} notes", notes.len());

    state.notes = Some(notes);
    state.record_stage("create");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_pitch_and_max_velocity() {
        let pitch = [60.0, 61.0, 90.0, 62.0, 70.0, 70.0];
        let velocity = [10.0, 80.0, 20.0, 5.0, 30.0, 40.0];
        let segments = [Segment::new(0, 4), Segment::new(4, 6)];

        let notes = create_notes(&segments, &pitch, &velocity);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], Note::new(61.5, 0, 4, 80.0));
        assert_eq!(notes[1], Note::new(70.0, 4, 6, 40.0));
    }
}
