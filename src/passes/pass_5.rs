//! Pass 5: Short & Quiet Note Removal

use crate::analysis::Note;
use crate::config::Config;
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;

/// Keep notes strictly longer than `min_frames` and strictly louder than `min_velocity`
pub fn remove_short_quiet_notes(notes: &[Note], min_frames: f64, min_velocity: f64) -> Vec<Note> {
    notes
        .iter()
        .filter(|n| n.len_frames() as f64 > min_frames && n.velocity > min_velocity)
        .copied()
        .collect()
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 5: Short & Quiet Note Removal");

    let notes = state.require_notes("Pass 5")?;
    let kept = remove_short_quiet_notes(
        notes,
        config.transcription.min_note_frames(),
        config.transcription.min_velocity,
    );
    log::info!("  ✓ Removed {} notes", notes.len() - kept.len());

    state.notes = Some(kept);
    state.record_stage("filter");
    Ok(())
}
