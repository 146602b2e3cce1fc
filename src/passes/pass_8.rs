//! Pass 8: Note Event Emission

use crate::analysis::{Note, NoteEvent};
use crate::config::Config;
use crate::error::Result as TranscriptionResult;
use crate::features::TranscriptionState;

fn to_midi_byte(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 127.0) as u8
}

/// Convert notes to timed events. Notes spanning one frame or less are dropped.
pub fn make_note_events(notes: &[Note], time: &[f64]) -> Vec<NoteEvent> {
    notes
        .iter()
        .filter(|n| n.end > n.start + 1 && n.end <= time.len())
        .map(|n| NoteEvent {
            pitch: to_midi_byte(n.pitch),
            velocity: to_midi_byte(n.velocity),
            start_time: time[n.start],
            end_time: time[n.end - 1],
        })
        .collect()
}

pub fn run(state: &mut TranscriptionState, _config: &Config) -> TranscriptionResult<()> {
    log::info!("Pass 8: Note Event Emission");

    let notes = state.require_notes("Pass 8")?;
    let events = make_note_events(notes, &state.features.time);
    log::info!("  ✓ Emitted {} note events", events.len());

    state.note_events = events;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_and_timestamps() {
        let time: Vec<f64> = (0..10).map(|i| i as f64 * 0.01).collect();
        let notes = [Note::new(68.5, 2, 6, 100.5), Note::new(69.6, 6, 9, 0.4)];
        let events = make_note_events(&notes, &time);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pitch, 68); // ties go to even
        assert_eq!(events[0].velocity, 100);
        assert_eq!(events[0].start_time, time[2]);
        assert_eq!(events[0].end_time, time[5]);
        assert_eq!(events[1].pitch, 70);
        assert_eq!(events[1].velocity, 0);
    }

    #[test]
    fn test_collapsed_notes_dropped() {
        let time: Vec<f64> = (0..10).map(|i| i as f64 * 0.01).collect();
        let notes = [
            Note::new(60.0, 3, 3, 50.0),
            Note::new(60.0, 4, 5, 50.0),
            Note::new(60.0, 5, 7, 50.0),
        ];
        let events = make_note_events(&notes, &time);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_time, time[5]);
    }

    #[test]
    fn test_pitch_clamped_into_midi_range() {
        let time = [0.0, 0.01, 0.02];
        let notes = [Note::new(-12.0, 0, 3, 200.0)];
        let events = make_note_events(&notes, &time);
        assert_eq!(events[0].pitch, 0);
        assert_eq!(events[0].velocity, 127);
    }
}
