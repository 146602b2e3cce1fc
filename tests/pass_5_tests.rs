//! Validation tests for Pass 5: Short & Quiet Note Removal

use pitch2midi::analysis::Note;
use pitch2midi::config::Config;
use pitch2midi::passes::pass_5::remove_short_quiet_notes;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_frame_note_dropped_at_defaults() {
        let config = Config::default();
        let notes = [Note::new(60.0, 10, 12, 100.0)];
        let kept = remove_short_quiet_notes(
            &notes,
            config.transcription.min_note_frames(),
            config.transcription.min_velocity,
        );
        assert!(kept.is_empty(), "2 frames <= 3 frame threshold must be dropped");
    }

    #[test]
    fn test_order_preserved() {
        let notes = [
            Note::new(60.0, 0, 10, 100.0),
            Note::new(61.0, 10, 11, 100.0),
            Note::new(62.0, 11, 30, 3.0),
            Note::new(63.0, 30, 50, 50.0),
        ];
        let kept = remove_short_quiet_notes(&notes, 3.0, 6.0);
        let pitches: Vec<f64> = kept.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60.0, 63.0]);
    }

    #[test]
    fn test_longer_minimum_duration() {
        let notes = [Note::new(60.0, 0, 10, 100.0), Note::new(60.0, 20, 31, 100.0)];
        // 0.1 s at 100 fps is 10 frames
        let kept = remove_short_quiet_notes(&notes, 0.1 * 100.0, 6.0);
        assert_eq!(kept, vec![notes[1]]);
    }
}
