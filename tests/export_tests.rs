//! File I/O tests: feature loading, batch discovery and result export

use pitch2midi::config::Config;
use pitch2midi::features::{discover_feature_files, load_features, save_features, FeatureTrack};
use pitch2midi::{validate_input, PitchToMidi, TranscriptionError};
use midly::{MidiMessage, Smf, TrackEventKind};
use tempfile::TempDir;

fn steady_track(n: usize, hz: f64) -> FeatureTrack {
    FeatureTrack {
        onset_activation: vec![0.0; n],
        time: (0..n).map(|i| i as f64 / 100.0).collect(),
        frequency: vec![hz; n],
        confidence: vec![1.0; n],
        rms: vec![0.3; n],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("take").join("features.json");
        let track = steady_track(20, 220.0);

        save_features(&track, &path).unwrap();
        assert_eq!(load_features(&path).unwrap(), track);
    }

    #[test]
    fn test_unparseable_features_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_features(&path),
            Err(TranscriptionError::FeatureFileError(_))
        ));
        assert!(validate_input(&path, &Config::default()).is_err());
    }

    #[test]
    fn test_processor_from_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"transcription": {"min_velocity": 10.0}}"#).unwrap();
        let processor = PitchToMidi::from_config_file(&path).unwrap();
        assert_eq!(processor.config().transcription.min_velocity, 10.0);

        std::fs::write(&path, r#"{"transcription": {"frame_rate": 0.0}}"#).unwrap();
        assert!(matches!(
            PitchToMidi::from_config_file(&path),
            Err(TranscriptionError::ConfigValidationFailed(_))
        ));

        assert!(PitchToMidi::from_config_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_discover_nested_feature_files() {
        let dir = TempDir::new().unwrap();
        for name in ["b_song", "a_song", "nested/c_song"] {
            save_features(&steady_track(10, 440.0), dir.path().join(name).join("features.json"))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let files = discover_feature_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] < w[1]));
        assert!(files.iter().all(|f| f.ends_with("features.json")));
    }

    #[test]
    fn test_process_writes_midi_and_analysis() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("song").join("features.json");
        save_features(&steady_track(200, 440.0), &input).unwrap();

        let out = dir.path().join("out");
        let midi_path = PitchToMidi::new(Config::default()).process(&input, &out).unwrap();

        assert_eq!(midi_path, out.join("song.mid"));
        let bytes = std::fs::read(&midi_path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let keys: Vec<u8> = smf.tracks[0]
            .iter()
            .filter_map(|ev| match ev.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some(u8::from(key)),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![69]);

        let analysis: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("analysis.json")).unwrap())
                .unwrap();
        assert_eq!(analysis["summary"]["note_events"], 1);
        assert_eq!(analysis["notes"][0]["pitch"], 69);
        assert!(!out.join("qa").exists());
    }

    #[test]
    fn test_qa_plots_written_on_request() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("features.json");
        let mut track = steady_track(200, 440.0);
        track.onset_activation[120] = 1.0;
        save_features(&track, &input).unwrap();

        let mut config = Config::default();
        config.qa.generate_plots = true;
        PitchToMidi::new(config).process(&input, dir.path()).unwrap();

        assert!(dir.path().join("qa").join("piano_roll.svg").exists());
        assert!(dir.path().join("qa").join("segmentation.svg").exists());
    }
}
