//! Feature track I/O and the per-recording transcription state

use crate::analysis::{Note, NoteEvent, Segment, StageCount};
use crate::config::{validate_config, Config};
use crate::error::{Result as TranscriptionResult, TranscriptionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name searched for when a directory is given as input
pub const FEATURES_FILE_NAME: &str = "features.json";

/// Frame-aligned signals produced by the pitch, onset and loudness estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTrack {
    /// Raw per-frame onset likelihood
    pub onset_activation: Vec<f64>,
    /// Frame timestamps in seconds, strictly increasing
    pub time: Vec<f64>,
    /// Fundamental frequency in Hz
    pub frequency: Vec<f64>,
    /// Pitch estimate confidence in [0, 1]
    pub confidence: Vec<f64>,
    /// Loudness, non-negative
    pub rms: Vec<f64>,
}

impl FeatureTrack {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Check lengths and value domains of every signal
    pub fn validate(&self) -> TranscriptionResult<()> {
        let n = self.time.len();
        if n == 0 {
            return Err(TranscriptionError::EmptyInput(
                "feature track has no frames".to_string(),
            ));
        }

        let signals: [(&'static str, &[f64]); 5] = [
            ("onset_activation", &self.onset_activation),
            ("time", &self.time),
            ("frequency", &self.frequency),
            ("confidence", &self.confidence),
            ("rms", &self.rms),
        ];

        for (name, signal) in signals {
            if signal.len() != n {
                return Err(TranscriptionError::LengthMismatch {
                    signal: name,
                    expected: n,
                    found: signal.len(),
                });
            }
            if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
                return Err(invalid_value(name, index, "value is not finite"));
            }
        }

        if let Some(index) = self.frequency.iter().position(|&f| f <= 0.0) {
            return Err(invalid_value("frequency", index, "frequency must be > 0 Hz"));
        }

        if let Some(index) = self
            .confidence
            .iter()
            .position(|&c| !(0.0..=1.0).contains(&c))
        {
            return Err(invalid_value("confidence", index, "confidence must lie in [0, 1]"));
        }

        if let Some(index) = self.rms.iter().position(|&r| r < 0.0) {
            return Err(invalid_value("rms", index, "rms must be >= 0"));
        }

        if let Some(index) = self.time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(invalid_value("time", index + 1, "timestamps must be strictly increasing"));
        }

        Ok(())
    }
}

fn invalid_value(signal: &'static str, index: usize, reason: &str) -> TranscriptionError {
    TranscriptionError::InvalidSignalValue {
        signal,
        index,
        reason: reason.to_string(),
    }
}

/// Load a feature track from a JSON file
pub fn load_features<P: AsRef<Path>>(path: P) -> TranscriptionResult<FeatureTrack> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        TranscriptionError::FeatureFileError(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let track: FeatureTrack = serde_json::from_str(&content).map_err(|e| {
        TranscriptionError::FeatureFileError(format!("Cannot parse {}: {}", path.display(), e))
    })?;
    Ok(track)
}

/// Save a feature track as JSON
pub fn save_features<P: AsRef<Path>>(track: &FeatureTrack, path: P) -> TranscriptionResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(track).map_err(|e| {
        TranscriptionError::FeatureFileError(format!("Cannot serialize features: {}", e))
    })?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Recursively collect every `features.json` below `dir`, sorted by path
pub fn discover_feature_files<P: AsRef<Path>>(dir: P) -> TranscriptionResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
        let entry = entry.map_err(|e| {
            TranscriptionError::FeatureFileError(format!("Directory walk failed: {}", e))
        })?;
        if entry.file_type().is_file() && entry.file_name() == FEATURES_FILE_NAME {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Name used for output files: the parent directory for `features.json`,
/// otherwise the file stem
pub fn recording_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcription".to_string());

    if path.file_name().is_some_and(|n| n == FEATURES_FILE_NAME) {
        if let Some(parent) = path.parent().and_then(Path::file_name) {
            return parent.to_string_lossy().into_owned();
        }
    }
    stem
}

/// Features plus every intermediate product of the pipeline
#[derive(Debug, Clone)]
pub struct TranscriptionState {
    /// Validated input signals
    pub features: FeatureTrack,
    /// Configuration reference
    pub config: Config,

    // Pass 0: Velocity mapping
    /// Per-frame velocity in [0, 127]
    pub velocity: Option<Vec<f64>>,

    // Pass 1: Pitch conversion
    /// Per-frame fractional MIDI pitch
    pub midi_pitch: Option<Vec<f64>>,
    /// Normalized absolute pitch gradient in [0, 1]
    pub pitch_gradient: Option<Vec<f64>>,

    // Pass 2: Segmentation
    /// Normalized segmentation signal
    pub segmentation_signal: Option<Vec<f64>>,
    /// Candidate note segments
    pub segments: Option<Vec<Segment>>,

    // Passes 3-7: Note construction and cleanup
    /// Working note list
    pub notes: Option<Vec<Note>>,
    /// Per-frame onset impulses from pass 6
    pub onset_impulses: Option<Vec<bool>>,
    /// Note count recorded after each note stage
    pub stage_counts: Vec<StageCount>,

    // Pass 8: Emission
    /// Final note events
    pub note_events: Vec<NoteEvent>,
}

impl TranscriptionState {
    /// Validate configuration and features, then create the initial state
    pub fn new(features: FeatureTrack, config: &Config) -> TranscriptionResult<Self> {
        validate_config(config)?;
        features.validate()?;
        Ok(Self {
            features,
            config: config.clone(),
            velocity: None,
            midi_pitch: None,
            pitch_gradient: None,
            segmentation_signal: None,
            segments: None,
            notes: None,
            onset_impulses: None,
            stage_counts: Vec::new(),
            note_events: Vec::new(),
        })
    }

    /// Load a feature file and create the initial state
    pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> TranscriptionResult<Self> {
        let features = load_features(path)?;
        Self::new(features, config)
    }

    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.features.len()
    }

    /// Time span covered by the frames
    pub fn duration_sec(&self) -> f64 {
        match (self.features.time.first(), self.features.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Working notes, or an error naming the pass that needed them
    pub fn require_notes(&self, pass: &str) -> TranscriptionResult<&Vec<Note>> {
        self.notes.as_ref().ok_or_else(|| {
            TranscriptionError::ProcessingPipelineError(format!(
                "Pass 3 must be run before {}",
                pass
            ))
        })
    }

    /// Record the note count after a stage
    pub fn record_stage(&mut self, stage: &str) {
        let notes = self.notes.as_ref().map_or(0, Vec::len);
        self.stage_counts.push(StageCount {
            stage: stage.to_string(),
            notes,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(n: usize) -> FeatureTrack {
        FeatureTrack {
            onset_activation: vec![0.0; n],
            time: (0..n).map(|i| i as f64 / 100.0).collect(),
            frequency: vec![440.0; n],
            confidence: vec![1.0; n],
            rms: vec![0.1; n],
        }
    }

    #[test]
    fn test_valid_track() {
        assert!(track(10).validate().is_ok());
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(matches!(
            track(0).validate(),
            Err(TranscriptionError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_length_mismatch_named() {
        let mut t = track(10);
        t.rms.pop();
        match t.validate() {
            Err(TranscriptionError::LengthMismatch {
                signal,
                expected,
                found,
            }) => {
                assert_eq!(signal, "rms");
                assert_eq!(expected, 10);
                assert_eq!(found, 9);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut t = track(10);
        t.frequency[4] = 0.0;
        assert!(matches!(
            t.validate(),
            Err(TranscriptionError::InvalidSignalValue { signal: "frequency", index: 4, .. })
        ));

        let mut t = track(10);
        t.confidence[2] = 1.5;
        assert!(t.validate().is_err());

        let mut t = track(10);
        t.time[5] = t.time[4];
        assert!(matches!(
            t.validate(),
            Err(TranscriptionError::InvalidSignalValue { signal: "time", index: 5, .. })
        ));

        let mut t = track(10);
        t.onset_activation[0] = f64::NAN;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_recording_name() {
        assert_eq!(
            recording_name(Path::new("outputs/song/features.json")),
            "song"
        );
        assert_eq!(recording_name(Path::new("take_2.json")), "take_2");
    }
}
