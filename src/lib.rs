//! Pitch-to-MIDI Transcription System
//!
//! Turns a monophonic pitch track (frame-aligned onset activation, time,
//! frequency, confidence and loudness signals) into discrete MIDI note events.

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod midi;
pub mod passes;
pub mod peaks;
pub mod qa;

pub use analysis::{Note, NoteEvent, Segment};
pub use config::Config;
pub use error::{Result as TranscriptionResult, TranscriptionError};
pub use features::{FeatureTrack, TranscriptionState};

use std::path::{Path, PathBuf};

/// Main processing pipeline for pitch-to-MIDI conversion
#[derive(Debug, Clone)]
pub struct PitchToMidi {
    config: Config,
}

impl PitchToMidi {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a processor from a JSON configuration file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> TranscriptionResult<Self> {
        Ok(Self::new(config::load_config(path)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcribe one recording's features into ordered note events
    pub fn transcribe(&self, features: FeatureTrack) -> TranscriptionResult<Vec<NoteEvent>> {
        let mut state = TranscriptionState::new(features, &self.config)?;
        self.run_pipeline(&mut state)?;
        Ok(state.note_events)
    }

    /// Process a feature file and write MIDI plus analysis results.
    /// Returns the path of the written MIDI file.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_dir: Q,
    ) -> TranscriptionResult<PathBuf> {
        let input_path = input_path.as_ref();
        let output_dir = output_dir.as_ref();

        // Load features
        let mut state = TranscriptionState::load(input_path, &self.config)?;

        // Run all passes
        self.run_pipeline(&mut state)?;

        // Export results
        let name = features::recording_name(input_path);
        self.export_results(&state, output_dir, &name)
    }

    /// Execute the complete multi-pass pipeline
    pub fn run_pipeline(&self, state: &mut TranscriptionState) -> TranscriptionResult<()> {
        log::debug!("Transcribing {} frames", state.n_frames());

        // Pass 0: Velocity Mapping
        passes::pass_0::run(state, &self.config)?;

        // Pass 1: Pitch Conversion
        passes::pass_1::run(state, &self.config)?;

        // Pass 2: Boundary Segmentation
        passes::pass_2::run(state, &self.config)?;

        // Pass 3: Note Construction
        passes::pass_3::run(state, &self.config)?;

        // Pass 4: Adjacent Note Merging
        passes::pass_4::run(state, &self.config)?;

        // Pass 5: Short & Quiet Note Removal
        passes::pass_5::run(state, &self.config)?;

        // Pass 6: Onset Splitting
        passes::pass_6::run(state, &self.config)?;

        // Pass 7: Boundary Trimming
        passes::pass_7::run(state, &self.config)?;

        // Pass 8: Note Event Emission
        passes::pass_8::run(state, &self.config)?;

        Ok(())
    }

    /// Export MIDI, analysis and optional QA results
    fn export_results(
        &self,
        state: &TranscriptionState,
        output_dir: &Path,
        name: &str,
    ) -> TranscriptionResult<PathBuf> {
        let midi_path = output_dir.join(format!("{}.mid", name));
        midi::export_midi(&state.note_events, &midi_path, &self.config.export)?;
        analysis::export_analysis(state, output_dir)?;
        if self.config.qa.generate_plots {
            qa::generate_artifacts(state, output_dir)?;
        }
        Ok(midi_path)
    }
}

/// Validate configuration and the input feature file
pub fn validate_input<P: AsRef<Path>>(input_path: P, config: &Config) -> TranscriptionResult<()> {
    // Check the feature file parses and its signals line up
    features::load_features(input_path)?.validate()?;

    // Validate configuration
    config::validate_config(config)?;

    Ok(())
}
