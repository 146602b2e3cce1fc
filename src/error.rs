//! Error types for the pitch-to-MIDI system

use thiserror::Error;

/// Errors raised while loading features, transcribing or exporting
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// E001: No frames to transcribe
    #[error("E001: Empty input - {0}")]
    EmptyInput(String),

    /// E002: Frame-aligned signals disagree on length
    #[error("E002: Signal length mismatch - '{signal}' has {found} frames, expected {expected}")]
    LengthMismatch {
        signal: &'static str,
        expected: usize,
        found: usize,
    },

    /// E003: A signal holds a value outside its domain
    #[error("E003: Invalid value in '{signal}' at frame {index} - {reason}")]
    InvalidSignalValue {
        signal: &'static str,
        index: usize,
        reason: String,
    },

    /// E004: Configuration validation failed
    #[error("E004: Configuration validation failed - {0}")]
    ConfigValidationFailed(String),

    /// E005: Feature file could not be read or written
    #[error("E005: Feature file error - {0}")]
    FeatureFileError(String),

    /// E006: A pass ran without its predecessor's output
    #[error("E006: Processing pipeline error - {0}")]
    ProcessingPipelineError(String),

    /// E007: MIDI export error
    #[error("E007: MIDI export error - {0}")]
    MidiExportError(String),

    /// E008: Analysis export error
    #[error("E008: Analysis export error - {0}")]
    AnalysisExportError(String),

    /// E009: QA artifact generation error
    #[error("E009: QA artifact generation error - {0}")]
    QaGenerationError(String),
}

impl From<std::io::Error> for TranscriptionError {
    fn from(err: std::io::Error) -> Self {
        TranscriptionError::FeatureFileError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for TranscriptionError {
    fn from(err: serde_json::Error) -> Self {
        TranscriptionError::AnalysisExportError(format!("JSON serialization error: {}", err))
    }
}

impl From<anyhow::Error> for TranscriptionError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TranscriptionError>() {
            Ok(err) => err,
            Err(err) => TranscriptionError::ProcessingPipelineError(format!("Generic error: {:#}", err)),
        }
    }
}

/// Result type alias for transcription operations
pub type Result<T> = std::result::Result<T, TranscriptionError>;
