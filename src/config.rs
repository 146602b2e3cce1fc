//! Configuration system for the pitch-to-MIDI transcriber

use crate::error::{Result as TranscriptionResult, TranscriptionError};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub transcription: TranscriptionConfig,
    pub peaks: PeakConfig,
    pub velocity: VelocityConfig,
    pub merge: MergeConfig,
    pub export: ExportConfig,
    pub qa: QaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            transcription: TranscriptionConfig::default(),
            peaks: PeakConfig::default(),
            velocity: VelocityConfig::default(),
            merge: MergeConfig::default(),
            export: ExportConfig::default(),
            qa: QaConfig::default(),
        }
    }
}

/// Core note extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Frames per second of every input signal
    pub frame_rate: f64,
    /// Minimum prominence of a segmentation boundary peak
    pub segment_threshold: f64,
    /// Notes must last strictly longer than this (seconds)
    pub min_note_duration: f64,
    /// Notes must be strictly louder than this
    pub min_velocity: f64,
    /// Minimum height of an onset peak used for splitting
    pub onset_threshold: f64,
    /// Sub-notes produced by onset splitting must last strictly longer than this (seconds)
    pub min_split_duration: f64,
    /// Leading/trailing frames with velocity below this are trimmed
    pub trim_threshold: f64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            frame_rate: 100.0,
            segment_threshold: 0.001,
            min_note_duration: 0.03,
            min_velocity: 6.0,
            onset_threshold: 0.8,
            min_split_duration: 0.03,
            trim_threshold: 1.0,
        }
    }
}

impl TranscriptionConfig {
    /// Minimum note length in frames (exclusive)
    pub fn min_note_frames(&self) -> f64 {
        self.min_note_duration * self.frame_rate
    }

    /// Minimum split length in frames (exclusive)
    pub fn min_split_frames(&self) -> f64 {
        self.min_split_duration * self.frame_rate
    }
}

/// Peak picking configuration shared by segmentation and onset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    pub segment_distance: usize,
    pub onset_distance: usize,
    pub width_rel_height: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            segment_distance: 4,
            onset_distance: 4,
            width_rel_height: 0.5,
        }
    }
}

/// RMS to velocity mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub clip_std_multiplier: f64,
    pub max_velocity: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            clip_std_multiplier: 6.0,
            max_velocity: 127.0,
        }
    }
}

/// Adjacent note merging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Adjacent notes merge when their pitch difference is strictly below this (semitones)
    pub max_pitch_difference: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_pitch_difference: 0.5,
        }
    }
}

/// MIDI file export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub ticks_per_beat: u16,
    pub tempo_bpm: f64,
    pub channel: u8,
    pub program: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ticks_per_beat: 960,
            tempo_bpm: 120.0,
            channel: 0,
            program: 0,
        }
    }
}

/// QA artifacts configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub generate_plots: bool,
    pub plot_size: [u32; 2],
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            generate_plots: false,
            plot_size: [1200, 600],
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> TranscriptionResult<()> {
    let t = &config.transcription;

    if !(t.frame_rate.is_finite() && t.frame_rate > 0.0) {
        return Err(invalid(format!("frame_rate must be > 0, got {}", t.frame_rate)));
    }

    for (name, value) in [
        ("min_note_duration", t.min_note_duration),
        ("min_split_duration", t.min_split_duration),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(format!("{} must be >= 0, got {}", name, value)));
        }
    }

    for (name, value) in [
        ("segment_threshold", t.segment_threshold),
        ("min_velocity", t.min_velocity),
        ("onset_threshold", t.onset_threshold),
        ("trim_threshold", t.trim_threshold),
        ("merge.max_pitch_difference", config.merge.max_pitch_difference),
        ("velocity.clip_std_multiplier", config.velocity.clip_std_multiplier),
    ] {
        if !value.is_finite() {
            return Err(invalid(format!("{} must be finite, got {}", name, value)));
        }
    }

    if config.peaks.segment_distance == 0 || config.peaks.onset_distance == 0 {
        return Err(invalid("peak distances must be >= 1".to_string()));
    }

    let rel = config.peaks.width_rel_height;
    if !(rel > 0.0 && rel <= 1.0) {
        return Err(invalid(format!("width_rel_height must be in (0, 1], got {}", rel)));
    }

    let max_velocity = config.velocity.max_velocity;
    if !(max_velocity > 0.0 && max_velocity <= 127.0) {
        return Err(invalid(format!("max_velocity must be in (0, 127], got {}", max_velocity)));
    }

    let e = &config.export;
    if e.channel > 15 {
        return Err(invalid(format!("export channel must be < 16, got {}", e.channel)));
    }
    if e.program > 127 {
        return Err(invalid(format!("export program must be < 128, got {}", e.program)));
    }
    if !(e.tempo_bpm.is_finite() && e.tempo_bpm > 0.0) {
        return Err(invalid(format!("tempo_bpm must be > 0, got {}", e.tempo_bpm)));
    }
    // SMF metrical timing is a 15-bit field
    if e.ticks_per_beat == 0 || e.ticks_per_beat > 0x7FFF {
        return Err(invalid(format!("ticks_per_beat must be in 1..=32767, got {}", e.ticks_per_beat)));
    }

    Ok(())
}

fn invalid(msg: String) -> TranscriptionError {
    TranscriptionError::ConfigValidationFailed(msg)
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
