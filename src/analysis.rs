//! Note data types and analysis export

use crate::features::TranscriptionState;
use serde::{Deserialize, Serialize};

/// Half-open frame range `[start, end)` proposed by segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Working note record, in frame indices with continuous pitch and velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Fractional MIDI note number
    pub pitch: f64,
    /// First frame (inclusive)
    pub start: usize,
    /// Last frame (exclusive)
    pub end: usize,
    /// Velocity in [0, 127]
    pub velocity: f64,
}

impl Note {
    pub fn new(pitch: f64, start: usize, end: usize, velocity: f64) -> Self {
        Self {
            pitch,
            start,
            end,
            velocity,
        }
    }

    /// Duration in frames
    pub fn len_frames(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Final note event, in seconds with integer MIDI pitch and velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub start_time: f64,
    pub end_time: f64,
}

impl NoteEvent {
    pub fn duration_sec(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Note count after a pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: String,
    pub notes: usize,
}

/// Summary written alongside the MIDI file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSummary {
    pub frames: usize,
    pub duration_sec: f64,
    pub segments: usize,
    pub onset_impulses: usize,
    pub stage_counts: Vec<StageCount>,
    pub note_events: usize,
    pub pitch_range: Option<[u8; 2]>,
    pub mean_velocity: Option<f64>,
    pub total_note_sec: f64,
}

/// Collect the summary figures for a finished pipeline run
pub fn build_summary(state: &TranscriptionState) -> TranscriptionSummary {
    let events = &state.note_events;

    let pitch_range = events
        .iter()
        .map(|e| e.pitch)
        .min()
        .zip(events.iter().map(|e| e.pitch).max())
        .map(|(lo, hi)| [lo, hi]);

    let mean_velocity = if events.is_empty() {
        None
    } else {
        Some(events.iter().map(|e| e.velocity as f64).sum::<f64>() / events.len() as f64)
    };

    TranscriptionSummary {
        frames: state.n_frames(),
        duration_sec: state.duration_sec(),
        segments: state.segments.as_ref().map_or(0, Vec::len),
        onset_impulses: state
            .onset_impulses
            .as_ref()
            .map_or(0, |imp| imp.iter().filter(|&&on| on).count()),
        stage_counts: state.stage_counts.clone(),
        note_events: events.len(),
        pitch_range,
        mean_velocity,
        total_note_sec: events.iter().map(NoteEvent::duration_sec).sum(),
    }
}

/// Export analysis results to JSON
pub fn export_analysis(
    state: &TranscriptionState,
    output_dir: &std::path::Path,
) -> crate::TranscriptionResult<()> {
    std::fs::create_dir_all(output_dir)?;

    let analysis_path = output_dir.join("analysis.json");

    #[derive(Serialize)]
    struct AnalysisFile<'a> {
        summary: TranscriptionSummary,
        notes: &'a [NoteEvent],
    }

    let analysis = AnalysisFile {
        summary: build_summary(state),
        notes: &state.note_events,
    };

    let json = serde_json::to_string_pretty(&analysis)?;
    std::fs::write(&analysis_path, json).map_err(|e| {
        crate::TranscriptionError::AnalysisExportError(format!(
            "Failed to write {}: {}",
            analysis_path.display(),
            e
        ))
    })?;

    log::info!("Exported analysis results to {}", analysis_path.display());
    Ok(())
}
