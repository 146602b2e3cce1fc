//! QA artifacts generation

use crate::error::{Result as TranscriptionResult, TranscriptionError};
use crate::features::TranscriptionState;
use plotters::prelude::*;
use std::path::Path;

fn qa_error<E: std::fmt::Debug>(what: &str) -> impl FnOnce(E) -> TranscriptionError + '_ {
    move |e| TranscriptionError::QaGenerationError(format!("{}: {:?}", what, e))
}

/// Generate QA plots for a finished pipeline run
pub fn generate_artifacts(state: &TranscriptionState, output_dir: &Path) -> TranscriptionResult<()> {
    let qa_dir = output_dir.join("qa");
    std::fs::create_dir_all(&qa_dir)?;

    log::info!("Generating QA artifacts...");

    generate_piano_roll_plot(state, &qa_dir)?;
    generate_segmentation_plot(state, &qa_dir)?;

    log::info!("QA artifacts generated in {}", qa_dir.display());
    Ok(())
}

/// Continuous MIDI pitch with one rectangle per emitted note event
fn generate_piano_roll_plot(state: &TranscriptionState, output_dir: &Path) -> TranscriptionResult<()> {
    let Some(midi_pitch) = state.midi_pitch.as_ref() else {
        return Ok(());
    };

    let path = output_dir.join("piano_roll.svg");
    let [width, height] = state.config.qa.plot_size;
    let root = SVGBackend::new(&path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(qa_error("Failed to fill plot background"))?;

    let time = &state.features.time;
    let t0 = time.first().copied().unwrap_or(0.0);
    let t1 = time.last().copied().unwrap_or(1.0).max(t0 + 1e-3);

    let events = &state.note_events;
    let lo = events
        .iter()
        .map(|e| e.pitch as f64)
        .chain(midi_pitch.iter().copied())
        .fold(f64::INFINITY, f64::min)
        .max(0.0)
        .floor()
        - 1.0;
    let hi = events
        .iter()
        .map(|e| e.pitch as f64)
        .chain(midi_pitch.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max)
        .min(127.0)
        .ceil()
        + 1.0;
    let hi = hi.max(lo + 2.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Pitch Track & Note Events", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(t0..t1, lo..hi)
        .map_err(qa_error("Failed to build chart"))?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("MIDI pitch")
        .draw()
        .map_err(qa_error("Failed to draw mesh"))?;

    chart
        .draw_series(events.iter().map(|e| {
            let p = e.pitch as f64;
            let shade = 0.25 + 0.6 * f64::from(e.velocity) / 127.0;
            Rectangle::new(
                [(e.start_time, p - 0.4), (e.end_time, p + 0.4)],
                BLUE.mix(shade).filled(),
            )
        }))
        .map_err(qa_error("Failed to draw note events"))?;

    chart
        .draw_series(LineSeries::new(
            time.iter()
                .zip(midi_pitch.iter())
                .map(|(&t, &p)| (t, p.clamp(lo, hi))),
            BLACK.stroke_width(1),
        ))
        .map_err(qa_error("Failed to draw pitch curve"))?;

    root.present().map_err(qa_error("Failed to write piano roll"))?;
    Ok(())
}

/// Segmentation signal with onset impulses overlaid
fn generate_segmentation_plot(state: &TranscriptionState, output_dir: &Path) -> TranscriptionResult<()> {
    let Some(signal) = state.segmentation_signal.as_ref() else {
        return Ok(());
    };

    let path = output_dir.join("segmentation.svg");
    let [width, height] = state.config.qa.plot_size;
    let root = SVGBackend::new(&path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(qa_error("Failed to fill plot background"))?;

    let n = signal.len().max(2);

    let mut chart = ChartBuilder::on(&root)
        .caption("Segmentation Signal & Onsets", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0usize..n, 0f64..1.05f64)
        .map_err(qa_error("Failed to build chart"))?;

    chart
        .configure_mesh()
        .x_desc("Frame")
        .y_desc("Normalized value")
        .draw()
        .map_err(qa_error("Failed to draw mesh"))?;

    if let Some(segments) = state.segments.as_ref() {
        chart
            .draw_series(segments.iter().map(|s| {
                Rectangle::new([(s.start, 0.0f64), (s.end, 1.05f64)], GREEN.mix(0.1).filled())
            }))
            .map_err(qa_error("Failed to draw segments"))?;
    }

    chart
        .draw_series(LineSeries::new(
            signal.iter().enumerate().map(|(i, &v)| (i, v)),
            BLUE.stroke_width(1),
        ))
        .map_err(qa_error("Failed to draw segmentation signal"))?;

    if let Some(impulses) = state.onset_impulses.as_ref() {
        chart
            .draw_series(
                impulses
                    .iter()
                    .enumerate()
                    .filter(|(_, on)| **on)
                    .map(|(i, _)| PathElement::new(vec![(i, 0.0f64), (i, 1.0f64)], RED.stroke_width(2))),
            )
            .map_err(qa_error("Failed to draw onset impulses"))?;
    }

    root.present().map_err(qa_error("Failed to write segmentation plot"))?;
    Ok(())
}
