//! MIDI export functionality

use crate::analysis::NoteEvent;
use crate::config::ExportConfig;
use crate::error::{Result as TranscriptionResult, TranscriptionError};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;

/// Write note events to a single-track standard MIDI file
pub fn export_midi(
    events: &[NoteEvent],
    midi_path: &Path,
    config: &ExportConfig,
) -> TranscriptionResult<()> {
    if events.is_empty() {
        log::warn!("No note events to export, writing an empty track");
    }

    if let Some(parent) = midi_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let midi_data = convert_events_to_midi(events, config)?;
    std::fs::write(midi_path, midi_data).map_err(|e| {
        TranscriptionError::MidiExportError(format!("Failed to write {}: {}", midi_path.display(), e))
    })?;

    log::info!(
        "Exported {} MIDI notes to {}",
        events.len(),
        midi_path.display()
    );
    Ok(())
}

/// Convert seconds to ticks at a fixed tempo
pub fn seconds_to_ticks(seconds: f64, config: &ExportConfig) -> u32 {
    let ticks = seconds * config.ticks_per_beat as f64 * config.tempo_bpm / 60.0;
    ticks.round().max(0.0) as u32
}

/// Convert note events to MIDI file bytes
pub fn convert_events_to_midi(
    events: &[NoteEvent],
    config: &ExportConfig,
) -> TranscriptionResult<Vec<u8>> {
    let channel = u4::from(config.channel.min(15));

    // (tick, is_note_on, key, velocity); note-offs sort before note-ons on the same tick
    let mut timeline: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(events.len() * 2);
    for event in events {
        let start = seconds_to_ticks(event.start_time, config);
        let end = seconds_to_ticks(event.end_time, config).max(start + 1);
        timeline.push((start, true, event.pitch.min(127), event.velocity.min(127)));
        timeline.push((end, false, event.pitch.min(127), 0));
    }
    timeline.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

    let mut track_events = Vec::with_capacity(timeline.len() + 3);

    // Tempo meta event at the beginning
    let tempo_uspq = (60_000_000.0 / config.tempo_bpm).round() as u32;
    track_events.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(tempo_uspq.min(0xFF_FFFF)))),
    });

    track_events.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::from(config.program.min(127)),
            },
        },
    });

    let mut current_tick = 0u32;
    for (tick, is_on, key, vel) in timeline {
        let delta = tick - current_tick;
        current_tick = tick;

        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::from(key),
                vel: u7::from(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::from(key),
                vel: u7::from(0),
            }
        };

        track_events.push(TrackEvent {
            delta: u28::from(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track_events.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let header = Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(u15::from(config.ticks_per_beat.min(0x7FFF))),
    };

    let smf = Smf {
        header,
        tracks: vec![track_events],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| TranscriptionError::MidiExportError(format!("Failed to write MIDI data: {:?}", e)))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(pitch: u8, start: f64, end: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            velocity: 100,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn test_seconds_to_ticks() {
        let config = ExportConfig::default();
        // 120 BPM, 960 tpb: one second is two beats
        assert_eq!(seconds_to_ticks(1.0, &config), 1920);
        assert_eq!(seconds_to_ticks(0.0, &config), 0);
    }

    #[test]
    fn test_round_trip_through_midly() {
        let events = [event(60, 0.0, 0.5), event(62, 0.5, 1.0)];
        let bytes = convert_events_to_midi(&events, &ExportConfig::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);

        let mut tick = 0u32;
        let mut notes = Vec::new();
        for ev in &smf.tracks[0] {
            tick += u32::from(ev.delta);
            if let TrackEventKind::Midi { message, .. } = ev.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => notes.push((tick, true, u8::from(key))),
                    MidiMessage::NoteOff { key, .. } => notes.push((tick, false, u8::from(key))),
                    _ => {}
                }
            }
        }

        // The first note ends on the tick where the second starts; its off comes first
        assert_eq!(
            notes,
            vec![(0, true, 60), (960, false, 60), (960, true, 62), (1920, false, 62)]
        );
    }

    #[test]
    fn test_empty_track_is_valid() {
        let bytes = convert_events_to_midi(&[], &ExportConfig::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks[0].len(), 3);
    }
}
