// MIDI output from compositions.
//
// Converts a Composition into a Standard MIDI File (SMF Format 1) with two
// tracks that start together: the lead melody on channel 0 and the
// accompaniment on channel 1. The lead track also carries the tempo, so the
// file has exactly two tracks.
//
// Each event becomes note-ons for all its pitches at its start tick and
// matching note-offs at its end tick. Rests only advance time.
//
// Uses the `midly` crate for MIDI writing.

use crate::composition::Composition;
use crate::grid::{Event, TICKS_PER_QUARTER};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

/// Playback tempo.
pub const TEMPO_BPM: u32 = 120;

/// General MIDI program for the lead (acoustic grand piano).
const LEAD_PROGRAM: u8 = 0;

/// General MIDI program for the accompaniment (electric piano 1).
const ACCOMPANIMENT_PROGRAM: u8 = 4;

/// Encode a composition as SMF bytes.
pub fn composition_to_bytes(composition: &Composition) -> std::io::Result<Vec<u8>> {
    let smf = composition_to_smf(composition);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a Composition to an in-memory SMF.
pub fn composition_to_smf(composition: &Composition) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    ));

    let mut lead = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / TEMPO_BPM))),
    }];
    write_events(&mut lead, "Lead", u4::new(0), LEAD_PROGRAM, &composition.lead);
    smf.tracks.push(lead);

    let mut rhythm = Vec::new();
    write_events(
        &mut rhythm,
        "Accompaniment",
        u4::new(1),
        ACCOMPANIMENT_PROGRAM,
        &composition.rhythm,
    );
    smf.tracks.push(rhythm);

    smf
}

fn write_events(
    track: &mut Track<'static>,
    name: &'static str,
    channel: u4,
    program: u8,
    events: &[Event],
) {
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(program),
            },
        },
    });

    // Ticks elapsed since the last emitted event.
    let mut pending: u32 = 0;
    for event in events {
        match event {
            Event::Rest { ticks } => pending += ticks,
            Event::Notes {
                pitches,
                velocity,
                ticks,
            } => {
                for (i, pitch) in pitches.iter().enumerate() {
                    track.push(TrackEvent {
                        delta: u28::new(if i == 0 { pending } else { 0 }),
                        kind: TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::NoteOn {
                                key: u7::new(midi_key(pitch.midi())),
                                vel: u7::new((*velocity).min(127)),
                            },
                        },
                    });
                }
                for (i, pitch) in pitches.iter().enumerate() {
                    track.push(TrackEvent {
                        delta: u28::new(if i == 0 { *ticks } else { 0 }),
                        kind: TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::NoteOff {
                                key: u7::new(midi_key(pitch.midi())),
                                vel: u7::new(0),
                            },
                        },
                    });
                }
                pending = 0;
            }
        }
    }

    track.push(TrackEvent {
        delta: u28::new(pending),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
}

fn midi_key(number: i32) -> u8 {
    number.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BAR_TICKS;
    use crate::pitch::Pitch;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    /// Absolute tick of every note-on/off in a track, as (tick, on, key).
    fn note_timeline(track: &Track<'_>) -> Vec<(u32, bool, u8)> {
        let mut now = 0;
        let mut out = Vec::new();
        for ev in track {
            now += ev.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = ev.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => out.push((now, true, key.as_int())),
                    MidiMessage::NoteOff { key, .. } => out.push((now, false, key.as_int())),
                    _ => {}
                }
            }
        }
        out
    }

    fn end_tick(track: &Track<'_>) -> u32 {
        track.iter().map(|ev| ev.delta.as_int()).sum()
    }

    #[test]
    fn test_two_tracks() {
        let piece = Composition {
            lead: vec![Event::rest(BAR_TICKS)],
            rhythm: vec![Event::rest(BAR_TICKS)],
        };
        let smf = composition_to_smf(&piece);
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(smf.header.format, Format::Parallel);
    }

    #[test]
    fn test_rests_then_note_timing() {
        let piece = Composition {
            lead: vec![
                Event::rest(240),
                Event::note(p("C4"), 90, 240),
                Event::rest(BAR_TICKS - 480),
            ],
            rhythm: vec![Event::Notes {
                pitches: vec![p("C3"), p("G3")],
                velocity: 48,
                ticks: 120,
            }],
        };
        let smf = composition_to_smf(&piece);

        assert_eq!(note_timeline(&smf.tracks[0]), vec![(240, true, 60), (480, false, 60)]);
        assert_eq!(end_tick(&smf.tracks[0]), BAR_TICKS);

        assert_eq!(
            note_timeline(&smf.tracks[1]),
            vec![(0, true, 48), (0, true, 55), (120, false, 48), (120, false, 55)]
        );
    }

    #[test]
    fn test_bytes_parse_back() {
        let piece = Composition {
            lead: vec![Event::note(p("E4"), 90, BAR_TICKS)],
            rhythm: vec![Event::rest(BAR_TICKS)],
        };
        let bytes = composition_to_bytes(&piece).unwrap();
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 2);
    }
}
