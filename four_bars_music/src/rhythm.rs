// Rhythm schemes and their realization against a chord.
//
// A scheme switches six chord-relative voices on and off across a fixed
// 16-step (sixteenth-note) bar:
//
//   5    a fourth below the root
//   i    root
//   iii  third (major or minor, from the chord)
//   v    fifth
//   I    root an octave up
//   III  third above the upper root
//
// Realizing a scheme for a chord places the root in a fixed low register
// (`base_octave`) so the accompaniment sits in the same bass/mid range in
// every key, then emits one event per step: all voices that are on, sounded
// together at a soft velocity, or a rest. The result is always exactly 16
// events, independent of the melodic grid. Without a chord, or when the
// scheme cannot be resolved, the bar is a single whole-bar rest.
//
// Both resolutions and realizations are memoized until the table is
// reloaded.

use crate::chord::Triad;
use crate::grid::{BAR_TICKS, Event};
use crate::pitch::Pitch;
use crate::tables::{RhythmRow, RhythmTable};
use std::collections::HashMap;

/// Steps per accompaniment bar.
pub const RHYTHM_STEPS: usize = 16;

/// Ticks per accompaniment step (a sixteenth note).
pub const STEP_TICKS: u32 = BAR_TICKS / RHYTHM_STEPS as u32;

/// Velocity of accompaniment notes.
pub const ACCOMPANIMENT_VELOCITY: u8 = 48;

/// Chord-relative accompaniment voices, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RhythmVoice {
    Sub,
    Root,
    Third,
    Fifth,
    UpperRoot,
    UpperThird,
}

impl RhythmVoice {
    pub const ALL: [RhythmVoice; 6] = [
        RhythmVoice::Sub,
        RhythmVoice::Root,
        RhythmVoice::Third,
        RhythmVoice::Fifth,
        RhythmVoice::UpperRoot,
        RhythmVoice::UpperThird,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used as the table key.
    pub fn label(self) -> &'static str {
        match self {
            RhythmVoice::Sub => "5",
            RhythmVoice::Root => "i",
            RhythmVoice::Third => "iii",
            RhythmVoice::Fifth => "v",
            RhythmVoice::UpperRoot => "I",
            RhythmVoice::UpperThird => "III",
        }
    }

    /// Semitones above the placed root.
    fn offset(self, third: i32) -> i32 {
        match self {
            RhythmVoice::Sub => -5,
            RhythmVoice::Root => 0,
            RhythmVoice::Third => third,
            RhythmVoice::Fifth => 7,
            RhythmVoice::UpperRoot => 12,
            RhythmVoice::UpperThird => 12 + third,
        }
    }
}

/// A resolved scheme: six on/off lines of exactly 16 steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhythmScheme {
    steps: [[bool; RHYTHM_STEPS]; 6],
}

impl RhythmScheme {
    /// Build from a table row. `None` unless every line is exactly 16
    /// characters.
    pub fn from_row(row: &RhythmRow) -> Option<Self> {
        let mut steps = [[false; RHYTHM_STEPS]; 6];
        for (voice, line) in row.lines().into_iter().enumerate() {
            if line.chars().count() != RHYTHM_STEPS {
                return None;
            }
            for (step, c) in line.chars().enumerate() {
                steps[voice][step] = c != '-';
            }
        }
        Some(RhythmScheme { steps })
    }

    pub fn is_on(&self, voice: RhythmVoice, step: usize) -> bool {
        self.steps[voice.index()][step]
    }

    /// Voices sounding at a step, in table order.
    pub fn voices_at(&self, step: usize) -> Vec<RhythmVoice> {
        RhythmVoice::ALL
            .into_iter()
            .filter(|v| self.is_on(*v, step))
            .collect()
    }
}

/// Octave the accompaniment root is placed in, by the root's pitch class.
/// Keeps every key in roughly the A1 to D3 band for the root voice.
///
/// The band is chosen by pitch class, then corrected for spellings whose
/// letter sits across the B/C line from their sound (Cb is B, B# is C), so
/// enharmonic roots always sound the same key.
pub fn base_octave(root: &Pitch) -> i8 {
    let band = match root.midi().rem_euclid(12) {
        0 | 1 | 2 => 3,
        _ => 2,
    };
    let carry = (root.step().semitone() + i32::from(root.alter())).div_euclid(12);
    band - carry as i8
}

/// The six voice pitches for a chord, indexed by `RhythmVoice::index`.
pub fn voice_pitches(chord: &Triad) -> [Pitch; 6] {
    let root = chord.root();
    let placed = root.with_octave(base_octave(&root));
    let third = chord.third_interval();
    RhythmVoice::ALL.map(|v| placed.transpose(v.offset(third)))
}

#[derive(Debug, Clone, Default)]
pub struct RhythmPatternStore {
    table: RhythmTable,
    schemes: HashMap<String, Option<RhythmScheme>>,
    realized: HashMap<(String, String), Vec<Event>>,
}

impl RhythmPatternStore {
    pub fn new(table: RhythmTable) -> Self {
        RhythmPatternStore {
            table,
            schemes: HashMap::new(),
            realized: HashMap::new(),
        }
    }

    /// Resolve a scheme by name. `None` for unknown names and malformed
    /// rows.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn resolve(&mut self, rhythm_name: &str) -> Option<&RhythmScheme> {
        let table = &self.table;
        self.schemes
            .entry(rhythm_name.to_string())
            .or_insert_with(|| {
                let row = table.get(rhythm_name)?;
                let scheme = RhythmScheme::from_row(row);
                if scheme.is_none() {
                    tracing::warn!(
                        rhythm = rhythm_name,
                        "rhythm lines must be {RHYTHM_STEPS} steps, ignoring scheme"
                    );
                }
                scheme
            })
            .as_ref()
    }

    /// One bar of accompaniment: 16 sixteenth-note events, or a single
    /// whole-bar rest when there is no chord or no usable scheme.
    #[tracing::instrument(
        level = "trace",
        skip(self, chord),
        fields(chord = chord.map(Triad::name))
    )]
    pub fn realize(&mut self, rhythm_name: Option<&str>, chord: Option<&Triad>) -> Vec<Event> {
        let (Some(rhythm_name), Some(chord)) = (rhythm_name, chord) else {
            return vec![Event::rest(BAR_TICKS)];
        };

        let key = (rhythm_name.to_string(), chord.name().to_string());
        if let Some(events) = self.realized.get(&key) {
            return events.clone();
        }

        let Some(scheme) = self.resolve(rhythm_name) else {
            return vec![Event::rest(BAR_TICKS)];
        };
        let events = realize_scheme(scheme, chord);
        self.realized.insert(key, events.clone());
        events
    }

    pub fn rhythm_names(&self) -> Vec<String> {
        self.table.names()
    }

    /// Replace the backing table and drop both caches.
    pub fn reload(&mut self, table: RhythmTable) {
        self.table = table;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.schemes.clear();
        self.realized.clear();
    }
}

fn realize_scheme(scheme: &RhythmScheme, chord: &Triad) -> Vec<Event> {
    let pitches = voice_pitches(chord);
    (0..RHYTHM_STEPS)
        .map(|step| {
            let sounding: Vec<Pitch> = scheme
                .voices_at(step)
                .into_iter()
                .map(|v| pitches[v.index()])
                .collect();
            if sounding.is_empty() {
                Event::rest(STEP_TICKS)
            } else {
                Event::Notes {
                    pitches: sounding,
                    velocity: ACCOMPANIMENT_VELOCITY,
                    ticks: STEP_TICKS,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::total_ticks;

    const TABLE: &str = r#"{
        "Pulse": {
            "5":   "x---------------",
            "i":   "x---x---x---x---",
            "iii": "----------------",
            "v":   "--x---x---x---x-",
            "I":   "----------------",
            "III": "---------------x"
        },
        "Short": {
            "5": "x", "i": "x", "iii": "x", "v": "x", "I": "x", "III": "x"
        }
    }"#;

    fn store() -> RhythmPatternStore {
        RhythmPatternStore::new(RhythmTable::from_json(TABLE).unwrap())
    }

    fn chord(name: &str) -> Triad {
        Triad::build(name).unwrap()
    }

    fn names(pitches: &[Pitch]) -> Vec<String> {
        pitches.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_realize_is_sixteen_steps() {
        let mut store = store();
        let events = store.realize(Some("Pulse"), Some(&chord("C")));
        assert_eq!(events.len(), RHYTHM_STEPS);
        assert!(events.iter().all(|e| e.ticks() == STEP_TICKS));
        assert_eq!(total_ticks(&events), BAR_TICKS);
    }

    #[test]
    fn test_realize_stacks_voices() {
        let mut store = store();
        let events = store.realize(Some("Pulse"), Some(&chord("C")));
        assert_eq!(names(events[0].pitches()), ["G2", "C3"]);
        assert!(events[1].is_rest());
        assert_eq!(names(events[2].pitches()), ["G3"]);
        assert_eq!(names(events[15].pitches()), ["E4"]);
        match &events[0] {
            Event::Notes { velocity, .. } => assert_eq!(*velocity, ACCOMPANIMENT_VELOCITY),
            other => panic!("expected notes, got {other:?}"),
        }
    }

    #[test]
    fn test_minor_chord_voices() {
        let pitches = voice_pitches(&chord("Am"));
        assert_eq!(names(&pitches), ["E2", "A2", "C3", "E3", "A3", "C4"]);
    }

    #[test]
    fn test_base_octave_table() {
        for (root, octave) in [
            ("A", 2),
            ("A#", 2),
            ("B", 2),
            ("C", 3),
            ("C#", 3),
            ("D", 3),
            ("D#", 2),
            ("E", 2),
            ("F", 2),
            ("F#", 2),
            ("G", 2),
            ("G#", 2),
        ] {
            let pitch: Pitch = root.parse().unwrap();
            assert_eq!(base_octave(&pitch), octave, "root {root}");
        }
    }

    #[test]
    fn test_enharmonic_roots_sound_the_same() {
        for (spelled, plain) in [("Cb", "B"), ("B#", "C"), ("Fb", "E"), ("E#", "F")] {
            let a = voice_pitches(&chord(spelled));
            let b = voice_pitches(&chord(plain));
            let midi = |ps: [Pitch; 6]| ps.map(|p| p.midi());
            assert_eq!(midi(a), midi(b), "{spelled} vs {plain}");
        }
        assert_eq!(voice_pitches(&chord("Cb"))[1].midi(), 47);
        assert_eq!(voice_pitches(&chord("B#"))[1].midi(), 48);
        assert_eq!(voice_pitches(&chord("Cb"))[1].to_string(), "Cb3");
    }

    #[test]
    fn test_no_chord_is_single_rest() {
        let mut store = store();
        let events = store.realize(Some("Pulse"), None);
        assert_eq!(events, vec![Event::rest(BAR_TICKS)]);
    }

    #[test]
    fn test_unknown_rhythm_is_single_rest() {
        let mut store = store();
        let events = store.realize(Some("Missing"), Some(&chord("G")));
        assert_eq!(events, vec![Event::rest(BAR_TICKS)]);
        assert!(store.resolve("Missing").is_none());
        assert_eq!(store.realize(None, Some(&chord("G"))).len(), 1);
    }

    #[test]
    fn test_short_lines_are_rejected() {
        let mut store = store();
        assert!(store.resolve("Short").is_none());
        assert_eq!(store.realize(Some("Short"), Some(&chord("C"))).len(), 1);
    }

    #[test]
    fn test_reload_drops_realizations() {
        let mut store = store();
        assert_eq!(store.realize(Some("Pulse"), Some(&chord("C"))).len(), 16);
        store.reload(RhythmTable::default());
        assert_eq!(store.realize(Some("Pulse"), Some(&chord("C"))).len(), 1);
    }

    #[test]
    fn test_default_rhythms_realize() {
        let mut store = RhythmPatternStore::new(RhythmTable::default_table());
        for name in store.rhythm_names() {
            let events = store.realize(Some(&name), Some(&chord("F#m")));
            assert_eq!(events.len(), RHYTHM_STEPS, "rhythm {name:?}");
        }
    }
}
