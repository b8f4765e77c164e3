// Spelled pitches: letter + accidental + octave.
//
// Scale tables and chord names arrive as spellings ("C", "F#", "Bb4"), and
// chord-tone matching compares those spellings, not MIDI numbers: `E#` and
// `F` are different names even though they sound the same. So a `Pitch`
// keeps the letter (`Step`), the chromatic alteration and the octave, and
// transposition moves the letter by the generic interval that matches the
// semitone count (4 semitones is a major third, so C# + 4 = E#).
//
// MIDI numbers are derived on demand for export (C4 = 60).

use crate::error::{FourBarsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Octave used when a spelling carries none ("C" means C4).
pub const DEFAULT_OCTAVE: i8 = 4;

/// Diatonic letter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::C,
        Step::D,
        Step::E,
        Step::F,
        Step::G,
        Step::A,
        Step::B,
    ];

    /// Position in the C-based diatonic order (C = 0, B = 6).
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Semitones above C of the natural letter.
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    fn from_index(index: i32) -> Step {
        Step::ALL[index.rem_euclid(7) as usize]
    }

    fn from_char(c: char) -> Option<Step> {
        match c.to_ascii_uppercase() {
            'C' => Some(Step::C),
            'D' => Some(Step::D),
            'E' => Some(Step::E),
            'F' => Some(Step::F),
            'G' => Some(Step::G),
            'A' => Some(Step::A),
            'B' => Some(Step::B),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }
}

/// Letter steps spanned by the conventional interval for each semitone
/// count within an octave: P1 m2 M2 m3 M3 P4 d5 P5 m6 M6 m7 M7.
const GENERIC_STEPS: [i32; 12] = [0, 1, 1, 2, 2, 3, 4, 4, 5, 5, 6, 6];

/// A spelled pitch with octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    step: Step,
    /// Chromatic alteration: +1 sharp, -1 flat, 0 natural.
    alter: i8,
    octave: i8,
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Self {
        Pitch {
            step,
            alter,
            octave,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn alter(&self) -> i8 {
        self.alter
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Spelled name without octave, e.g. "F#", "Bb", "C".
    pub fn name(&self) -> String {
        let mut out = String::new();
        out.push(self.step.letter());
        let accidental = if self.alter > 0 { '#' } else { 'b' };
        for _ in 0..self.alter.unsigned_abs() {
            out.push(accidental);
        }
        out
    }

    /// Octave-independent spelling comparison.
    pub fn same_name(&self, other: &Pitch) -> bool {
        self.step == other.step && self.alter == other.alter
    }

    /// MIDI note number (C4 = 60). May fall outside 0..=127 for extreme
    /// octaves; callers clamp when encoding.
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.step.semitone() + self.alter as i32
    }

    /// Transpose by a signed semitone count, respelling along the
    /// conventional interval for that count.
    pub fn transpose(&self, semitones: i32) -> Pitch {
        let octaves = semitones.div_euclid(12);
        let rem = semitones.rem_euclid(12);
        let generic = octaves * 7 + GENERIC_STEPS[rem as usize];

        let diatonic = self.octave as i32 * 7 + self.step.index() + generic;
        let step = Step::from_index(diatonic);
        let octave = diatonic.div_euclid(7);

        let natural = (octave + 1) * 12 + step.semitone();
        let alter = self.midi() + semitones - natural;
        Pitch {
            step,
            alter: alter as i8,
            octave: octave as i8,
        }
    }

    /// Same spelling, different octave.
    pub fn with_octave(&self, octave: i8) -> Pitch {
        Pitch { octave, ..*self }
    }
}

impl FromStr for Pitch {
    type Err = FourBarsError;

    /// Parse "C", "c#", "Eb", "B-3", "F##5". Flats may be written `b` or
    /// `-`. A missing octave means `DEFAULT_OCTAVE`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FourBarsError::InvalidPitch(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars().peekable();

        let step = chars.next().and_then(Step::from_char).ok_or_else(invalid)?;

        let mut alter: i8 = 0;
        while let Some(&c) = chars.peek() {
            match c {
                '#' => alter += 1,
                'b' | '-' => alter -= 1,
                _ => break,
            }
            chars.next();
        }

        let rest: String = chars.collect();
        let octave = if rest.is_empty() {
            DEFAULT_OCTAVE
        } else {
            rest.parse::<i8>().map_err(|_| invalid())?
        };
        if alter.abs() > 2 || !(-1..=9).contains(&octave) {
            return Err(invalid());
        }

        Ok(Pitch {
            step,
            alter,
            octave,
        })
    }
}

impl TryFrom<String> for Pitch {
    type Error = FourBarsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> String {
        pitch.to_string()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!(p("C"), Pitch::new(Step::C, 0, 4));
        assert_eq!(p("f#3"), Pitch::new(Step::F, 1, 3));
        assert_eq!(p("Bb"), Pitch::new(Step::B, -1, 4));
        assert_eq!(p("E-2"), Pitch::new(Step::E, -1, 2));
        assert_eq!(p(" G##5 "), Pitch::new(Step::G, 2, 5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Pitch>().is_err());
        assert!("H".parse::<Pitch>().is_err());
        assert!("C#x".parse::<Pitch>().is_err());
        assert!("Cm".parse::<Pitch>().is_err());
        assert!("C###".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_midi_numbers() {
        assert_eq!(p("C4").midi(), 60);
        assert_eq!(p("A4").midi(), 69);
        assert_eq!(p("C#3").midi(), 49);
        assert_eq!(p("Cb4").midi(), 59);
    }

    #[test]
    fn test_transpose_spelling() {
        assert_eq!(p("C4").transpose(4).to_string(), "E4");
        assert_eq!(p("A4").transpose(3).to_string(), "C5");
        assert_eq!(p("C#4").transpose(4).to_string(), "E#4");
        assert_eq!(p("F4").transpose(3).to_string(), "Ab4");
        assert_eq!(p("B3").transpose(7).to_string(), "F#4");
        assert_eq!(p("A2").transpose(12).to_string(), "A3");
    }

    #[test]
    fn test_transpose_down_a_fourth() {
        assert_eq!(p("C3").transpose(-5).to_string(), "G2");
        assert_eq!(p("D#2").transpose(-5).to_string(), "A#1");
        assert_eq!(p("C3").transpose(-5).midi(), p("C3").midi() - 5);
    }

    #[test]
    fn test_same_name_ignores_octave() {
        assert!(p("E2").same_name(&p("E5")));
        assert!(!p("E#4").same_name(&p("F4")));
        assert!(!p("C#4").same_name(&p("Db4")));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("F#3")).unwrap();
        assert_eq!(json, "\"F#3\"");
        let back: Pitch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("F#3"));
    }
}
