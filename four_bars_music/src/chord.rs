// Major and minor triads built from chord names.
//
// A chord name is a root spelling with an optional trailing `m` for minor
// ("C", "F#", "Bbm"). The triad stacks a major (4) or minor (3) third and a
// perfect fifth (7) on the root, spelled by `Pitch::transpose`.
//
// The melody generator only asks one question of a triad: is this scale
// pitch one of my tones, by spelled name? Octaves do not matter there.
//
// `chord_wheel()` is the circle-of-fifths layout offered to chord pickers.
// It has no effect on generation.

use crate::error::{FourBarsError, Result};
use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Major chords in circle-of-fifths order.
pub const MAJOR_CHORDS: [&str; 12] = [
    "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#", "F",
];

/// Relative minors, aligned with `MAJOR_CHORDS`.
pub const MINOR_CHORDS: [&str; 12] = [
    "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m", "A#m", "Fm", "Cm", "Gm", "Dm",
];

/// The wheel starts this many positions into each ring.
const WHEEL_ROTATION: usize = 3;

/// An immutable three-note chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Triad {
    name: String,
    is_major: bool,
    pitches: [Pitch; 3],
}

impl Triad {
    /// Build a triad from a chord name. Fails with `InvalidRoot` when the
    /// root (after stripping a trailing `m`) is not a pitch spelling.
    #[tracing::instrument(level = "debug", err)]
    pub fn build(name: &str) -> Result<Triad> {
        let name = name.trim();
        let is_major = !name.ends_with('m');
        let root_name = if is_major {
            name
        } else {
            &name[..name.len() - 1]
        };
        if root_name.is_empty() {
            return Err(FourBarsError::InvalidRoot(name.to_string()));
        }
        let root: Pitch = root_name
            .parse()
            .map_err(|_| FourBarsError::InvalidRoot(name.to_string()))?;

        let third = root.transpose(if is_major { 4 } else { 3 });
        let fifth = root.transpose(7);
        Ok(Triad {
            name: name.to_string(),
            is_major,
            pitches: [root, third, fifth],
        })
    }

    /// The chord name as given, e.g. "F#m".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root spelling without the minor suffix, e.g. "F#".
    pub fn root_name(&self) -> &str {
        if self.is_major {
            &self.name
        } else {
            &self.name[..self.name.len() - 1]
        }
    }

    pub fn is_major(&self) -> bool {
        self.is_major
    }

    /// Root, third, fifth.
    pub fn pitches(&self) -> &[Pitch; 3] {
        &self.pitches
    }

    pub fn root(&self) -> Pitch {
        self.pitches[0]
    }

    /// Semitones from root to third.
    pub fn third_interval(&self) -> i32 {
        if self.is_major { 4 } else { 3 }
    }

    /// True when a chord tone has the same spelled name as `pitch`,
    /// regardless of octave.
    pub fn contains_pitch_name(&self, pitch: &Pitch) -> bool {
        self.pitches.iter().any(|p| p.same_name(pitch))
    }
}

impl TryFrom<String> for Triad {
    type Error = FourBarsError;

    fn try_from(value: String) -> Result<Self> {
        Triad::build(&value)
    }
}

impl From<Triad> for String {
    fn from(triad: Triad) -> String {
        triad.name
    }
}

impl fmt::Display for Triad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Chord names as laid out on the picker wheel: (outer major ring, inner
/// minor ring), each rotated so the wheel opens on A / F#m.
pub fn chord_wheel() -> ([&'static str; 12], [&'static str; 12]) {
    let mut majors = MAJOR_CHORDS;
    let mut minors = MINOR_CHORDS;
    majors.rotate_left(WHEEL_ROTATION);
    minors.rotate_left(WHEEL_ROTATION);
    (majors, minors)
}
