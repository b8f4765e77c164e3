// Random melody generation for one bar.
//
// The algorithm:
// 1. Pick `note_count` distinct onset cells uniformly (no replacement) and
//    sort them, so notes are always time-ordered.
// 2. Draw one pitch per onset. Without a chord, draws are uniform with
//    replacement over the scale. With a chord, the scale is filtered to
//    chord tones by spelled name; `ceil(note_count * threshold)` pitches
//    come from the chord tones and the rest from the whole scale, and the
//    combined list is shuffled so chord tones are not biased toward any
//    position in the bar. If no scale pitch is a chord tone the chord is
//    ignored.
// 3. Pair sorted onsets with the pitch list; every other cell is a rest.
//
// Nothing here can fail. An empty scale or a note count of zero yields a
// silent bar, and the note count is clamped to the grid size.
//
// The random source is always passed in, so a seeded `Xoshiro` reproduces
// the same bar.

use crate::chord::Triad;
use crate::grid::{Grid, MelodyData};
use crate::pitch::Pitch;
use four_bars_prng::RandomSource;

/// Default share of notes drawn from the chord.
pub const DEFAULT_CHORD_TONE_THRESHOLD: f64 = 1.0;

/// Clamp a chord-tone threshold into `[0, 1]`. NaN means "all chord tones".
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_CHORD_TONE_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// Generate one bar of melody.
#[tracing::instrument(
    level = "trace",
    skip(pitch_set, chord, rng),
    fields(pitches = pitch_set.len(), chord = chord.map(Triad::name))
)]
pub fn generate(
    pitch_set: &[Pitch],
    note_count: usize,
    grid: Grid,
    chord: Option<&Triad>,
    chord_tone_threshold: f64,
    rng: &mut impl RandomSource,
) -> MelodyData {
    if pitch_set.is_empty() || note_count < 1 {
        return MelodyData::empty(grid);
    }
    let note_count = note_count.min(grid.size());

    let mut onsets = rng.sample_indices(grid.size(), note_count);
    onsets.sort_unstable();

    let pitches = draw_pitches(pitch_set, note_count, chord, chord_tone_threshold, rng);

    let mut cells: Vec<Option<Pitch>> = vec![None; grid.size()];
    for (onset, pitch) in onsets.into_iter().zip(pitches) {
        cells[onset] = Some(pitch);
    }

    MelodyData::from_cells(cells).unwrap_or_else(|| MelodyData::empty(grid))
}

/// Draw `note_count` pitches under the chord constraint.
fn draw_pitches(
    pitch_set: &[Pitch],
    note_count: usize,
    chord: Option<&Triad>,
    chord_tone_threshold: f64,
    rng: &mut impl RandomSource,
) -> Vec<Pitch> {
    let Some(chord) = chord else {
        return rng.choose_many(pitch_set, note_count);
    };

    let chord_tones: Vec<Pitch> = pitch_set
        .iter()
        .filter(|p| chord.contains_pitch_name(p))
        .copied()
        .collect();
    if chord_tones.is_empty() {
        tracing::debug!(chord = chord.name(), "scale has no chord tones, drawing freely");
        return rng.choose_many(pitch_set, note_count);
    }

    let threshold = clamp_threshold(chord_tone_threshold);
    let chord_count = ((note_count as f64 * threshold).ceil() as usize).min(note_count);
    let free_count = note_count - chord_count;

    let mut pitches = rng.choose_many(&chord_tones, chord_count);
    pitches.extend(rng.choose_many(pitch_set, free_count));
    rng.shuffle(&mut pitches);
    pitches
}
