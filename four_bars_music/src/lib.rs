// Four Bars: a four-bar phrase generator.
//
// Generates short random melodies constrained by a scale, an optional chord
// per bar and a note density, lays a chord-driven rhythmic accompaniment
// under them, and exports the four bars as a two-track MIDI file. Bars can
// be held (inactive) while the others are regenerated, so a phrase is built
// up by repeated refreshes.
//
// Architecture:
// - pitch.rs: Spelled pitches (letter + accidental + octave), transposition
// - chord.rs: Major/minor triads from chord names, chord-tone membership,
//   the circle-of-fifths chord wheel
// - grid.rs: Bar grid (8 or 16 cells), timed events, MelodyData
// - tables.rs: JSON scale and rhythm tables (external, read-only)
// - catalog.rs: Scale name → pitch set, memoized
// - rhythm.rs: Rhythm schemes and their realization against a chord
// - generator.rs: The random melody algorithm for one bar
// - accompaniment.rs: Chord-driven accompaniment per bar
// - composition.rs: Four bars → lead + accompaniment timeline
// - midi.rs: Composition → Standard MIDI File
// - export.rs: Session-numbered MIDI folder
// - config.rs: App directory layout, table seeding, generation settings
// - session.rs: `FourBars`, the session context that runs a refresh
// - error.rs: Error types
//
// All randomness is injected (`four_bars_prng::RandomSource`), so output is
// deterministic given a seed.

pub mod accompaniment;
pub mod catalog;
pub mod chord;
pub mod composition;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod grid;
pub mod midi;
pub mod pitch;
pub mod rhythm;
pub mod session;
pub mod tables;

pub use chord::Triad;
pub use config::{AppPaths, GenerationSettings};
pub use error::{FourBarsError, Result};
pub use grid::{Grid, MelodyData};
pub use pitch::Pitch;
pub use session::{BarState, FourBars, GenerationRequest, GenerationResponse};
