// Assembly of four bars into one two-track timeline.
//
// The lead track is the four melodic lines end to end; the rhythm track is
// the four accompaniment bars end to end. Both start at tick zero. Bars
// are hard cuts: nothing is tied or merged across a bar line.

use crate::grid::{Event, MelodyData, total_ticks};

/// Bars per composition.
pub const BARS: usize = 4;

/// A finished four-bar piece, ready for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub lead: Vec<Event>,
    pub rhythm: Vec<Event>,
}

impl Composition {
    /// Length of the piece in ticks (the longer of the two tracks).
    pub fn total_ticks(&self) -> u32 {
        total_ticks(&self.lead).max(total_ticks(&self.rhythm))
    }
}

/// Concatenate melodies and accompaniment in bar order.
#[tracing::instrument(level = "trace", skip_all)]
pub fn assemble(melodies: &[MelodyData; BARS], accompaniment: &[Vec<Event>; BARS]) -> Composition {
    let lead = melodies
        .iter()
        .flat_map(|m| m.line().iter().cloned())
        .collect();
    let rhythm = accompaniment.iter().flatten().cloned().collect();
    Composition { lead, rhythm }
}
