// Per-bar accompaniment tracks.
//
// Accompaniment follows the chord, not the melody: every bar is rendered
// from its stored chord whether or not the bar is being regenerated.

use crate::chord::Triad;
use crate::grid::Event;
use crate::rhythm::RhythmPatternStore;

/// Render one bar of accompaniment.
pub fn render_bar(
    store: &mut RhythmPatternStore,
    rhythm_name: Option<&str>,
    chord: Option<&Triad>,
) -> Vec<Event> {
    store.realize(rhythm_name, chord)
}

/// Render one track per chord slot, in bar order.
#[tracing::instrument(level = "trace", skip(store, chords))]
pub fn render_bars<const N: usize>(
    store: &mut RhythmPatternStore,
    rhythm_name: Option<&str>,
    chords: [Option<&Triad>; N],
) -> [Vec<Event>; N] {
    chords.map(|chord| render_bar(store, rhythm_name, chord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BAR_TICKS;
    use crate::tables::RhythmTable;

    #[test]
    fn test_bars_follow_their_chords() {
        let mut store = RhythmPatternStore::new(RhythmTable::default_table());
        let c = Triad::build("C").unwrap();
        let g = Triad::build("G").unwrap();
        let tracks = render_bars(
            &mut store,
            Some("Quarters"),
            [Some(&c), None, Some(&g), Some(&c)],
        );

        assert_eq!(tracks[0].len(), 16);
        assert_eq!(tracks[1], vec![Event::rest(BAR_TICKS)]);
        assert_eq!(tracks[2].len(), 16);
        assert_eq!(tracks[0], tracks[3]);
        assert_ne!(tracks[0], tracks[2]);
    }

    #[test]
    fn test_no_rhythm_selected() {
        let mut store = RhythmPatternStore::new(RhythmTable::default_table());
        let c = Triad::build("C").unwrap();
        assert_eq!(render_bar(&mut store, None, Some(&c)), vec![Event::rest(BAR_TICKS)]);
    }
}
