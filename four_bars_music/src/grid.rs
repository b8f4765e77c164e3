// The bar grid and the timed events everything else is built from.
//
// A bar is always four quarter notes. The melody divides it into 8 or 16
// cells (`Grid`); each cell holds a pitch or is empty. The accompaniment
// always uses 16 sixteenth-note steps, whatever the melodic grid is.
//
// Time is measured in MIDI ticks (480 per quarter) so every duration the
// generator produces (eighths, sixteenths, whole bars) is an exact integer
// and bars concatenate without drift.
//
// `MelodyData` is the one fact about a bar's melody: its cells. The playable
// line of notes and rests is derived from the cells when the value is
// built, and neither view can be changed independently afterwards.

use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per quarter note for all timelines and the exported file.
pub const TICKS_PER_QUARTER: u32 = 480;

/// Quarter notes in a bar (fixed 4/4 form).
pub const QUARTERS_PER_BAR: u32 = 4;

/// Ticks in one bar.
pub const BAR_TICKS: u32 = TICKS_PER_QUARTER * QUARTERS_PER_BAR;

/// Velocity of generated melody notes.
pub const MELODY_VELOCITY: u8 = 90;

/// Melodic subdivision of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grid {
    Eighths,
    Sixteenths,
}

impl Grid {
    pub const ALL: [Grid; 2] = [Grid::Eighths, Grid::Sixteenths];

    /// Number of cells per bar.
    pub fn size(self) -> usize {
        match self {
            Grid::Eighths => 8,
            Grid::Sixteenths => 16,
        }
    }

    pub fn from_size(size: usize) -> Option<Grid> {
        match size {
            8 => Some(Grid::Eighths),
            16 => Some(Grid::Sixteenths),
            _ => None,
        }
    }

    /// Ticks covered by one cell.
    pub fn cell_ticks(self) -> u32 {
        BAR_TICKS / self.size() as u32
    }

    /// Cell duration in quarter notes (`4 / size`).
    pub fn cell_quarters(self) -> f64 {
        QUARTERS_PER_BAR as f64 / self.size() as f64
    }
}

/// One slot on a timeline: silence, or one or more simultaneous pitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Rest { ticks: u32 },
    Notes {
        pitches: Vec<Pitch>,
        velocity: u8,
        ticks: u32,
    },
}

impl Event {
    pub fn rest(ticks: u32) -> Self {
        Event::Rest { ticks }
    }

    pub fn note(pitch: Pitch, velocity: u8, ticks: u32) -> Self {
        Event::Notes {
            pitches: vec![pitch],
            velocity,
            ticks,
        }
    }

    pub fn ticks(&self) -> u32 {
        match self {
            Event::Rest { ticks } | Event::Notes { ticks, .. } => *ticks,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Event::Rest { .. })
    }

    /// Sounding pitches (empty for a rest).
    pub fn pitches(&self) -> &[Pitch] {
        match self {
            Event::Rest { .. } => &[],
            Event::Notes { pitches, .. } => pitches,
        }
    }
}

/// Total ticks spanned by a sequence of events.
pub fn total_ticks(events: &[Event]) -> u32 {
    events.iter().map(Event::ticks).sum()
}

/// A bar of melody: the editable cells plus the derived playable line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<Pitch>>", into = "Vec<Option<Pitch>>")]
pub struct MelodyData {
    grid: Grid,
    cells: Vec<Option<Pitch>>,
    line: Vec<Event>,
}

impl MelodyData {
    /// An all-rest bar on the given grid.
    pub fn empty(grid: Grid) -> Self {
        Self::build(grid, vec![None; grid.size()])
    }

    /// Build from cells. Returns `None` unless `cells.len()` is a grid size.
    pub fn from_cells(cells: Vec<Option<Pitch>>) -> Option<Self> {
        let grid = Grid::from_size(cells.len())?;
        Some(Self::build(grid, cells))
    }

    fn build(grid: Grid, cells: Vec<Option<Pitch>>) -> Self {
        debug_assert_eq!(cells.len(), grid.size());
        let ticks = grid.cell_ticks();
        let line = cells
            .iter()
            .map(|cell| match cell {
                Some(pitch) => Event::note(*pitch, MELODY_VELOCITY, ticks),
                None => Event::rest(ticks),
            })
            .collect();
        MelodyData { grid, cells, line }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// The editable projection: one entry per grid cell.
    pub fn cells(&self) -> &[Option<Pitch>] {
        &self.cells
    }

    /// The playable line: one note or rest per cell, each `4 / size`
    /// quarters long.
    pub fn line(&self) -> &[Event] {
        &self.line
    }

    /// Grid positions holding a note, ascending.
    pub fn onsets(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|_| i))
            .collect()
    }

    /// Count of non-rest cells.
    pub fn note_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Compact text view for terminals, e.g. `C4 .  E4 .  ...`.
    pub fn summary(&self) -> String {
        let cells: Vec<String> = self
            .cells
            .iter()
            .map(|cell| match cell {
                Some(p) => format!("{:<4}", p.to_string()),
                None => format!("{:<4}", "."),
            })
            .collect();
        cells.join("").trim_end().to_string()
    }
}

impl TryFrom<Vec<Option<Pitch>>> for MelodyData {
    type Error = String;

    fn try_from(cells: Vec<Option<Pitch>>) -> Result<Self, Self::Error> {
        let len = cells.len();
        MelodyData::from_cells(cells)
            .ok_or_else(|| format!("melody must have 8 or 16 cells, got {len}"))
    }
}

impl From<MelodyData> for Vec<Option<Pitch>> {
    fn from(data: MelodyData) -> Self {
        data.cells
    }
}

impl fmt::Display for MelodyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
