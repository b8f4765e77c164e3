// Application directory layout, table loading, and generation settings.
//
// Everything the app writes lives under one per-user directory
// (`~/.four_bars` by default):
//
//   scales.json    scale table (user-editable)
//   rhythms.json   rhythm table (user-editable)
//   midi/          exported files, cleared each session
//   error.log      errors from every session, appended
//
// On startup missing or empty tables are seeded from the built-in defaults.
// A table that exists but does not parse is left untouched on disk; the
// session runs with an empty table in its place and logs the error, which
// degrades generation to rests instead of refusing to start.

use crate::error::{FourBarsError, Result};
use crate::generator::DEFAULT_CHORD_TONE_THRESHOLD;
use crate::grid::Grid;
use crate::tables::{DEFAULT_RHYTHMS_JSON, DEFAULT_SCALES_JSON, RhythmTable, ScaleTable};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Directory name under the user's home.
const APP_DIR_NAME: &str = ".four_bars";

/// File locations for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub scales: PathBuf,
    pub rhythms: PathBuf,
    pub midi: PathBuf,
    pub error_log: PathBuf,
}

impl AppPaths {
    /// Layout under an explicit root directory.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        AppPaths {
            scales: root.join("scales.json"),
            rhythms: root.join("rhythms.json"),
            midi: root.join("midi"),
            error_log: root.join("error.log"),
            root,
        }
    }

    /// The per-user default (`~/.four_bars`), falling back to the working
    /// directory when no home directory is known.
    pub fn user_default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::under(home.join(APP_DIR_NAME))
    }

    /// Create the root directory and seed any missing or blank table file
    /// with the built-in defaults.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        seed_if_blank(&self.scales, DEFAULT_SCALES_JSON)?;
        seed_if_blank(&self.rhythms, DEFAULT_RHYTHMS_JSON)?;
        Ok(())
    }

    /// Open the persistent error log for appending, creating the root
    /// directory and the file as needed.
    pub fn open_error_log(&self) -> Result<File> {
        std::fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_log)?;
        Ok(file)
    }

    /// Load the scale table, degrading to empty on any error.
    pub fn load_scales(&self) -> ScaleTable {
        load_or_empty(&self.scales, ScaleTable::from_json)
    }

    /// Load the rhythm table, degrading to empty on any error.
    pub fn load_rhythms(&self) -> RhythmTable {
        load_or_empty(&self.rhythms, RhythmTable::from_json)
    }
}

fn seed_if_blank(path: &Path, default_json: &str) -> Result<()> {
    let blank = match std::fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            trimmed.is_empty() || trimmed == "null" || trimmed == "{}"
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };
    if blank {
        tracing::info!(path = %path.display(), "writing default table");
        std::fs::write(path, default_json)?;
    }
    Ok(())
}

fn load_or_empty<T: Default>(
    path: &Path,
    parse: impl Fn(&str) -> std::result::Result<T, serde_json::Error>,
) -> T {
    let loaded = std::fs::read_to_string(path)
        .map_err(FourBarsError::from)
        .and_then(|json| {
            parse(&json).map_err(|source| FourBarsError::Table {
                path: path.to_path_buf(),
                source,
            })
        });
    match loaded {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("{e}; continuing with an empty table");
            T::default()
        }
    }
}

/// Global generation settings shared by all four bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub scale_name: String,
    pub note_count: usize,
    pub grid: Grid,
    pub chord_tone_threshold: f64,
    pub rhythm_name: Option<String>,
}

impl GenerationSettings {
    /// Defaults for a grid: 4 notes per eighths bar, 6 per sixteenths bar,
    /// every note a chord tone.
    pub fn for_grid(grid: Grid) -> Self {
        GenerationSettings {
            scale_name: String::new(),
            note_count: match grid {
                Grid::Eighths => 4,
                Grid::Sixteenths => 6,
            },
            grid,
            chord_tone_threshold: DEFAULT_CHORD_TONE_THRESHOLD,
            rhythm_name: None,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::for_grid(Grid::Eighths)
    }
}
