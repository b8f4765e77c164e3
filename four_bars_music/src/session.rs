// The generation session: one refresh of four bars, end to end.
//
// `FourBars` owns every piece of state that outlives a single refresh: the
// scale and rhythm caches and the MIDI folder whose file count numbers the
// exports. The caller creates it once at startup (`init`, which also
// clears the previous session's MIDI files) and calls `refresh` for each
// request. `reload_tables` re-reads the table files and invalidates both
// caches; nothing is detected automatically.
//
// A refresh regenerates active bars, passes inactive bars through
// unchanged, renders accompaniment for all four bars from their chords,
// assembles the composition and exports it. It either returns all four bars
// plus the written file, or an error and nothing; the caller keeps its
// previous bars in that case.

use crate::accompaniment::render_bars;
use crate::catalog::PitchCatalog;
use crate::chord::Triad;
use crate::composition::{BARS, assemble};
use crate::config::{AppPaths, GenerationSettings};
use crate::error::Result;
use crate::export::MidiFolder;
use crate::generator::generate;
use crate::grid::MelodyData;
use crate::rhythm::RhythmPatternStore;
use crate::tables::{RhythmTable, ScaleTable};
use four_bars_prng::RandomSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One bar's state as held by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarState {
    pub chord: Option<Triad>,
    /// Active bars are regenerated; inactive bars are kept verbatim.
    pub active: bool,
    pub melody: MelodyData,
}

impl BarState {
    pub fn new(chord: Option<Triad>, settings: &GenerationSettings) -> Self {
        BarState {
            chord,
            active: true,
            melody: MelodyData::empty(settings.grid),
        }
    }
}

/// Everything needed for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub bars: [BarState; BARS],
    pub settings: GenerationSettings,
}

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// The four bars' melodies, for redisplay.
    pub bars: [MelodyData; BARS],
    /// The exported file.
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct FourBars {
    paths: Option<AppPaths>,
    catalog: PitchCatalog,
    rhythms: RhythmPatternStore,
    folder: MidiFolder,
}

impl FourBars {
    /// Start a session on an application directory: seed default tables,
    /// load both tables, and open (clear) the MIDI folder.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %paths.root.display()), err)]
    pub fn init(paths: AppPaths) -> Result<Self> {
        paths.ensure()?;
        let catalog = PitchCatalog::new(paths.load_scales());
        let rhythms = RhythmPatternStore::new(paths.load_rhythms());
        let folder = MidiFolder::open(&paths.midi)?;
        tracing::info!(
            scales = catalog.scale_names().len(),
            rhythms = rhythms.rhythm_names().len(),
            "session started"
        );
        Ok(FourBars {
            paths: Some(paths),
            catalog,
            rhythms,
            folder,
        })
    }

    /// Start a session on in-memory tables, exporting into `midi_dir`.
    pub fn with_tables(scales: ScaleTable, rhythms: RhythmTable, midi_dir: &Path) -> Result<Self> {
        Ok(FourBars {
            paths: None,
            catalog: PitchCatalog::new(scales),
            rhythms: RhythmPatternStore::new(rhythms),
            folder: MidiFolder::open(midi_dir)?,
        })
    }

    pub fn scale_names(&self) -> Vec<String> {
        self.catalog.scale_names()
    }

    pub fn rhythm_names(&self) -> Vec<String> {
        self.rhythms.rhythm_names()
    }

    pub fn midi_folder(&self) -> &Path {
        self.folder.path()
    }

    /// Re-read both table files (when the session has an app directory)
    /// and drop all cached lookups.
    pub fn reload_tables(&mut self) {
        match &self.paths {
            Some(paths) => {
                self.catalog.reload(paths.load_scales());
                self.rhythms.reload(paths.load_rhythms());
            }
            None => {
                self.catalog.invalidate();
                self.rhythms.invalidate();
            }
        }
    }

    /// Swap in new tables directly.
    pub fn replace_tables(&mut self, scales: ScaleTable, rhythms: RhythmTable) {
        self.catalog.reload(scales);
        self.rhythms.reload(rhythms);
    }

    /// Drop cached scale and rhythm lookups.
    pub fn invalidate(&mut self) {
        self.catalog.invalidate();
        self.rhythms.invalidate();
    }

    /// Regenerate active bars, render accompaniment, assemble and export.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(scale = %request.settings.scale_name, grid = ?request.settings.grid),
        err
    )]
    pub fn refresh(
        &mut self,
        request: &GenerationRequest,
        rng: &mut impl RandomSource,
    ) -> Result<GenerationResponse> {
        let settings = &request.settings;
        let scale = self.catalog.resolve(&settings.scale_name);
        if scale.is_empty() {
            tracing::warn!(
                scale = %settings.scale_name,
                "no pitches for scale, active bars will rest"
            );
        }

        let melodies: [MelodyData; BARS] = std::array::from_fn(|i| {
            let bar = &request.bars[i];
            if bar.active {
                generate(
                    scale,
                    settings.note_count,
                    settings.grid,
                    bar.chord.as_ref(),
                    settings.chord_tone_threshold,
                    &mut *rng,
                )
            } else {
                bar.melody.clone()
            }
        });

        let chords: [Option<&Triad>; BARS] =
            std::array::from_fn(|i| request.bars[i].chord.as_ref());
        let accompaniment = render_bars(&mut self.rhythms, settings.rhythm_name.as_deref(), chords);

        let composition = assemble(&melodies, &accompaniment);
        let path = self.folder.export(&composition)?;

        Ok(GenerationResponse {
            bars: melodies,
            path,
        })
    }
}
