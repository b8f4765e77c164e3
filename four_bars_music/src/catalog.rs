// Scale resolution: scale name → ordered, duplicate-free pitches.
//
// The pitch set handed to the melody generator. Lookups never fail: an
// unknown name or an empty table resolves to an empty set, which the
// generator turns into a bar of rests. Spellings that do not parse are
// dropped with a warning so one typo in a user-edited table does not
// silence the whole scale.
//
// Results are memoized per name. The cache lives as long as the catalog's
// table; `reload` swaps the table and clears it.

use crate::pitch::Pitch;
use crate::tables::ScaleTable;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PitchCatalog {
    table: ScaleTable,
    cache: HashMap<String, Vec<Pitch>>,
}

impl PitchCatalog {
    pub fn new(table: ScaleTable) -> Self {
        PitchCatalog {
            table,
            cache: HashMap::new(),
        }
    }

    /// Pitches of the named scale, in table order. Empty when the name is
    /// unknown.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn resolve(&mut self, scale_name: &str) -> &[Pitch] {
        let table = &self.table;
        self.cache
            .entry(scale_name.to_string())
            .or_insert_with(|| parse_scale(table, scale_name))
    }

    /// Scale names in table order.
    pub fn scale_names(&self) -> Vec<String> {
        self.table.names()
    }

    /// Replace the backing table and drop every cached resolution.
    pub fn reload(&mut self, table: ScaleTable) {
        self.table = table;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}

fn parse_scale(table: &ScaleTable, scale_name: &str) -> Vec<Pitch> {
    let Some(spellings) = table.get(scale_name) else {
        tracing::debug!(scale = scale_name, "unknown scale, resolving to no pitches");
        return Vec::new();
    };

    let mut pitches: Vec<Pitch> = Vec::with_capacity(spellings.len());
    for spelling in spellings {
        match spelling.parse::<Pitch>() {
            Ok(pitch) if !pitches.contains(&pitch) => pitches.push(pitch),
            Ok(_) => {}
            Err(e) => tracing::warn!(scale = scale_name, "skipping scale entry: {e}"),
        }
    }
    pitches
}
