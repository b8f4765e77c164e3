// Externally supplied lookup tables: scales and rhythm schemes.
//
// Both tables are JSON objects keyed by display name, and key order is the
// order names are offered to the user, so parsing keeps insertion order
// (serde_json `preserve_order`). The core only ever reads them.
//
// Scale table:
//   { "C major": ["C4", "D4", "E4", ...], ... }
//
// Rhythm table (one 16-character line per chord-relative voice; `-` is
// off, anything else is on):
//   { "Alberti": { "5": "----------------", "i": "x---x---x---x---",
//                  "iii": ..., "v": ..., "I": ..., "III": ... }, ... }
//
// A `null` or empty document is a valid, empty table. Only a document that
// is not an object at all is an error: a single bad row (a scale that is not
// a list of strings, a rhythm missing a voice) is logged and skipped so the
// rest of the table stays usable. Default tables ship
// embedded in the binary (`data/*.json`) and seed the user's app directory
// on first run; see config.rs.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Built-in scale table.
pub const DEFAULT_SCALES_JSON: &str = include_str!("../data/scales.json");

/// Built-in rhythm table.
pub const DEFAULT_RHYTHMS_JSON: &str = include_str!("../data/rhythms.json");

/// Parse a top-level JSON object, accepting `null` and blank input as
/// empty.
fn parse_object(json: &str) -> Result<Map<String, Value>, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Option<Map<String, Value>> = serde_json::from_str(json)?;
    Ok(value.unwrap_or_default())
}

/// Deserialize each row of a top-level object on its own, dropping (with a
/// warning) the rows that do not fit `T`.
fn parse_rows<T: DeserializeOwned>(
    json: &str,
    kind: &'static str,
) -> Result<impl Iterator<Item = (String, T)>, serde_json::Error> {
    Ok(parse_object(json)?
        .into_iter()
        .filter_map(move |(name, value)| match serde_json::from_value(value) {
            Ok(row) => Some((name, row)),
            Err(e) => {
                tracing::warn!(%kind, %name, "skipping malformed table row: {e}");
                None
            }
        }))
}

/// Scale name → pitch spellings, in file order.
#[derive(Debug, Clone, Default)]
pub struct ScaleTable {
    entries: Vec<(String, Vec<String>)>,
}

impl ScaleTable {
    /// Parse the scale table. Entries whose value is not a list of strings
    /// are skipped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries = parse_rows(json, "scale")?
            .map(|(name, spellings): (String, Option<Vec<String>>)| {
                (name, spellings.unwrap_or_default())
            })
            .collect();
        Ok(ScaleTable { entries })
    }

    pub fn default_table() -> Self {
        Self::from_json(DEFAULT_SCALES_JSON).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spellings)| spellings.as_slice())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One rhythm table row, as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RhythmRow {
    #[serde(rename = "5")]
    pub sub: String,
    pub i: String,
    pub iii: String,
    pub v: String,
    #[serde(rename = "I")]
    pub upper_i: String,
    #[serde(rename = "III")]
    pub upper_iii: String,
}

impl RhythmRow {
    /// Voice lines in `5, i, iii, v, I, III` order.
    pub fn lines(&self) -> [&str; 6] {
        [
            self.sub.as_str(),
            self.i.as_str(),
            self.iii.as_str(),
            self.v.as_str(),
            self.upper_i.as_str(),
            self.upper_iii.as_str(),
        ]
    }
}

/// Rhythm name → row, in file order.
#[derive(Debug, Clone, Default)]
pub struct RhythmTable {
    entries: Vec<(String, RhythmRow)>,
}

impl RhythmTable {
    /// Parse the rhythm table. Rows missing one of the six voices are
    /// skipped; line lengths are checked later, at resolution.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries = parse_rows(json, "rhythm")?.collect();
        Ok(RhythmTable { entries })
    }

    pub fn default_table() -> Self {
        Self::from_json(DEFAULT_RHYTHMS_JSON).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&RhythmRow> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_parse() {
        let scales = ScaleTable::from_json(DEFAULT_SCALES_JSON).unwrap();
        assert!(!scales.is_empty());
        let rhythms = RhythmTable::from_json(DEFAULT_RHYTHMS_JSON).unwrap();
        assert!(!rhythms.is_empty());
        for name in rhythms.names() {
            for line in rhythms.get(&name).unwrap().lines() {
                assert_eq!(line.chars().count(), 16, "rhythm {name:?}");
            }
        }
    }

    #[test]
    fn test_scale_names_keep_file_order() {
        let table =
            ScaleTable::from_json(r#"{"Zeta": ["C"], "Alpha": ["D"], "Mid": ["E"]}"#).unwrap();
        assert_eq!(table.names(), ["Zeta", "Alpha", "Mid"]);
        assert_eq!(table.get("Alpha").unwrap(), ["D".to_string()]);
        assert!(table.get("Missing").is_none());
    }

    #[test]
    fn test_null_and_blank_are_empty() {
        assert!(ScaleTable::from_json("null").unwrap().is_empty());
        assert!(ScaleTable::from_json("  ").unwrap().is_empty());
        assert!(RhythmTable::from_json("{}").unwrap().is_empty());
        let table = ScaleTable::from_json(r#"{"Nothing": null}"#).unwrap();
        assert_eq!(table.get("Nothing").unwrap().len(), 0);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(ScaleTable::from_json("[1, 2]").is_err());
        assert!(ScaleTable::from_json("{ not json").is_err());
        assert!(RhythmTable::from_json("\"text\"").is_err());
    }

    #[test]
    fn test_bad_scale_row_keeps_the_rest() {
        let table = ScaleTable::from_json(
            r#"{"Good": ["C", "E"], "Number": 5, "Mixed": ["C", 3], "Last": ["G"]}"#,
        )
        .unwrap();
        assert_eq!(table.names(), ["Good", "Last"]);
        assert_eq!(table.get("Good").unwrap(), ["C".to_string(), "E".to_string()]);
    }

    #[test]
    fn test_bad_rhythm_row_keeps_the_rest() {
        let table = RhythmTable::from_json(
            r#"{
                "Good": {
                    "5": "----------------", "i": "x---------------",
                    "iii": "----------------", "v": "----------------",
                    "I": "----------------", "III": "----------------"
                },
                "Typo": {"5": "----------------", "i": "x---------------"}
            }"#,
        )
        .unwrap();
        assert_eq!(table.names(), ["Good"]);
        assert!(table.get("Typo").is_none());
        assert_eq!(table.get("Good").unwrap().i, "x---------------");
    }
}
