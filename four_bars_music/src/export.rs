// Writing compositions into the session's MIDI folder.
//
// Files are numbered per session: the next file is `<n>.mid` where `n` is
// one more than the number of files already in the folder. The folder is
// emptied once when it is opened at startup, so numbering restarts at 1
// every run and a previous session's files do not accumulate.
//
// A failed write is surfaced as `ExportFailed` and never retried.

use crate::composition::Composition;
use crate::error::{FourBarsError, Result};
use crate::midi::composition_to_bytes;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MidiFolder {
    dir: PathBuf,
}

impl MidiFolder {
    /// Create the folder if needed and remove any files left from a prior
    /// session. Subdirectories are left alone.
    #[tracing::instrument(level = "debug", err)]
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut removed = 0;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "cleared previous session's files");
        }
        Ok(MidiFolder {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Number of regular files currently in the folder.
    pub fn file_count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Path the next export will be written to.
    pub fn next_path(&self) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.mid", self.file_count()? + 1)))
    }

    /// Serialize and write a composition. Returns the written path for the
    /// caller to hand to a player.
    #[tracing::instrument(level = "debug", skip_all, err)]
    pub fn export(&self, composition: &Composition) -> Result<PathBuf> {
        let path = self
            .next_path()
            .map_err(|e| export_failed(self.dir.clone(), e))?;
        let bytes = composition_to_bytes(composition).map_err(|e| export_failed(path.clone(), e))?;
        std::fs::write(&path, bytes).map_err(|e| export_failed(path.clone(), e))?;
        tracing::info!(path = %path.display(), "exported composition");
        Ok(path)
    }
}

fn export_failed(path: PathBuf, error: impl Into<FourBarsError>) -> FourBarsError {
    match error.into() {
        FourBarsError::Io(source) => FourBarsError::ExportFailed { path, source },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BAR_TICKS, Event};

    /// A fresh, empty scratch directory under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "four_bars_export_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn piece() -> Composition {
        Composition {
            lead: vec![Event::rest(BAR_TICKS)],
            rhythm: vec![Event::rest(BAR_TICKS)],
        }
    }

    #[test]
    fn test_open_creates_and_clears() {
        let dir = scratch("clears");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("1.mid"), b"old").unwrap();
        std::fs::write(dir.join("notes.txt"), b"old").unwrap();

        let folder = MidiFolder::open(&dir).unwrap();
        assert_eq!(folder.file_count().unwrap(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_numbering_is_sequential() {
        let dir = scratch("sequential");
        let folder = MidiFolder::open(&dir).unwrap();
        assert_eq!(folder.export(&piece()).unwrap(), dir.join("1.mid"));
        assert_eq!(folder.export(&piece()).unwrap(), dir.join("2.mid"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_two_existing_files_gives_third() {
        let dir = scratch("third");
        let folder = MidiFolder::open(&dir).unwrap();
        std::fs::write(dir.join("a.mid"), b"x").unwrap();
        std::fs::write(dir.join("b.mid"), b"x").unwrap();

        let path = folder.export(&piece()).unwrap();
        assert_eq!(path.file_name().unwrap(), "3.mid");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_folder_is_export_failed() {
        let dir = scratch("vanished");
        let folder = MidiFolder::open(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        match folder.export(&piece()) {
            Err(FourBarsError::ExportFailed { .. }) => {}
            other => panic!("expected ExportFailed, got {other:?}"),
        }
    }
}
