//! Resume checkpoints for the batch binaries.
//!
//! A checkpoint records the last completed unit of work and is rewritten
//! atomically after each unit, so an interrupted run resumes where it
//! stopped instead of re-fetching everything. Resume is best-effort; the
//! upstream calls themselves are not exactly-once.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The previous run's cursor, if one was left behind.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(value))
    }

    /// Persist the cursor through a temp file and a rename, so a crash
    /// mid-save leaves the previous cursor intact.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        let contents = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
        Ok(())
    }

    /// Remove the cursor after a completed run.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to remove {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        last_team_id: String,
        processed: Vec<String>,
    }

    #[test]
    fn save_load_clear_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointFile::new(tmp.path().join("resume.json"));

        assert!(checkpoint.load::<Cursor>().unwrap().is_none());

        let cursor = Cursor {
            last_team_id: "42".to_string(),
            processed: vec!["41".to_string(), "42".to_string()],
        };
        checkpoint.save(&cursor).unwrap();
        assert_eq!(checkpoint.load::<Cursor>().unwrap().unwrap(), cursor);

        checkpoint.clear().unwrap();
        assert!(checkpoint.load::<Cursor>().unwrap().is_none());
        // Clearing twice is fine.
        checkpoint.clear().unwrap();
    }
}
