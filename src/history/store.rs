//! Flat-file store for team rosters and player weekly snapshots.
//!
//! One JSON file per team (`teams/<id>.json`) and per player
//! (`players/<id>.json`). A missing file is routine ("no history"), never
//! an error. Saves go through a temp file and a rename so a crash mid-write
//! never leaves a truncated record behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::DataConfig;

/// Team ids above this are junior teams.
pub const JUNIOR_TEAM_ID_THRESHOLD: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Continent {
    Europe,
    America,
    Asia,
    Africa,
}

/// Persisted roster record for one team: every player id ever observed.
/// Created lazily on first schedule fetch; the read path never overwrites
/// it afterwards, only the batch binaries append.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: i64,
    #[serde(default)]
    pub players: Vec<i64>,
    pub is_junior: bool,
    #[serde(default)]
    pub continent: Option<Continent>,
}

impl TeamRecord {
    pub fn new(id: i64, players: Vec<i64>) -> Self {
        Self {
            id,
            players,
            is_junior: id > JUNIOR_TEAM_ID_THRESHOLD,
            continent: None,
        }
    }
}

/// One weekly form snapshot of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWeek {
    pub season: u32,
    /// Week id within the season, 1-based.
    pub id: u32,
    pub week_start: NaiveDate,
    /// Game shape, 1–9.
    pub game_shape: u8,
    pub dmi: i64,
}

/// Persisted weekly history of one player. `weeks` is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    #[serde(default)]
    pub national_team_id: String,
    #[serde(default)]
    pub weeks: Vec<PlayerWeek>,
}

pub struct FileStore {
    teams_dir: PathBuf,
    players_dir: PathBuf,
}

impl FileStore {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            teams_dir: PathBuf::from(&config.teams_dir),
            players_dir: PathBuf::from(&config.players_dir),
        }
    }

    pub fn from_dirs(teams_dir: impl Into<PathBuf>, players_dir: impl Into<PathBuf>) -> Self {
        Self {
            teams_dir: teams_dir.into(),
            players_dir: players_dir.into(),
        }
    }

    pub fn load_team(&self, team_id: &str) -> Result<Option<TeamRecord>> {
        load_json(&self.teams_dir.join(format!("{team_id}.json")))
    }

    pub fn save_team(&self, record: &TeamRecord) -> Result<()> {
        save_json(&self.teams_dir, &format!("{}.json", record.id), record)
    }

    pub fn load_player(&self, player_id: &str) -> Result<Option<PlayerRecord>> {
        load_json(&self.players_dir.join(format!("{player_id}.json")))
    }

    pub fn save_player(&self, record: &PlayerRecord) -> Result<()> {
        save_json(&self.players_dir, &format!("{}.json", record.id), record)
    }

    /// Ids of all stored teams, sorted.
    pub fn team_ids(&self) -> Result<Vec<String>> {
        list_ids(&self.teams_dir)
    }

    /// Ids of all stored players, sorted.
    pub fn player_ids(&self) -> Result<Vec<String>> {
        list_ids(&self.players_dir)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()))
        }
    };
    let record = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(record))
}

fn save_json<T: Serialize>(dir: &Path, file_name: &str, record: &T) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(file_name);
    let tmp = dir.join(format!("{file_name}.tmp"));
    let contents = serde_json::to_string_pretty(record)?;
    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    Ok(())
}

fn list_ids(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut ids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect();
    ids.sort();
    Ok(ids)
}
