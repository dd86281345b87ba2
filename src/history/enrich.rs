//! Player history enricher.
//!
//! Joins a roster against the stored weekly snapshots, most recent first.
//! Current-week form is only reported when a snapshot for the current week
//! actually exists; stale history stays visible but is never promoted to
//! "current" silently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::models::RosterPlayer;
use crate::history::store::FileStore;

/// One weekly snapshot as exposed to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameShapeHistory {
    pub week_id: u32,
    pub game_shape: u8,
    pub dmi: i64,
    pub date: NaiveDate,
}

/// Current DMI measured against the DMI of the most recent week whose game
/// shape hit the maximum (9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakComparison {
    pub percentage: f64,
    #[serde(rename = "lastGS9DMI")]
    pub last_gs9_dmi: i64,
    #[serde(rename = "lastGS9WeekId")]
    pub last_gs9_week_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWithHistory {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub game_shape_history: Vec<GameShapeHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game_shape: Option<u8>,
    #[serde(rename = "currentDMI", default, skip_serializing_if = "Option::is_none")]
    pub current_dmi: Option<i64>,
    pub game_shape_change: i32,
    pub dmi_change: i64,
    #[serde(rename = "dmiComparisonToLastGS9")]
    pub dmi_comparison_to_last_gs9: Option<PeakComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_recent_week_id: Option<u32>,
    pub is_current_week_data_available: bool,
}

/// Load one player's snapshots, most recent week first. A missing file is
/// routine and yields an empty history; a corrupt file is logged and
/// treated the same.
pub fn history_for(store: &FileStore, player_id: &str) -> Vec<GameShapeHistory> {
    let record = match store.load_player(player_id) {
        Ok(Some(record)) => record,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(player_id, error = %err, "Failed to load player history");
            return Vec::new();
        }
    };

    let mut history: Vec<GameShapeHistory> = record
        .weeks
        .iter()
        .map(|week| GameShapeHistory {
            week_id: week.id,
            game_shape: week.game_shape,
            dmi: week.dmi,
            date: week.week_start,
        })
        .collect();
    history.sort_by(|a, b| b.week_id.cmp(&a.week_id));
    history
}

/// Week-over-week change between the two most recent snapshots. Zero when
/// fewer than two snapshots exist.
fn changes(history: &[GameShapeHistory]) -> (i32, i64) {
    match history {
        [current, previous, ..] => (
            i32::from(current.game_shape) - i32::from(previous.game_shape),
            current.dmi - previous.dmi,
        ),
        _ => (0, 0),
    }
}

/// Percent of the last peak-form DMI. A current game shape of 9 is always
/// 100%, even when no earlier week ever reached 9.
fn peak_comparison(history: &[GameShapeHistory]) -> Option<PeakComparison> {
    let current = history.first()?;

    if current.game_shape == 9 {
        return Some(PeakComparison {
            percentage: 100.0,
            last_gs9_dmi: current.dmi,
            last_gs9_week_id: current.week_id,
        });
    }

    let peak = history.iter().find(|week| week.game_shape == 9)?;
    let percentage = current.dmi as f64 / peak.dmi as f64 * 100.0;
    Some(PeakComparison {
        percentage: (percentage * 10.0).round() / 10.0,
        last_gs9_dmi: peak.dmi,
        last_gs9_week_id: peak.week_id,
    })
}

/// Join a roster against the stored histories. `current_week_id` comes
/// from the season calendar.
pub fn enrich_players(
    store: &FileStore,
    roster: &[RosterPlayer],
    current_week_id: u32,
) -> Vec<PlayerWithHistory> {
    roster
        .iter()
        .map(|player| {
            let history = history_for(store, &player.id);
            let current_week = history
                .iter()
                .find(|week| week.week_id == current_week_id)
                .cloned();
            let has_current_week = current_week.is_some();

            let (game_shape_change, dmi_change) = if has_current_week {
                changes(&history)
            } else {
                (0, 0)
            };

            PlayerWithHistory {
                id: player.id.clone(),
                name: player.name.clone(),
                position: player.position.clone(),
                current_game_shape: current_week.as_ref().map(|week| week.game_shape),
                current_dmi: current_week.as_ref().map(|week| week.dmi),
                game_shape_change,
                dmi_change,
                dmi_comparison_to_last_gs9: has_current_week
                    .then(|| peak_comparison(&history))
                    .flatten(),
                most_recent_week_id: history.first().map(|week| week.week_id),
                is_current_week_data_available: has_current_week,
                game_shape_history: history,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::store::{PlayerRecord, PlayerWeek};

    fn week(id: u32, game_shape: u8, dmi: i64) -> PlayerWeek {
        PlayerWeek {
            season: 69,
            id,
            week_start: NaiveDate::from_ymd_opt(2025, 7, 11).unwrap(),
            game_shape,
            dmi,
        }
    }

    fn roster_player(id: &str) -> RosterPlayer {
        RosterPlayer {
            id: id.to_string(),
            name: format!("Player {id}"),
            position: None,
        }
    }

    fn store_with(records: &[PlayerRecord]) -> (tempfile::TempDir, FileStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::from_dirs(tmp.path().join("teams"), tmp.path().join("players"));
        for record in records {
            store.save_player(record).unwrap();
        }
        (tmp, store)
    }

    #[test]
    fn player_without_a_file_has_empty_history() {
        let (_tmp, store) = store_with(&[]);
        let enriched = enrich_players(&store, &[roster_player("100")], 4);

        let player = &enriched[0];
        assert!(player.game_shape_history.is_empty());
        assert!(!player.is_current_week_data_available);
        assert!(player.current_game_shape.is_none());
        assert!(player.most_recent_week_id.is_none());
        assert!(player.dmi_comparison_to_last_gs9.is_none());
    }

    #[test]
    fn current_week_data_populates_current_form() {
        let record = PlayerRecord {
            id: "100".to_string(),
            national_team_id: String::new(),
            weeks: vec![week(3, 6, 140_000), week(4, 7, 150_000)],
        };
        let (_tmp, store) = store_with(&[record]);
        let enriched = enrich_players(&store, &[roster_player("100")], 4);

        let player = &enriched[0];
        assert!(player.is_current_week_data_available);
        assert_eq!(player.current_game_shape, Some(7));
        assert_eq!(player.current_dmi, Some(150_000));
        assert_eq!(player.game_shape_change, 1);
        assert_eq!(player.dmi_change, 10_000);
        assert_eq!(player.most_recent_week_id, Some(4));
    }

    #[test]
    fn stale_history_is_kept_but_not_promoted_to_current() {
        let record = PlayerRecord {
            id: "100".to_string(),
            national_team_id: String::new(),
            weeks: vec![week(2, 8, 160_000), week(3, 7, 150_000)],
        };
        let (_tmp, store) = store_with(&[record]);
        let enriched = enrich_players(&store, &[roster_player("100")], 5);

        let player = &enriched[0];
        assert!(!player.is_current_week_data_available);
        assert!(player.current_game_shape.is_none());
        assert!(player.current_dmi.is_none());
        assert_eq!(player.game_shape_change, 0);
        assert_eq!(player.most_recent_week_id, Some(3));
        assert_eq!(player.game_shape_history.len(), 2);
    }

    #[test]
    fn game_shape_nine_is_always_one_hundred_percent() {
        // No earlier week ever reached 9.
        let record = PlayerRecord {
            id: "100".to_string(),
            national_team_id: String::new(),
            weeks: vec![week(3, 5, 120_000), week(4, 9, 170_000)],
        };
        let (_tmp, store) = store_with(&[record]);
        let enriched = enrich_players(&store, &[roster_player("100")], 4);

        let comparison = enriched[0].dmi_comparison_to_last_gs9.as_ref().unwrap();
        assert_eq!(comparison.percentage, 100.0);
        assert_eq!(comparison.last_gs9_dmi, 170_000);
        assert_eq!(comparison.last_gs9_week_id, 4);
    }

    #[test]
    fn peak_comparison_uses_most_recent_peak_week() {
        let record = PlayerRecord {
            id: "100".to_string(),
            national_team_id: String::new(),
            weeks: vec![week(1, 9, 200_000), week(2, 9, 160_000), week(3, 6, 120_000)],
        };
        let (_tmp, store) = store_with(&[record]);
        let enriched = enrich_players(&store, &[roster_player("100")], 3);

        let comparison = enriched[0].dmi_comparison_to_last_gs9.as_ref().unwrap();
        assert_eq!(comparison.last_gs9_week_id, 2);
        assert_eq!(comparison.percentage, 75.0);
    }

    #[test]
    fn no_peak_week_in_history_yields_no_comparison() {
        let record = PlayerRecord {
            id: "100".to_string(),
            national_team_id: String::new(),
            weeks: vec![week(3, 6, 120_000), week(4, 7, 130_000)],
        };
        let (_tmp, store) = store_with(&[record]);
        let enriched = enrich_players(&store, &[roster_player("100")], 4);
        assert!(enriched[0].dmi_comparison_to_last_gs9.is_none());
    }
}
