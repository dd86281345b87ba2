//! Post-game roster discovery.
//!
//! League games are played on Mondays. For every cached team, this finds
//! the most recent completed Monday match, reads both sides' player lists
//! from its boxscore, appends any ids not seen before to the team records,
//! and seeds a weekly history file for each new player. Progress is
//! checkpointed after every team; an upstream failure stops the run so it
//! can be resumed later. Must not run while the server is up against the
//! same data directory.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Datelike, Utc, Weekday};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use courtside::batch::{player_form, BatchSession, CheckpointFile};
use courtside::config::AppConfig;
use courtside::history::calendar;
use courtside::history::store::{FileStore, PlayerRecord, PlayerWeek};
use courtside::logging;
use courtside::upstream::schedule::{self, ScheduledMatch};
use courtside::upstream::{boxscore, XmlNode};

#[derive(Debug, Parser)]
#[command(about = "Discover roster additions from the latest completed Monday matches")]
struct Args {
    /// Ignore a leftover checkpoint and start from the first team.
    #[arg(long)]
    fresh: bool,
    /// Checkpoint file location.
    #[arg(long, default_value = "check-new-players.checkpoint.json")]
    checkpoint: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Cursor {
    last_team_id: String,
    processed: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, secrets) = AppConfig::load()?;
    logging::init_logging(&config.monitoring)?;

    let store = FileStore::new(&config.data);
    let week = calendar::current_week(Utc::now(), &config.season);

    let checkpoint = CheckpointFile::new(&args.checkpoint);
    let mut processed: BTreeSet<String> = if args.fresh {
        BTreeSet::new()
    } else {
        checkpoint
            .load::<Cursor>()?
            .map(|cursor| cursor.processed.into_iter().collect())
            .unwrap_or_default()
    };
    if !processed.is_empty() {
        info!(done = processed.len(), "Resuming from checkpoint");
    }

    let team_ids = store.team_ids()?;
    info!(teams = team_ids.len(), week_id = week.id, "Roster discovery starting");

    let mut session = BatchSession::open(&config, secrets).await?;
    let mut teams_checked = 0usize;
    let mut new_players = 0usize;

    for team_id in &team_ids {
        if processed.contains(team_id) {
            continue;
        }

        let doc = match session.schedule(team_id, config.season.current).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(team_id = %team_id, error = %err, "Schedule fetch failed, stopping for resume");
                save_cursor(&checkpoint, team_id, &processed)?;
                break;
            }
        };

        let match_list = schedule::matches(&doc);
        let Some(monday) = last_completed_monday(&match_list) else {
            debug!(team_id = %team_id, "No completed Monday match");
            processed.insert(team_id.clone());
            teams_checked += 1;
            save_cursor(&checkpoint, team_id, &processed)?;
            continue;
        };

        let box_doc = match session.boxscore(&monday.id).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(match_id = %monday.id, error = %err, "Boxscore fetch failed, stopping for resume");
                save_cursor(&checkpoint, team_id, &processed)?;
                break;
            }
        };

        // The boxscore covers both participants; handle each side once.
        for (game_team_id, player_ids) in boxscore::team_rosters(&box_doc) {
            if processed.contains(&game_team_id) {
                continue;
            }
            new_players +=
                discover_for_team(&store, &mut session, &game_team_id, &player_ids, &week, &config)
                    .await?;
            processed.insert(game_team_id);
        }

        teams_checked += 1;
        save_cursor(&checkpoint, team_id, &processed)?;
    }

    checkpoint.clear()?;
    session.close().await;
    info!(teams_checked, new_players, "Roster discovery finished");
    Ok(())
}

/// The most recent completed match that was played on a Monday.
fn last_completed_monday(matches: &[ScheduledMatch]) -> Option<&ScheduledMatch> {
    matches
        .iter()
        .filter(|entry| entry.completed)
        .filter(|entry| {
            entry
                .start
                .is_some_and(|start| start.weekday() == Weekday::Mon)
        })
        .max_by_key(|entry| entry.start)
}

/// Append unseen player ids to the team record and seed their history
/// files. Returns how many new player files were created.
async fn discover_for_team(
    store: &FileStore,
    session: &mut BatchSession,
    team_id: &str,
    player_ids: &[String],
    week: &calendar::WeekInfo,
    config: &AppConfig,
) -> Result<usize> {
    let mut record = match store.load_team(team_id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(team_id = %team_id, "Team is not tracked, skipping");
            return Ok(0);
        }
        Err(err) => {
            warn!(team_id = %team_id, error = %err, "Could not load team record, skipping");
            return Ok(0);
        }
    };

    let new_ids: Vec<(String, i64)> = player_ids
        .iter()
        .filter_map(|id| id.trim().parse::<i64>().ok().map(|n| (id.clone(), n)))
        .filter(|(_, numeric)| !record.players.contains(numeric))
        .collect();
    if new_ids.is_empty() {
        debug!(team_id = %team_id, "No new players");
        return Ok(0);
    }

    info!(team_id = %team_id, count = new_ids.len(), "New players found");
    record.players.extend(new_ids.iter().map(|(_, numeric)| *numeric));
    store.save_team(&record)?;

    let mut created = 0;
    for (player_id, _) in &new_ids {
        match session.player(player_id).await {
            Ok(doc) => created += seed_player(store, &doc, player_id, team_id, week, config)?,
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "New player fetch failed, skipping")
            }
        }
    }
    Ok(created)
}

fn seed_player(
    store: &FileStore,
    doc: &XmlNode,
    player_id: &str,
    team_id: &str,
    week: &calendar::WeekInfo,
    config: &AppConfig,
) -> Result<usize> {
    let Some(form) = player_form(doc) else {
        warn!(player_id = %player_id, "No usable form data for new player, skipping");
        return Ok(0);
    };

    store.save_player(&PlayerRecord {
        id: player_id.to_string(),
        national_team_id: team_id.to_string(),
        weeks: vec![PlayerWeek {
            season: config.season.current,
            id: week.id,
            week_start: week.week_start,
            game_shape: form.game_shape,
            dmi: form.dmi,
        }],
    })?;
    info!(player_id = %player_id, game_shape = form.game_shape, dmi = form.dmi, "Player file created");
    Ok(1)
}

fn save_cursor(
    checkpoint: &CheckpointFile,
    last_team_id: &str,
    processed: &BTreeSet<String>,
) -> Result<()> {
    checkpoint.save(&Cursor {
        last_team_id: last_team_id.to_string(),
        processed: processed.iter().cloned().collect(),
    })
}
