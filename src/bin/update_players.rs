//! Weekly game-shape/DMI refresh.
//!
//! Run once per week, after the upstream publishes new form values:
//! appends the current week's snapshot to every cached player file that
//! does not have it yet. Safe to re-run: players already carrying the
//! current week are skipped, and an interrupted run resumes from its
//! checkpoint. Must not run while the server is up against the same data
//! directory.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use courtside::batch::{player_form, BatchSession, CheckpointFile};
use courtside::config::AppConfig;
use courtside::history::calendar;
use courtside::history::store::{FileStore, PlayerWeek};
use courtside::logging;

#[derive(Debug, Parser)]
#[command(about = "Append the current week's game shape and DMI to every cached player")]
struct Args {
    /// Ignore a leftover checkpoint and start from the first player.
    #[arg(long)]
    fresh: bool,
    /// Checkpoint file location.
    #[arg(long, default_value = "update-players.checkpoint.json")]
    checkpoint: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Cursor {
    week_id: u32,
    processed: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, secrets) = AppConfig::load()?;
    logging::init_logging(&config.monitoring)?;

    let store = FileStore::new(&config.data);
    let week = calendar::current_week(Utc::now(), &config.season);
    info!(week_id = week.id, week_start = %week.week_start, "Weekly form update starting");

    let checkpoint = CheckpointFile::new(&args.checkpoint);
    let mut cursor = if args.fresh {
        Cursor {
            week_id: week.id,
            ..Cursor::default()
        }
    } else {
        // A checkpoint from an earlier week is stale; start over.
        checkpoint
            .load::<Cursor>()?
            .filter(|cursor| cursor.week_id == week.id)
            .unwrap_or(Cursor {
                week_id: week.id,
                ..Cursor::default()
            })
    };
    if !cursor.processed.is_empty() {
        info!(done = cursor.processed.len(), "Resuming from checkpoint");
    }

    let player_ids = store.player_ids()?;
    info!(players = player_ids.len(), "Player files found");

    let mut session = BatchSession::open(&config, secrets).await?;
    let mut updated = 0usize;
    let mut skipped = 0usize;

    for player_id in &player_ids {
        if cursor.processed.contains(player_id) {
            continue;
        }

        let mut record = match store.load_player(player_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(player_id = %player_id, "Player file disappeared, skipping");
                mark(&mut cursor, &checkpoint, player_id)?;
                continue;
            }
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "Could not load player file, skipping");
                mark(&mut cursor, &checkpoint, player_id)?;
                continue;
            }
        };

        if record
            .weeks
            .iter()
            .any(|w| w.season == config.season.current && w.id == week.id)
        {
            skipped += 1;
            mark(&mut cursor, &checkpoint, player_id)?;
            continue;
        }

        // Not checkpointed on failure, so a resumed run retries it.
        let doc = match session.player(player_id).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "Player fetch failed, skipping");
                continue;
            }
        };

        let Some(form) = player_form(&doc) else {
            warn!(player_id = %player_id, "Player document had no usable form data, skipping");
            mark(&mut cursor, &checkpoint, player_id)?;
            continue;
        };

        record.weeks.push(PlayerWeek {
            season: config.season.current,
            id: week.id,
            week_start: week.week_start,
            game_shape: form.game_shape,
            dmi: form.dmi,
        });
        store.save_player(&record)?;
        updated += 1;
        info!(player_id = %player_id, game_shape = form.game_shape, dmi = form.dmi, "Week appended");

        mark(&mut cursor, &checkpoint, player_id)?;
    }

    checkpoint.clear()?;
    session.close().await;
    info!(updated, skipped, total = player_ids.len(), "Weekly form update finished");
    Ok(())
}

fn mark(cursor: &mut Cursor, checkpoint: &CheckpointFile, player_id: &str) -> Result<()> {
    cursor.processed.push(player_id.to_string());
    checkpoint.save(cursor)
}
