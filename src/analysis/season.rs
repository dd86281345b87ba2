//! Season aggregation walk.
//!
//! For one (team, season) pair: fetch and normalize the schedule, fetch
//! every played match's boxscore strictly sequentially, fold the extracted
//! records into season aggregates, and keep the per-match ledger so the
//! client can re-filter without another upstream round trip.
//!
//! One failed boxscore skips one match; only a failed schedule fetch
//! aborts the season. An empty schedule is a valid terminal state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::analysis::fold::fold_matches;
use crate::analysis::models::{
    humanize, MatchRecord, PlayerMinutes, Position, RecentGame, RosterPlayer, SeasonAnalysis,
    StrategyPair, TeamRef,
};
use crate::history::enrich::enrich_players;
use crate::history::FileStore;
use crate::upstream::{boxscore, schedule, FetchError, GameApi};

/// Everything one aggregation request shares across its seasons. Each
/// season walk builds its own independent state from this.
pub struct SeasonContext<'a> {
    pub api: &'a dyn GameApi,
    pub store: &'a FileStore,
    pub session: &'a str,
    pub current_season: u32,
    pub current_week_id: u32,
    pub now: DateTime<Utc>,
}

impl SeasonContext<'_> {
    /// Aggregate one season of one team.
    pub async fn aggregate(&self, team_id: &str, season: u32) -> Result<SeasonAnalysis, FetchError> {
        let doc = self.api.schedule(team_id, season, self.session).await?;
        let scheduled = schedule::matches(&doc);
        if scheduled.is_empty() {
            return Ok(SeasonAnalysis::empty());
        }

        let mut team_name = String::new();
        let mut ledger: Vec<MatchRecord> = Vec::new();
        let mut opponents: Vec<Option<TeamRef>> = Vec::new();
        let mut roster: Vec<RosterPlayer> = Vec::new();
        let mut roster_seen: BTreeSet<String> = BTreeSet::new();

        for entry in &scheduled {
            // Future matches cannot have a boxscore yet. Only the current
            // season has future matches; the boundary is exclusive-future,
            // a match starting exactly now is included.
            if season == self.current_season && entry.start.is_some_and(|start| start > self.now)
            {
                continue;
            }

            let doc = match self.api.boxscore(&entry.id, self.session).await {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(match_id = %entry.id, error = %err, "Boxscore fetch failed, skipping match");
                    continue;
                }
            };

            let Some(view) = boxscore::extract(&doc, team_id, entry) else {
                debug!(match_id = %entry.id, team_id, "Neither boxscore team matches, skipping");
                continue;
            };

            // Display name comes from the first match that carries one and
            // is never overwritten, even if later matches disagree.
            if team_name.is_empty() && !view.team_name.is_empty() {
                team_name = view.team_name.clone();
            }

            for player in view.roster {
                if roster_seen.insert(player.id.clone()) {
                    roster.push(player);
                }
            }

            opponents.push(view.opponent);
            ledger.push(view.record);
        }

        let outcome = fold_matches(&ledger);
        let recent_games = recent_games(&ledger, opponents);
        let players = enrich_players(self.store, &roster, self.current_week_id);

        Ok(SeasonAnalysis {
            team_name,
            offense_strategies: outcome.offense_strategies,
            defense_strategies: outcome.defense_strategies,
            avg_ratings: outcome.avg_ratings,
            avg_efficiency: outcome.avg_efficiency,
            effort_delta_list: outcome.effort_delta_list,
            player_sum_stats: outcome.player_sum_stats,
            matches: ledger,
            players,
            recent_games,
        })
    }
}

/// Per-match view for the recent-games panel, most recent first. Strategy
/// labels are prettified here and only here; the aggregates keep raw
/// labels.
fn recent_games(ledger: &[MatchRecord], opponents: Vec<Option<TeamRef>>) -> Vec<RecentGame> {
    let mut games: Vec<RecentGame> = ledger
        .iter()
        .zip(opponents)
        .map(|(record, opponent)| {
            let player_minutes = record
                .player_stats
                .iter()
                .map(|(id, line)| {
                    let mut position_minutes: BTreeMap<Position, u32> =
                        Position::ALL.iter().map(|pos| (*pos, 0)).collect();
                    for (pos, minutes) in &line.minutes {
                        position_minutes.insert(*pos, *minutes);
                    }
                    (
                        id.clone(),
                        PlayerMinutes {
                            name: line.name.clone(),
                            position_minutes,
                            total_minutes: line.min,
                        },
                    )
                })
                .collect();

            RecentGame {
                match_id: record.match_id.clone(),
                date: record.date,
                opponent,
                strategies: StrategyPair {
                    offense: humanize(&record.off_strategy),
                    defense: humanize(&record.def_strategy),
                },
                player_minutes,
            }
        })
        .collect();

    games.sort_by_key(|game| std::cmp::Reverse(game.date));
    games
}
