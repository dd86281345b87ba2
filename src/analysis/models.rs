//! Domain model for season analysis.
//!
//! Field names serialize to the wire format the dashboard UI consumes
//! (`matchId`, `offStrategy`, `playerSumStats`, …). Every map is a
//! `BTreeMap` so serialized output is deterministic; the recompute path is
//! asserted byte-for-byte against the aggregation path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::PlayerWithHistory;
use crate::upstream::schedule::TeamSide;

/// The five on-court positions. Efficiency and minutes are reported per
/// position; any subset may be absent for a given match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Position {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::PG,
        Position::SG,
        Position::SF,
        Position::PF,
        Position::C,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Position::PG => "PG",
            Position::SG => "SG",
            Position::SF => "SF",
            Position::PF => "PF",
            Position::C => "C",
        }
    }
}

/// One player's box-score line in one match. Only players whose points
/// field carried a real number get a line; listed-but-absent players are
/// excluded entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLine {
    pub name: String,
    pub pts: u32,
    pub ast: u32,
    pub reb: u32,
    pub blk: u32,
    pub stl: u32,
    pub to: u32,
    pub pf: u32,
    pub fgm: u32,
    pub fga: u32,
    pub tpm: u32,
    pub tpa: u32,
    /// Minutes summed across positions.
    pub min: u32,
    /// Per-position minute split, absent positions omitted.
    #[serde(default)]
    pub minutes: BTreeMap<Position, u32>,
}

/// One match of the retained ledger. This is what the recompute endpoint
/// accepts back from the client, so it carries everything the fold needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_id: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_side: Option<TeamSide>,
    pub off_strategy: String,
    pub def_strategy: String,
    pub ratings: BTreeMap<String, f64>,
    pub efficiency: BTreeMap<Position, f64>,
    pub effort_delta: f64,
    pub player_stats: BTreeMap<String, PlayerLine>,
}

/// Accumulated season totals for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub name: String,
    pub pts: u32,
    pub ast: u32,
    pub reb: u32,
    pub blk: u32,
    pub stl: u32,
    pub to: u32,
    pub pf: u32,
    pub fgm: u32,
    pub fga: u32,
    pub tpm: u32,
    pub tpa: u32,
    pub min: u32,
    /// Matches where this player had a recorded performance line.
    pub games: u32,
}

impl PlayerTotals {
    pub fn add_line(&mut self, line: &PlayerLine) {
        self.pts += line.pts;
        self.ast += line.ast;
        self.reb += line.reb;
        self.blk += line.blk;
        self.stl += line.stl;
        self.to += line.to;
        self.pf += line.pf;
        self.fgm += line.fgm;
        self.fga += line.fga;
        self.tpm += line.tpm;
        self.tpa += line.tpa;
        self.min += line.min;
        self.games += 1;
    }
}

/// One point of the effort-delta series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortPoint {
    pub date: Option<DateTime<Utc>>,
    pub effort_delta: f64,
    pub match_id: String,
}

/// A player observed on the subject team's roster during aggregation,
/// before history enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// The opposing team of one match, as named in the boxscore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPair {
    pub offense: String,
    pub defense: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMinutes {
    pub name: String,
    pub position_minutes: BTreeMap<Position, u32>,
    pub total_minutes: u32,
}

/// Per-match view for the recent-games panel, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGame {
    pub match_id: String,
    pub date: Option<DateTime<Utc>>,
    pub opponent: Option<TeamRef>,
    pub strategies: StrategyPair,
    pub player_minutes: BTreeMap<String, PlayerMinutes>,
}

/// Everything derived for one (team, season) pair. Never persisted;
/// recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonAnalysis {
    pub team_name: String,
    pub offense_strategies: BTreeMap<String, u32>,
    pub defense_strategies: BTreeMap<String, u32>,
    pub avg_ratings: BTreeMap<String, f64>,
    pub avg_efficiency: BTreeMap<Position, f64>,
    pub effort_delta_list: Vec<EffortPoint>,
    pub player_sum_stats: BTreeMap<String, PlayerTotals>,
    /// The retained ledger; lets a client re-filter and re-aggregate
    /// without another upstream round trip.
    pub matches: Vec<MatchRecord>,
    pub players: Vec<PlayerWithHistory>,
    pub recent_games: Vec<RecentGame>,
}

impl SeasonAnalysis {
    /// The valid terminal state for a team with no schedule data.
    pub fn empty() -> Self {
        Self {
            team_name: String::new(),
            offense_strategies: BTreeMap::new(),
            defense_strategies: BTreeMap::new(),
            avg_ratings: BTreeMap::new(),
            avg_efficiency: BTreeMap::new(),
            effort_delta_list: Vec::new(),
            player_sum_stats: BTreeMap::new(),
            matches: Vec::new(),
            players: Vec::new(),
            recent_games: Vec::new(),
        }
    }
}

/// Humanize a camelCase strategy label for display ("RunAndGun" →
/// "Run And Gun"). Only the recent-games view uses the pretty form; every
/// aggregate map keeps the raw upstream label.
pub fn humanize(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 4);
    for (i, ch) in label.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            if ch.is_uppercase() {
                out.push(' ');
            }
            out.push(ch);
        }
    }
    out.trim().to_string()
}
