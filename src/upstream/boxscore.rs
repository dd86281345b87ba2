//! Boxscore normalizer.
//!
//! Extracts one team's view of a played match from a `boxscore.aspx`
//! document: strategies, ratings, per-position efficiency, effort delta,
//! and per-player lines. Numeric fields that fail to parse are excluded
//! (ratings, efficiency) or default to zero (effort delta, counting stats);
//! neither is an error.

use std::collections::BTreeMap;

use crate::analysis::models::{MatchRecord, PlayerLine, Position, RosterPlayer, TeamRef};
use crate::upstream::loose_id_eq;
use crate::upstream::schedule::{ScheduledMatch, TeamSide};
use crate::upstream::xml::XmlNode;

/// One team's extracted view of a boxscore document.
#[derive(Debug, Clone)]
pub struct TeamBoxscore {
    /// Display name as this boxscore spells it; may be empty.
    pub team_name: String,
    pub record: MatchRecord,
    pub opponent: Option<TeamRef>,
    /// Every player listed for the team, with or without a recorded line.
    pub roster: Vec<RosterPlayer>,
}

/// Extract the subject team's view of a boxscore. `None` when neither team
/// node matches `team_id`; the caller skips the match.
pub fn extract(doc: &XmlNode, team_id: &str, scheduled: &ScheduledMatch) -> Option<TeamBoxscore> {
    let match_node = doc.child("match")?;
    let home = match_node.child("homeTeam");
    let away = match_node.child("awayTeam");

    let node_is = |node: Option<&XmlNode>| {
        node.is_some_and(|n| n.attr("id").is_some_and(|id| loose_id_eq(id, team_id)))
    };

    let (team_node, opponent_node, side) = if node_is(away) {
        (away?, home, TeamSide::Away)
    } else if node_is(home) {
        (home?, away, TeamSide::Home)
    } else {
        return None;
    };

    let mut player_stats = BTreeMap::new();
    let mut roster = Vec::new();
    if let Some(boxscore) = team_node.child("boxscore") {
        for player in boxscore.children_named("player") {
            let Some(id) = player.attr("id") else { continue };
            let name = player_name(player);
            roster.push(RosterPlayer {
                id: id.to_string(),
                name: name.clone(),
                position: player
                    .child_text("position")
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            });

            if let Some(line) = player_line(player, name) {
                player_stats.insert(id.to_string(), line);
            }
        }
    }

    let record = MatchRecord {
        match_id: scheduled.id.clone(),
        date: scheduled.start,
        team_side: Some(side),
        off_strategy: team_node.child_text("offStrategy").unwrap_or_default().to_string(),
        def_strategy: team_node.child_text("defStrategy").unwrap_or_default().to_string(),
        ratings: ratings(team_node),
        efficiency: efficiency(team_node),
        effort_delta: match_node
            .child_text("effortDelta")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0.0),
        player_stats,
    };

    Some(TeamBoxscore {
        team_name: team_node.child_text("teamName").unwrap_or_default().to_string(),
        record,
        opponent: opponent_node.map(|node| TeamRef {
            id: node.attr("id").map(str::to_string),
            name: node
                .child_text("teamName")
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown")
                .to_string(),
        }),
        roster,
    })
}

/// Both teams' listed player ids, keyed by team id. Used by roster
/// discovery, which processes a match from both participants' sides.
pub fn team_rosters(doc: &XmlNode) -> Vec<(String, Vec<String>)> {
    let Some(match_node) = doc.child("match") else {
        return Vec::new();
    };

    ["homeTeam", "awayTeam"]
        .iter()
        .filter_map(|side| {
            let team = match_node.child(side)?;
            let id = team.attr("id")?.to_string();
            let players = team
                .child("boxscore")
                .map(|boxscore| {
                    boxscore
                        .children_named("player")
                        .filter_map(|player| player.attr("id").map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            Some((id, players))
        })
        .collect()
}

/// Every rating category present on the team node, keyed by the element
/// name the upstream used. Unparseable values are dropped.
fn ratings(team_node: &XmlNode) -> BTreeMap<String, f64> {
    let Some(node) = team_node.child("ratings") else {
        return BTreeMap::new();
    };
    node.children()
        .filter_map(|cat| {
            let value: f64 = cat.text().parse().ok()?;
            Some((cat.name().to_string(), value))
        })
        .collect()
}

fn efficiency(team_node: &XmlNode) -> BTreeMap<Position, f64> {
    let Some(node) = team_node.child("efficiency") else {
        return BTreeMap::new();
    };
    Position::ALL
        .iter()
        .filter_map(|pos| {
            let value: f64 = node.child_text(pos.code())?.parse().ok()?;
            Some((*pos, value))
        })
        .collect()
}

fn player_name(player: &XmlNode) -> String {
    format!(
        "{} {}",
        player.child_text("firstName").unwrap_or_default(),
        player.child_text("lastName").unwrap_or_default(),
    )
    .trim()
    .to_string()
}

/// A player has a line only when the performance block's points field
/// carries a real number; `"N/A"` or an absent field means the player was
/// listed but did not play.
fn player_line(player: &XmlNode, name: String) -> Option<PlayerLine> {
    let performance = player.child("performance")?;
    performance.child_text("pts")?.trim().parse::<u32>().ok()?;

    let stat = |field: &str| -> u32 {
        performance
            .child_text(field)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    };

    let mut minutes = BTreeMap::new();
    let mut min = 0;
    if let Some(minutes_node) = player.child("minutes") {
        for pos in Position::ALL {
            if let Some(value) = minutes_node
                .child_text(pos.code())
                .and_then(|raw| raw.trim().parse::<u32>().ok())
            {
                min += value;
                minutes.insert(pos, value);
            }
        }
    }

    Some(PlayerLine {
        name,
        pts: stat("pts"),
        ast: stat("ast"),
        reb: stat("reb"),
        blk: stat("blk"),
        stl: stat("stl"),
        to: stat("to"),
        pf: stat("pf"),
        fgm: stat("fgm"),
        fga: stat("fga"),
        tpm: stat("tpm"),
        tpa: stat("tpa"),
        min,
        minutes,
    })
}
