//! Schedule normalizer.
//!
//! Turns a parsed `schedule.aspx` document into a uniform list of match
//! entries, whether the upstream collapsed the list to a single element or
//! not. An absent schedule node means "no schedule data" and yields an
//! empty list, not an error.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upstream::xml::XmlNode;
use crate::upstream::{loose_id_eq, parse_timestamp};

/// Which of a match's two participants is the subject team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

/// One schedule entry. `start` is `None` when the upstream timestamp does
/// not parse; such matches are treated as played (only a parsed future
/// timestamp can exclude a match from aggregation).
#[derive(Debug, Clone)]
pub struct ScheduledMatch {
    pub id: String,
    pub start: Option<DateTime<Utc>>,
    pub home_id: String,
    pub away_id: String,
    pub home_name: String,
    pub away_name: String,
    /// A score element is present, so the match has been played.
    pub completed: bool,
}

impl ScheduledMatch {
    pub fn side_of(&self, team_id: &str) -> Option<TeamSide> {
        if loose_id_eq(&self.home_id, team_id) {
            Some(TeamSide::Home)
        } else if loose_id_eq(&self.away_id, team_id) {
            Some(TeamSide::Away)
        } else {
            None
        }
    }

    /// The other participant's id, when the subject team plays in this match.
    pub fn opponent_of(&self, team_id: &str) -> Option<&str> {
        match self.side_of(team_id)? {
            TeamSide::Home => Some(&self.away_id),
            TeamSide::Away => Some(&self.home_id),
        }
    }

    /// The other participant's display name as the schedule spells it.
    /// Empty when the schedule omits names or the subject team is not in
    /// this match.
    pub fn opponent_name_of(&self, team_id: &str) -> &str {
        match self.side_of(team_id) {
            Some(TeamSide::Home) | None => &self.away_name,
            Some(TeamSide::Away) => &self.home_name,
        }
    }
}

/// Extract the match list from a schedule document. Entries without an id
/// attribute are dropped.
pub fn matches(doc: &XmlNode) -> Vec<ScheduledMatch> {
    let Some(schedule) = doc.child("schedule") else {
        return Vec::new();
    };

    schedule
        .children_named("match")
        .filter_map(|node| {
            let id = node.attr("id")?.to_string();
            Some(ScheduledMatch {
                id,
                start: node.attr("start").and_then(parse_timestamp),
                home_id: team_attr(node, "homeTeam"),
                away_id: team_attr(node, "awayTeam"),
                home_name: team_name(node, "homeTeam"),
                away_name: team_name(node, "awayTeam"),
                completed: node.descendant("score").is_some(),
            })
        })
        .collect()
}

fn team_attr(node: &XmlNode, side: &str) -> String {
    node.child(side)
        .and_then(|team| team.attr("id"))
        .unwrap_or_default()
        .to_string()
}

fn team_name(node: &XmlNode, side: &str) -> String {
    node.child(side)
        .and_then(|team| team.child_text("teamName"))
        .unwrap_or_default()
        .to_string()
}

/// Player ids embedded under the subject team's schedule entries. Schedule
/// documents carry boxscore fragments for played matches; this is what
/// seeds a lazily created team record.
pub fn roster_ids(doc: &XmlNode, team_id: &str) -> BTreeSet<i64> {
    let mut ids = BTreeSet::new();
    let Some(schedule) = doc.child("schedule") else {
        return ids;
    };

    for node in schedule.children_named("match") {
        for side in ["homeTeam", "awayTeam"] {
            let Some(team) = node.child(side) else { continue };
            if !team.attr("id").is_some_and(|id| loose_id_eq(id, team_id)) {
                continue;
            }
            let Some(boxscore) = team.child("boxscore") else { continue };
            for player in boxscore.children_named("player") {
                if let Some(id) = player.attr("id").and_then(|id| id.trim().parse().ok()) {
                    ids.insert(id);
                }
            }
        }
    }
    ids
}
