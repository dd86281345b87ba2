//! Strategy filters and the recomputation engine.
//!
//! Given the retained per-match ledger and a pair of strategy filters,
//! re-derives the filtered season aggregates through the same fold the
//! live aggregation used. No upstream round trip, no drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::fold::fold_matches;
use crate::analysis::models::{MatchRecord, PlayerTotals, Position};

/// Offense labels considered inside-oriented.
pub const INTERIOR_OFFENSES: [&str; 2] = ["Look Inside", "Low Post"];
/// Offense labels with no inside/outside lean.
pub const NEUTRAL_OFFENSES: [&str; 5] = [
    "Base",
    "Push",
    "Patient",
    "Outside Isolation",
    "Inside Isolation",
];
/// Offense labels considered perimeter-oriented.
pub const EXTERIOR_OFFENSES: [&str; 3] = ["Motion", "Run And Gun", "Princeton"];

/// Offense filter: the reserved `all` token, one of the reserved grouping
/// tokens, or an exact label match. Labels outside the known groups are
/// matched verbatim; the upstream's strategy vocabulary is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffenseFilter {
    Any,
    Interior,
    Neutral,
    Exterior,
    Exact(String),
}

impl OffenseFilter {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "all" => OffenseFilter::Any,
            "interior" => OffenseFilter::Interior,
            "neutral" => OffenseFilter::Neutral,
            "exterior" => OffenseFilter::Exterior,
            other => OffenseFilter::Exact(other.to_string()),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            OffenseFilter::Any => true,
            OffenseFilter::Interior => INTERIOR_OFFENSES.contains(&label),
            OffenseFilter::Neutral => NEUTRAL_OFFENSES.contains(&label),
            OffenseFilter::Exterior => EXTERIOR_OFFENSES.contains(&label),
            OffenseFilter::Exact(wanted) => label == wanted,
        }
    }
}

/// Defense filter: `all` or an exact label. Defenses have no grouping
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefenseFilter {
    Any,
    Exact(String),
}

impl DefenseFilter {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "all" => DefenseFilter::Any,
            other => DefenseFilter::Exact(other.to_string()),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            DefenseFilter::Any => true,
            DefenseFilter::Exact(wanted) => label == wanted,
        }
    }
}

/// The aggregates a filter pass re-derives. Empty maps, not zero-filled
/// ones, when no match survives the filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredAggregates {
    pub avg_ratings: BTreeMap<String, f64>,
    pub avg_efficiency: BTreeMap<Position, f64>,
    pub player_sum_stats: BTreeMap<String, PlayerTotals>,
}

/// Filter the ledger (both filters must pass) and re-derive the season
/// aggregates from the surviving matches.
pub fn recompute(
    ledger: &[MatchRecord],
    offense: &OffenseFilter,
    defense: &DefenseFilter,
) -> FilteredAggregates {
    let outcome = fold_matches(
        ledger
            .iter()
            .filter(|record| offense.matches(&record.off_strategy))
            .filter(|record| defense.matches(&record.def_strategy)),
    );

    FilteredAggregates {
        avg_ratings: outcome.avg_ratings,
        avg_efficiency: outcome.avg_efficiency,
        player_sum_stats: outcome.player_sum_stats,
    }
}
