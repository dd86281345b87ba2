//! The season fold.
//!
//! One pure function turns a list of per-match records into season-level
//! aggregates. Both call sites, the live aggregation walk and the
//! filter-recompute endpoint, go through here, so the two can never
//! drift apart numerically.
//!
//! Every average is a mean over the matches that actually reported the
//! field: absent categories contribute neither to the numerator nor the
//! denominator, and different categories may have different counts.

use std::collections::BTreeMap;

use crate::analysis::models::{EffortPoint, MatchRecord, PlayerTotals, Position};

/// Season aggregates derived purely from a match ledger. Maps are empty,
/// not zero-filled, when no match reported the field.
#[derive(Debug, Clone, Default)]
pub struct FoldOutcome {
    pub offense_strategies: BTreeMap<String, u32>,
    pub defense_strategies: BTreeMap<String, u32>,
    pub avg_ratings: BTreeMap<String, f64>,
    pub avg_efficiency: BTreeMap<Position, f64>,
    pub effort_delta_list: Vec<EffortPoint>,
    pub player_sum_stats: BTreeMap<String, PlayerTotals>,
}

pub fn fold_matches<'a>(matches: impl IntoIterator<Item = &'a MatchRecord>) -> FoldOutcome {
    let mut offense_strategies: BTreeMap<String, u32> = BTreeMap::new();
    let mut defense_strategies: BTreeMap<String, u32> = BTreeMap::new();
    let mut rating_sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    let mut efficiency_sums: BTreeMap<Position, (f64, u32)> = BTreeMap::new();
    let mut effort_delta_list = Vec::new();
    let mut player_sum_stats: BTreeMap<String, PlayerTotals> = BTreeMap::new();

    for record in matches {
        // The empty string is itself a valid, counted strategy label.
        *offense_strategies
            .entry(record.off_strategy.trim().to_string())
            .or_default() += 1;
        *defense_strategies
            .entry(record.def_strategy.trim().to_string())
            .or_default() += 1;

        for (category, value) in &record.ratings {
            let slot = rating_sums.entry(category.clone()).or_default();
            slot.0 += value;
            slot.1 += 1;
        }

        for (position, value) in &record.efficiency {
            let slot = efficiency_sums.entry(*position).or_default();
            slot.0 += value;
            slot.1 += 1;
        }

        // Effort delta always contributes a point; an absent value was
        // already normalized to 0 at extraction.
        effort_delta_list.push(EffortPoint {
            date: record.date,
            effort_delta: record.effort_delta,
            match_id: record.match_id.clone(),
        });

        for (player_id, line) in &record.player_stats {
            player_sum_stats
                .entry(player_id.clone())
                .or_insert_with(|| PlayerTotals {
                    name: line.name.clone(),
                    ..PlayerTotals::default()
                })
                .add_line(line);
        }
    }

    effort_delta_list.sort_by_key(|point| point.date);

    FoldOutcome {
        offense_strategies,
        defense_strategies,
        avg_ratings: finalize(rating_sums),
        avg_efficiency: finalize(efficiency_sums),
        effort_delta_list,
        player_sum_stats,
    }
}

fn finalize<K: Ord>(sums: BTreeMap<K, (f64, u32)>) -> BTreeMap<K, f64> {
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / f64::from(count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::PlayerLine;
    use chrono::{DateTime, Utc};

    fn at(raw: &str) -> Option<DateTime<Utc>> {
        Some(DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc))
    }

    fn bare_match(id: &str, date: Option<DateTime<Utc>>) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            date,
            team_side: None,
            off_strategy: String::new(),
            def_strategy: String::new(),
            ratings: BTreeMap::new(),
            efficiency: BTreeMap::new(),
            effort_delta: 0.0,
            player_stats: BTreeMap::new(),
        }
    }

    fn line(name: &str, pts: u32, min: u32) -> PlayerLine {
        PlayerLine {
            name: name.to_string(),
            pts,
            ast: 0,
            reb: 0,
            blk: 0,
            stl: 0,
            to: 0,
            pf: 0,
            fgm: 0,
            fga: 0,
            tpm: 0,
            tpa: 0,
            min,
            minutes: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_ledger_folds_to_empty_aggregates() {
        let outcome = fold_matches(&[]);
        assert!(outcome.offense_strategies.is_empty());
        assert!(outcome.avg_ratings.is_empty());
        assert!(outcome.avg_efficiency.is_empty());
        assert!(outcome.effort_delta_list.is_empty());
        assert!(outcome.player_sum_stats.is_empty());
    }

    #[test]
    fn single_match_aggregates_verbatim() {
        let mut record = bare_match("55", at("2025-07-12T18:00:00Z"));
        record.off_strategy = "Motion".to_string();
        record.def_strategy = "ManToMan".to_string();
        record.ratings.insert("Offense".to_string(), 72.5);
        record.effort_delta = 3.2;

        let outcome = fold_matches(&[record]);
        assert_eq!(outcome.offense_strategies["Motion"], 1);
        assert_eq!(outcome.avg_ratings["Offense"], 72.5);
        assert!(outcome.avg_efficiency.is_empty());
        assert_eq!(outcome.effort_delta_list.len(), 1);
        assert_eq!(outcome.effort_delta_list[0].effort_delta, 3.2);
        assert_eq!(outcome.effort_delta_list[0].match_id, "55");
    }

    #[test]
    fn category_means_use_per_category_denominators() {
        let mut first = bare_match("1", at("2025-07-12T18:00:00Z"));
        first.ratings.insert("Offense".to_string(), 70.0);
        first.ratings.insert("Defense".to_string(), 60.0);
        let mut second = bare_match("2", at("2025-07-19T18:00:00Z"));
        second.ratings.insert("Offense".to_string(), 80.0);

        let outcome = fold_matches(&[first, second]);
        // Offense over two matches, Defense over the single reporting match.
        assert_eq!(outcome.avg_ratings["Offense"], 75.0);
        assert_eq!(outcome.avg_ratings["Defense"], 60.0);
    }

    #[test]
    fn efficiency_positions_accumulate_independently() {
        let mut first = bare_match("1", at("2025-07-12T18:00:00Z"));
        first.efficiency.insert(Position::PG, 100.0);
        first.efficiency.insert(Position::C, 90.0);
        let mut second = bare_match("2", at("2025-07-19T18:00:00Z"));
        second.efficiency.insert(Position::PG, 110.0);

        let outcome = fold_matches(&[first, second]);
        assert_eq!(outcome.avg_efficiency[&Position::PG], 105.0);
        assert_eq!(outcome.avg_efficiency[&Position::C], 90.0);
        assert!(!outcome.avg_efficiency.contains_key(&Position::SG));
    }

    #[test]
    fn effort_series_is_sorted_ascending_by_date() {
        let mut late = bare_match("2", at("2025-07-19T18:00:00Z"));
        late.effort_delta = -1.0;
        let mut early = bare_match("1", at("2025-07-12T18:00:00Z"));
        early.effort_delta = 2.0;

        let outcome = fold_matches(&[late, early]);
        let ids: Vec<&str> = outcome
            .effort_delta_list
            .iter()
            .map(|point| point.match_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn games_counts_only_matches_with_a_recorded_line() {
        let mut first = bare_match("1", at("2025-07-12T18:00:00Z"));
        first
            .player_stats
            .insert("100".to_string(), line("Ada Lovelace", 12, 30));
        // Second match: the player was listed but had no line, so the
        // ledger simply has no entry for them.
        let second = bare_match("2", at("2025-07-19T18:00:00Z"));
        let mut third = bare_match("3", at("2025-07-26T18:00:00Z"));
        third
            .player_stats
            .insert("100".to_string(), line("Ada Lovelace", 20, 35));

        let outcome = fold_matches(&[first, second, third]);
        let totals = &outcome.player_sum_stats["100"];
        assert_eq!(totals.games, 2);
        assert_eq!(totals.pts, 32);
        assert_eq!(totals.min, 65);
    }

    #[test]
    fn strategy_labels_are_trimmed_and_empty_counts() {
        let mut first = bare_match("1", None);
        first.off_strategy = " Motion ".to_string();
        let mut second = bare_match("2", None);
        second.off_strategy = "Motion".to_string();
        let third = bare_match("3", None);

        let outcome = fold_matches(&[first, second, third]);
        assert_eq!(outcome.offense_strategies["Motion"], 2);
        assert_eq!(outcome.offense_strategies[""], 1);
    }
}
