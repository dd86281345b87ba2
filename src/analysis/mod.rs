//! Season/team statistics aggregation.
//!
//! `season` walks the schedule and boxscores, `fold` does the arithmetic,
//! `filter` re-derives aggregates from the retained ledger after strategy
//! filtering. Both paths share the fold, so their numbers cannot diverge.

pub mod filter;
pub mod fold;
pub mod models;
pub mod season;

pub use models::{MatchRecord, SeasonAnalysis};
pub use season::SeasonContext;
