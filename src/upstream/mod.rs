//! Access to the upstream game API: HTTP fetch adapter, loose XML tree,
//! and the schedule/boxscore normalizers.

pub mod boxscore;
pub mod client;
pub mod schedule;
pub mod xml;

pub use client::{FetchError, GameApi, UpstreamClient};
pub use xml::XmlNode;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Loose equality for upstream team/player ids. The API mixes numeric and
/// string representations of the same id (`id='0012'` vs `id='12'`), so
/// comparisons go through a numeric parse when possible.
pub fn loose_id_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Parse the timestamp formats the upstream emits. Naive timestamps are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}
