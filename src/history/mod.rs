//! Local cache of team rosters and per-player weekly form snapshots.
//!
//! Flat JSON files, one per team and one per player. The web-facing
//! analysis path only reads them; the batch binaries read-modify-write.
//! The two must not run concurrently against the same data directory.

pub mod calendar;
pub mod enrich;
pub mod store;

pub use enrich::PlayerWithHistory;
pub use store::FileStore;
