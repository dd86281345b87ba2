//! Courtside, a personal analytics dashboard backend for a play-by-mail
//! basketball simulation game.
//!
//! The server authenticates against the upstream game API with relayed
//! session cookies, walks team schedules and match boxscores (XML),
//! aggregates per-team and per-player statistics across seasons, and
//! serves JSON the dashboard UI renders. A small local cache of team
//! rosters and weekly player form lives in flat JSON files, refreshed by
//! the standalone batch binaries.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod history;
pub mod logging;
pub mod server;
pub mod upstream;
