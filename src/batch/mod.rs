//! Shared support for the offline batch binaries.
//!
//! The binaries refresh the local roster/history files and must not run
//! while the server is running against the same data directory.

pub mod checkpoint;
pub mod session;

pub use checkpoint::CheckpointFile;
pub use session::BatchSession;

use crate::upstream::XmlNode;

/// A player's weekly form as read from a `player.aspx` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerForm {
    /// Game shape, 1–9.
    pub game_shape: u8,
    pub dmi: i64,
}

/// Read game shape and DMI out of a player document. `None` when either
/// field is missing or out of range.
pub fn player_form(doc: &XmlNode) -> Option<PlayerForm> {
    let game_shape: u8 = doc.descendant("gameShape")?.text().parse().ok()?;
    let dmi: i64 = doc.descendant("dmi")?.text().parse().ok()?;

    if !(1..=9).contains(&game_shape) || dmi < 0 {
        return None;
    }
    Some(PlayerForm { game_shape, dmi })
}
