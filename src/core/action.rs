//! Player commands and the action history.
//!
//! A `Command` is what a seated player asks the engine to do; an
//! `ActionRecord` is what the engine remembers after accepting it. Rejected
//! commands are never recorded.

use serde::{Deserialize, Serialize};

use super::player::{PlayerId, Seat};
use super::position::DieValue;

/// A gameplay command addressed to one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    /// Roll the die.
    Roll,
    /// Move one of the player's pieces by the pending die value.
    #[serde(rename_all = "camelCase")]
    Move { piece_index: u8 },
}

/// An accepted command with metadata for history tracking.
///
/// Used for:
/// - Replay/debugging
/// - Dispute review after a match completes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// The player who issued the command.
    pub player: PlayerId,

    /// Their seat at the time.
    pub seat: Seat,

    /// The command taken.
    pub command: Command,

    /// Face rolled (for `Roll`) or consumed (for `Move`).
    pub die: DieValue,

    /// Turn number when the command was accepted.
    pub turn: u32,

    /// Sequence number within the turn (for ordering).
    pub sequence: u32,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(
        player: PlayerId,
        seat: Seat,
        command: Command,
        die: DieValue,
        turn: u32,
        sequence: u32,
    ) -> Self {
        Self {
            player,
            seat,
            command,
            die,
            turn,
            sequence,
        }
    }
}
