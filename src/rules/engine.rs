//! Move rules trait for game implementations.
//!
//! Rule sets implement `MoveRules` to define:
//! - Which positions accept a die value
//! - Where a piece lands
//! - Which opposing pieces a landing captures
//!
//! The match engine calls into `MoveRules` for every legality decision
//! but never interprets squares itself.

use serde::{Deserialize, Serialize};

use crate::core::player::{Player, PlayerId, Seat};
use crate::core::position::{DieValue, PiecePosition};

/// Result of a completed match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// First player to bring all four pieces home.
    Winner(PlayerId),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: &PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => p == player,
        }
    }
}

/// An opposing piece sent back to base by a landing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capture {
    pub seat: Seat,
    pub piece_index: usize,
}

/// Move rules trait.
///
/// ## Implementation Notes
///
/// - `is_valid_move` and `advance` must agree: `advance` returns `Some`
///   exactly when `is_valid_move` is true
/// - `captures` is pure; the engine applies the returned captures
/// - All methods must be deterministic
pub trait MoveRules: Send + Sync {
    /// Whether a piece at `position` may move by `die`.
    fn is_valid_move(&self, position: PiecePosition, die: DieValue) -> bool;

    /// Destination of a piece at `position` moving by `die`.
    ///
    /// Returns `None` if the move is illegal.
    fn advance(&self, position: PiecePosition, die: DieValue) -> Option<PiecePosition>;

    /// Pieces captured when `mover`'s piece `piece_index` lands on `landed`.
    ///
    /// `board` is the table after the move has been applied.
    fn captures(
        &self,
        board: &[Player],
        mover: Seat,
        piece_index: usize,
        landed: PiecePosition,
    ) -> Vec<Capture> {
        let _ = (board, mover, piece_index, landed);
        Vec::new()
    }

    // === Convenience Methods ===

    /// Whether any of `pieces` accepts `die`.
    fn has_valid_moves(&self, pieces: &[PiecePosition], die: DieValue) -> bool {
        pieces.iter().any(|&p| self.is_valid_move(p, die))
    }

    /// Indices of the pieces that accept `die`.
    fn movable_pieces(&self, pieces: &[PiecePosition], die: DieValue) -> Vec<usize> {
        pieces
            .iter()
            .enumerate()
            .filter(|&(_, &p)| self.is_valid_move(p, die))
            .map(|(i, _)| i)
            .collect()
    }
}
