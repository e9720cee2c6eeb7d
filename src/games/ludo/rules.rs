//! Classic rule set.

use crate::core::position::{DieValue, PiecePosition, HOME_OFFSET};
use crate::rules::MoveRules;

/// Standard rules without captures or safe squares.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicRules;

impl ClassicRules {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MoveRules for ClassicRules {
    fn is_valid_move(&self, position: PiecePosition, die: DieValue) -> bool {
        match position {
            PiecePosition::Home => false,
            PiecePosition::Base => die.is_six(),
            PiecePosition::Track(n) | PiecePosition::HomeStretch(n) => n + die.get() <= HOME_OFFSET,
        }
    }

    fn advance(&self, position: PiecePosition, die: DieValue) -> Option<PiecePosition> {
        if !self.is_valid_move(position, die) {
            return None;
        }
        match position {
            PiecePosition::Base => PiecePosition::track(0),
            PiecePosition::Home => None,
            PiecePosition::Track(n) | PiecePosition::HomeStretch(n) => {
                PiecePosition::from_offset(n + die.get())
            }
        }
    }
}
