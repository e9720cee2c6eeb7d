//! Error types.
//!
//! `Rejection` is the reason an engine command was refused. The wire
//! boundary treats every rejection as a silent no-op; the reason exists so
//! callers can log it or surface it later.

use crate::core::{MatchId, MatchStatus};

/// Why a command left the match untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("match is {0}")]
    WrongStatus(MatchStatus),

    #[error("player is not seated in this match")]
    UnknownPlayer,

    #[error("not this player's turn")]
    WrongTurn,

    #[error("rolling is not permitted now")]
    NotRollingPhase,

    #[error("no die value is pending")]
    NoPendingDie,

    #[error("piece index {0} out of range")]
    PieceOutOfRange(u8),

    #[error("piece cannot move by the pending die value")]
    IllegalMove,

    #[error("match is full")]
    MatchFull,

    #[error("player is already seated")]
    AlreadySeated,

    #[error("timer no longer matches the match state")]
    StaleTimer,
}

/// Failure reported by the persistence gateway.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("no stored match {0}")]
    UnknownMatch(MatchId),
}

/// Failure of a session-level operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("persistence gateway failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("command rejected: {0}")]
    Rejected(#[from] Rejection),
}
