//! Core types: identifiers, players, positions, dice, configuration,
//! commands and match state.
//!
//! Everything here is plain data plus the helpers that keep it well-formed.
//! Rules live in `rules`/`games`; the state machine lives in `engine`.

pub mod ids;
pub mod player;
pub mod position;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;

pub use ids::{MatchId, Stake, TransportAddress};
pub use player::{Color, Player, PlayerId, PlayerInfo, Seat};
pub use position::{DieValue, PiecePosition, HOME_OFFSET, PIECES_PER_PLAYER, TRACK_LEN};
pub use rng::{DieRoller, GameRng, GameRngState, ScriptedDice};
pub use config::{ConfigError, SyncConfig};
pub use action::{ActionRecord, Command};
pub use state::{MatchSnapshot, MatchState, MatchStatus, TurnPhase};
