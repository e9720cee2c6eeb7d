//! # ludo-sync
//!
//! Authoritative match engine and session services for a two-player,
//! real-time Ludo server.
//!
//! ## Design Principles
//!
//! 1. **Single Writer**: every match is mutated by exactly one engine, behind
//!    its own lock. Commands for different matches never contend.
//!
//! 2. **Pure Transitions**: engine operations validate, mutate and return the
//!    effects to run (broadcast, timers, persistence). They never do I/O.
//!
//! 3. **Explicit Rejections**: an illegal command returns a reason and leaves
//!    the match untouched. The wire boundary ignores it.
//!
//! 4. **Injected Dice**: the random source is a trait object, so tests and
//!    replays can script every roll.
//!
//! ## Modules
//!
//! - `core`: identifiers, players, positions, dice, configuration, state
//! - `rules`: `MoveRules` trait (legality, landing, capture hook)
//! - `games`: the classic rule set
//! - `engine`: the per-match state machine and its effects
//! - `session`: registry, matchmaker, command router, collaborator contracts
//! - `error`: rejection reasons and session errors

pub mod core;
pub mod rules;
pub mod games;
pub mod engine;
pub mod session;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    ActionRecord, Color, Command, DieRoller, DieValue, GameRng, GameRngState, MatchId,
    MatchSnapshot, MatchState, MatchStatus, PiecePosition, Player, PlayerId, PlayerInfo,
    ScriptedDice, Seat, Stake, SyncConfig, TransportAddress, TurnPhase,
};

pub use crate::rules::{Capture, GameResult, MoveRules};

pub use crate::games::ludo::ClassicRules;

pub use crate::engine::{
    AfterMove, Effect, MatchEngine, MatchEngineBuilder, MoveOutcome, Transition,
};

pub use crate::session::{
    Broadcaster, ChannelBroadcaster, CommandRouter, InMemoryGateway, InboundCommand, JoinOutcome,
    DiceFactory, Matchmaker, Outbound, OutboundEvent, PersistenceGateway, RegistryBuilder, Reply,
    SessionRegistry,
};

pub use crate::error::{GatewayError, Rejection, SessionError};
