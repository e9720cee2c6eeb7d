//! The match engine: one state machine per match.
//!
//! ## States
//!
//! `Waiting -> Playing -> Completed`, no other transitions. Within
//! `Playing`, each turn alternates between awaiting a roll and awaiting a
//! move; a 6 grants another roll, anything else passes the turn.
//!
//! ## Effects
//!
//! Operations never perform I/O. They return a `Transition` whose
//! `effects` the session layer executes after the mutation completes.

pub mod effect;
pub mod machine;

pub use effect::{Effect, Effects, Transition};
pub use machine::{AfterMove, MatchEngine, MatchEngineBuilder, MoveOutcome};
