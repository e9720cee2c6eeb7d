//! Side effects requested by the engine.
//!
//! The engine never performs I/O. Each accepted command returns a
//! `Transition` listing the effects to run, in order, once the in-memory
//! mutation is complete.

use std::sync::Arc;
use std::time::Duration;

use smallvec::SmallVec;

use crate::core::{MatchSnapshot, PlayerId};

/// One side effect of an accepted command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Push the full snapshot to every participant.
    Publish(Arc<MatchSnapshot>),

    /// Pass the turn after `delay` unless the match has moved past `epoch`.
    ScheduleAutoAdvance { epoch: u64, delay: Duration },

    /// Best-effort link of a newly seated user to the stored match.
    LinkPlayer(PlayerId),

    /// Persist the terminal status and winner. Emitted exactly once per match.
    Finalize { winner: PlayerId },
}

/// Effects of one command. Most commands emit one or two.
pub type Effects = SmallVec<[Effect; 3]>;

/// Result of an accepted command: a value for the caller plus effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition<T> {
    pub value: T,
    pub effects: Effects,
}

impl<T> Transition<T> {
    pub(crate) fn new(value: T, effects: Effects) -> Self {
        Self { value, effects }
    }

    /// Snapshots published by this transition, in order.
    pub fn published(&self) -> impl Iterator<Item = &MatchSnapshot> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Publish(snapshot) => Some(snapshot.as_ref()),
            _ => None,
        })
    }

    /// Epoch of the auto-advance timer this transition asks for, if any.
    #[must_use]
    pub fn auto_advance_epoch(&self) -> Option<u64> {
        self.effects.iter().find_map(|e| match e {
            Effect::ScheduleAutoAdvance { epoch, .. } => Some(*epoch),
            _ => None,
        })
    }

    /// Whether this transition finalizes the match.
    #[must_use]
    pub fn finalizes(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, Effect::Finalize { .. }))
    }
}
