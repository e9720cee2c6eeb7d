//! Dice sources.
//!
//! ## Key Features
//!
//! - **Injected**: the engine only sees the `DieRoller` trait
//! - **Deterministic**: `GameRng` with the same seed produces an identical sequence
//! - **Serializable**: O(1) state capture and restore for checkpointing
//! - **Scripted**: `ScriptedDice` replays a fixed list of faces
//!
//! ## Usage
//!
//! ```
//! use ludo_sync::core::{DieRoller, GameRng};
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//!
//! for _ in 0..20 {
//!     assert_eq!(a.roll(), b.roll());
//! }
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::position::DieValue;

/// A source of die faces.
///
/// Implementations must return values uniformly distributed over `1..=6`
/// unless they are deliberately scripted.
pub trait DieRoller: Send {
    /// Draw the next face.
    fn roll(&mut self) -> DieValue;
}

/// Seeded dice for live matches.
///
/// Backed by ChaCha8, so a match can be replayed from its seed and resumed
/// from a checkpoint without re-rolling everything before it.
#[derive(Clone, Debug)]
pub struct GameRng {
    stream: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            stream: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from the thread RNG; used when the config pins no seed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Derive an independent stream, e.g. one per match from a server seed.
    ///
    /// The same `stream` always yields the same sequence for the same seed.
    #[must_use]
    pub fn derive(&self, stream: u64) -> Self {
        Self::new(self.seed.wrapping_add(stream.wrapping_mul(0x9E3779B97F4A7C15)))
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Capture the position in the stream.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.stream.get_word_pos(),
        }
    }

    /// Resume from a captured position.
    #[must_use]
    pub fn from_state(checkpoint: &GameRngState) -> Self {
        let mut stream = ChaCha8Rng::seed_from_u64(checkpoint.seed);
        stream.set_word_pos(checkpoint.word_pos);
        Self {
            stream,
            seed: checkpoint.seed,
        }
    }
}

impl DieRoller for GameRng {
    fn roll(&mut self) -> DieValue {
        let face = self.stream.gen_range(DieValue::MIN..=DieValue::MAX);
        DieValue::new(face).unwrap_or(DieValue::SIX)
    }
}

/// Checkpoint of a `GameRng`: seed plus ChaCha word position, constant size
/// however many faces were rolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
}

/// Replays a fixed list of faces, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    faces: Vec<DieValue>,
    cursor: usize,
}

impl ScriptedDice {
    /// Build a script from raw faces.
    ///
    /// Returns `None` if the script is empty or contains a face outside `1..=6`.
    #[must_use]
    pub fn from_faces(faces: &[u8]) -> Option<Self> {
        let faces = faces
            .iter()
            .map(|&f| DieValue::new(f))
            .collect::<Option<Vec<_>>>()?;
        if faces.is_empty() {
            return None;
        }
        Some(Self { faces, cursor: 0 })
    }

    /// Number of faces rolled so far.
    #[must_use]
    pub fn rolled(&self) -> usize {
        self.cursor
    }
}

impl DieRoller for ScriptedDice {
    fn roll(&mut self) -> DieValue {
        let face = self.faces[self.cursor % self.faces.len()];
        self.cursor += 1;
        face
    }
}
