//! Move rules trait for rule-set implementations.
//!
//! Rule sets implement `MoveRules` to define:
//! - Legal moves for each piece position and die value
//! - Where pieces land
//! - Captures (none by default)
//!
//! The match engine calls into `MoveRules` but never interprets
//! board geometry directly.

pub mod engine;

pub use engine::{Capture, GameResult, MoveRules};
