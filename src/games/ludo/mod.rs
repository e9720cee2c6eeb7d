//! Classic two-player Ludo rules.
//!
//! - A piece leaves base only on a 6, landing on its entry square (`Track(0)`)
//! - Other pieces advance by the die value along their own logical offset
//! - Landing exactly on offset 57 brings a piece home
//! - Overshooting home is illegal, not clamped
//! - No captures: landing on an opponent leaves both pieces in place

mod rules;

pub use rules::ClassicRules;
