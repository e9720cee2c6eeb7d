//! Concrete rule sets.

pub mod ludo;
