//! Piece positions and die values.
//!
//! ## Logical offsets
//!
//! Every piece that has left its base sits at a logical offset measured from
//! its own entry square:
//!
//! | Offset   | Position          |
//! |----------|-------------------|
//! | `0..=51` | `Track(n)`        |
//! | `52..=56`| `HomeStretch(n)`  |
//! | `57`     | `Home`            |
//!
//! `HomeStretch(57)` is representable but is never produced by a move:
//! landing on offset 57 always yields `Home`.
//!
//! ## Wire encoding
//!
//! Positions serialize as a single integer so clients can render them
//! without knowing the enum: `-1` for `Base`, the offset for track and
//! home-stretch squares, `100` for `Home`.

use serde::{Deserialize, Serialize};

/// Number of squares on the shared circular track.
pub const TRACK_LEN: u8 = 52;

/// First logical offset of the private home stretch.
pub const HOME_STRETCH_START: u8 = TRACK_LEN;

/// Logical offset of the final home slot.
pub const HOME_OFFSET: u8 = 57;

/// Number of pieces each player owns.
pub const PIECES_PER_PLAYER: usize = 4;

const WIRE_BASE: i16 = -1;
const WIRE_HOME: i16 = 100;

/// Where a single piece currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum PiecePosition {
    /// Not yet entered the track.
    #[default]
    Base,
    /// On the shared track, `0..=51`.
    Track(u8),
    /// On the player's private stretch, `52..=57`.
    HomeStretch(u8),
    /// Finished; never moves again.
    Home,
}

impl PiecePosition {
    /// Track square, if `n` is on the shared track.
    #[must_use]
    pub fn track(n: u8) -> Option<Self> {
        (n < TRACK_LEN).then_some(Self::Track(n))
    }

    /// Home-stretch square, if `n` is inside the stretch.
    #[must_use]
    pub fn home_stretch(n: u8) -> Option<Self> {
        (HOME_STRETCH_START..=HOME_OFFSET)
            .contains(&n)
            .then_some(Self::HomeStretch(n))
    }

    /// Map a logical offset back to a position.
    ///
    /// Returns `None` past the final home slot.
    #[must_use]
    pub fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            o if o < TRACK_LEN => Some(Self::Track(o)),
            o if o < HOME_OFFSET => Some(Self::HomeStretch(o)),
            HOME_OFFSET => Some(Self::Home),
            _ => None,
        }
    }

    /// Logical offset of a piece on the board.
    ///
    /// `Base` has no offset; `Home` reports the final slot.
    #[must_use]
    pub fn offset(self) -> Option<u8> {
        match self {
            Self::Base => None,
            Self::Track(n) | Self::HomeStretch(n) => Some(n),
            Self::Home => Some(HOME_OFFSET),
        }
    }

    #[must_use]
    pub fn is_home(self) -> bool {
        self == Self::Home
    }

    #[must_use]
    pub fn is_base(self) -> bool {
        self == Self::Base
    }

    /// Check that the position is inside its documented range.
    #[must_use]
    pub fn is_well_formed(self) -> bool {
        match self {
            Self::Base | Self::Home => true,
            Self::Track(n) => n < TRACK_LEN,
            Self::HomeStretch(n) => (HOME_STRETCH_START..=HOME_OFFSET).contains(&n),
        }
    }
}

impl From<PiecePosition> for i16 {
    fn from(pos: PiecePosition) -> Self {
        match pos {
            PiecePosition::Base => WIRE_BASE,
            PiecePosition::Track(n) | PiecePosition::HomeStretch(n) => i16::from(n),
            PiecePosition::Home => WIRE_HOME,
        }
    }
}

impl TryFrom<i16> for PiecePosition {
    type Error = String;

    fn try_from(raw: i16) -> Result<Self, Self::Error> {
        match raw {
            WIRE_BASE => Ok(Self::Base),
            WIRE_HOME => Ok(Self::Home),
            n if (0..i16::from(TRACK_LEN)).contains(&n) => Ok(Self::Track(n as u8)),
            n if (i16::from(HOME_STRETCH_START)..=i16::from(HOME_OFFSET)).contains(&n) => {
                Ok(Self::HomeStretch(n as u8))
            }
            other => Err(format!("invalid piece position {other}")),
        }
    }
}

/// A single die face, always in `1..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub struct DieValue(u8);

impl DieValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    pub const SIX: DieValue = DieValue(6);

    /// Create a die value, rejecting faces outside `1..=6`.
    #[must_use]
    pub fn new(face: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&face).then_some(Self(face))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_six(self) -> bool {
        self.0 == Self::MAX
    }
}

impl From<DieValue> for u8 {
    fn from(die: DieValue) -> Self {
        die.0
    }
}

impl TryFrom<u8> for DieValue {
    type Error = String;

    fn try_from(face: u8) -> Result<Self, Self::Error> {
        Self::new(face).ok_or_else(|| format!("die face {face} out of range"))
    }
}

impl std::fmt::Display for DieValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
