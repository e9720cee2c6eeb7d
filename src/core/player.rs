//! Player identification and per-seat data.
//!
//! ## PlayerId
//!
//! Opaque user identity supplied by the client (and known to the store).
//!
//! ## Seat
//!
//! Type-safe seat index. Seat order is join order, which is also turn order
//! and color order.

use serde::{Deserialize, Serialize};

use super::ids::TransportAddress;
use super::position::{PiecePosition, PIECES_PER_PLAYER};

/// User identifier as known to the persistence gateway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seat index within a match.
///
/// Seats are 0-based: the first player to join sits at `Seat(0)` and rolls first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(pub u8);

impl Seat {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that plays after this one.
    ///
    /// ```
    /// use ludo_sync::core::Seat;
    ///
    /// assert_eq!(Seat::new(0).next(2), Seat::new(1));
    /// assert_eq!(Seat::new(1).next(2), Seat::new(0));
    /// ```
    #[must_use]
    pub fn next(self, player_count: usize) -> Self {
        debug_assert!(player_count > 0, "next seat of an empty table");
        Self(((self.index() + 1) % player_count) as u8)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Piece colors, assigned in this order as players join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    /// Fixed palette in join order.
    pub const PALETTE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    /// Color for the given seat, if the palette covers it.
    #[must_use]
    pub fn for_seat(seat: Seat) -> Option<Color> {
        Self::PALETTE.get(seat.index()).copied()
    }
}

/// What a client supplies when asking to join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub user_id: PlayerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportAddress>,
    #[serde(default)]
    pub is_bot: bool,
}

impl PlayerInfo {
    /// Create join info for a human player.
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: PlayerId::new(user_id),
            name: name.into(),
            avatar: None,
            transport: None,
            is_bot: false,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    #[must_use]
    pub fn with_transport(mut self, address: TransportAddress) -> Self {
        self.transport = Some(address);
        self
    }
}

/// A seated player and their four pieces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub color: Color,
    pub pieces: [PiecePosition; PIECES_PER_PLAYER],
    pub is_bot: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Destination for direct messages; owned by the transport.
    #[serde(skip)]
    pub transport: Option<TransportAddress>,
}

impl Player {
    /// Seat a player with every piece in base.
    #[must_use]
    pub fn seated(info: PlayerInfo, color: Color) -> Self {
        Self {
            id: info.user_id,
            color,
            pieces: [PiecePosition::Base; PIECES_PER_PLAYER],
            is_bot: info.is_bot,
            name: info.name,
            avatar: info.avatar,
            transport: info.transport,
        }
    }

    /// Number of pieces that reached home.
    #[must_use]
    pub fn pieces_home(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_home()).count()
    }

    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.pieces_home() == PIECES_PER_PLAYER
    }
}
