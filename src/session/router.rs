//! Inbound command routing.
//!
//! Joins go through the matchmaker; rolls and moves are dispatched straight
//! to the addressed match. Whatever the outcome, nothing is sent back to the
//! caller here: accepted commands reach clients through the broadcaster and
//! rejected ones are dropped after a debug log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::broadcast::Broadcaster;
use super::gateway::PersistenceGateway;
use super::matchmaker::{JoinOutcome, Matchmaker};
use super::registry::SessionRegistry;
use crate::core::{DieValue, MatchId, PlayerId, PlayerInfo, Stake, SyncConfig, TransportAddress};
use crate::engine::MoveOutcome;
use crate::error::SessionError;

/// Commands clients send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundCommand {
    #[serde(rename_all = "camelCase")]
    JoinGame {
        user_id: PlayerId,
        #[serde(alias = "betAmount")]
        stake_amount: Stake,
        name: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RollDice {
        #[serde(alias = "gameId")]
        match_id: MatchId,
        player_id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    MovePiece {
        #[serde(alias = "gameId")]
        match_id: MatchId,
        player_id: PlayerId,
        piece_index: u8,
    },
}

/// What an accepted command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Joined(JoinOutcome),
    Rolled(DieValue),
    Moved(MoveOutcome),
}

/// Entry point for everything the transport receives.
#[derive(Debug)]
pub struct CommandRouter {
    registry: Arc<SessionRegistry>,
    matchmaker: Matchmaker,
}

impl CommandRouter {
    /// Wire up a registry and matchmaker around the given collaborators.
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn PersistenceGateway>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self::from_registry(SessionRegistry::new(config, gateway, broadcaster))
    }

    #[must_use]
    pub fn from_registry(registry: Arc<SessionRegistry>) -> Self {
        Self {
            matchmaker: Matchmaker::new(Arc::clone(&registry)),
            registry,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    /// Route one decoded command from the client at `from`.
    pub async fn handle(
        &self,
        from: &TransportAddress,
        command: InboundCommand,
    ) -> Result<Reply, SessionError> {
        match command {
            InboundCommand::JoinGame {
                user_id,
                stake_amount,
                name,
                avatar,
            } => {
                let info = PlayerInfo {
                    user_id,
                    name,
                    avatar,
                    transport: Some(from.clone()),
                    is_bot: false,
                };
                let outcome = self.matchmaker.join_or_create(stake_amount, info).await?;
                Ok(Reply::Joined(outcome))
            }
            InboundCommand::RollDice {
                match_id,
                player_id,
            } => {
                let die = self.registry.roll_dice(&match_id, &player_id).await?;
                Ok(Reply::Rolled(die))
            }
            InboundCommand::MovePiece {
                match_id,
                player_id,
                piece_index,
            } => {
                let outcome = self
                    .registry
                    .move_piece(&match_id, &player_id, piece_index)
                    .await?;
                Ok(Reply::Moved(outcome))
            }
        }
    }

    /// Decode and route a JSON text frame. Malformed frames are dropped.
    pub async fn handle_text(&self, from: &TransportAddress, frame: &str) -> Option<Reply> {
        let command: InboundCommand = match serde_json::from_str(frame) {
            Ok(command) => command,
            Err(err) => {
                warn!(client = %from, error = %err, "dropping malformed frame");
                return None;
            }
        };
        match self.handle(from, command).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                debug!(client = %from, error = %err, "command had no effect");
                None
            }
        }
    }

    /// A client went away. Seats are kept; there is no resume protocol yet.
    pub fn disconnect(&self, address: &TransportAddress) {
        info!(client = %address, "client disconnected");
    }
}
