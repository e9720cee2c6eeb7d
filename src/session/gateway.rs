//! Persistence gateway contract.
//!
//! The store keeps one record per match (keyed by the same id the registry
//! uses), links users to the matches they joined, and receives the terminal
//! status and winner once. Gameplay never waits on it: the session layer
//! calls `link_player` and `finalize_match` from spawned tasks and only logs
//! failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::{MatchId, MatchStatus, PlayerId, Stake};
use crate::error::GatewayError;

/// External store for match records.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Create a `waiting` record and return its id.
    async fn create_match(&self, stake: Stake) -> Result<MatchId, GatewayError>;

    /// Associate a user with a match.
    async fn link_player(&self, match_id: &MatchId, user: &PlayerId) -> Result<(), GatewayError>;

    /// Record the terminal status and winner.
    async fn finalize_match(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
        winner: &PlayerId,
    ) -> Result<(), GatewayError>;
}

/// Stored view of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub status: MatchStatus,
    pub stake: Stake,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerId>,
}

/// In-process store, for tests and single-node deployments without a database.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    records: Mutex<FxHashMap<MatchId, MatchRecord>>,
    finalize_calls: AtomicUsize,
    offline: AtomicBool,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until set back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stored record for a match.
    pub async fn record(&self, match_id: &MatchId) -> Option<MatchRecord> {
        self.records.lock().await.get(match_id).cloned()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// How many times `finalize_match` has been called (including failures).
    #[must_use]
    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_match(&self, stake: Stake) -> Result<MatchId, GatewayError> {
        self.check_online()?;
        let id = MatchId::new(uuid::Uuid::new_v4().to_string());
        let record = MatchRecord {
            id: id.clone(),
            status: MatchStatus::Waiting,
            stake,
            winner: None,
            players: Vec::new(),
        };
        self.records.lock().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn link_player(&self, match_id: &MatchId, user: &PlayerId) -> Result<(), GatewayError> {
        self.check_online()?;
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(match_id)
            .ok_or_else(|| GatewayError::UnknownMatch(match_id.clone()))?;
        if !record.players.contains(user) {
            record.players.push(user.clone());
        }
        Ok(())
    }

    async fn finalize_match(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
        winner: &PlayerId,
    ) -> Result<(), GatewayError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(match_id)
            .ok_or_else(|| GatewayError::UnknownMatch(match_id.clone()))?;
        record.status = status;
        record.winner = Some(winner.clone());
        Ok(())
    }
}
