//! Matchmaker - pairs join requests with waiting matches.
//!
//! First available seat wins: no rating, no queue fairness. The whole
//! find-or-create-and-seat sequence runs under a per-stake lock, so two
//! simultaneous requests for the same stake can neither both create a match
//! nor both claim the last seat of one.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::registry::SessionRegistry;
use crate::core::{MatchId, PlayerInfo, Seat, Stake};
use crate::error::{Rejection, SessionError};

/// Where a join request ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    pub match_id: MatchId,
    pub seat: Seat,
    /// Whether a new match was created for this request.
    pub created: bool,
}

/// Pairs join requests by stake.
#[derive(Debug)]
pub struct Matchmaker {
    registry: Arc<SessionRegistry>,
    buckets: Mutex<FxHashMap<Stake, Arc<Mutex<()>>>>,
}

impl Matchmaker {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            buckets: Mutex::new(FxHashMap::default()),
        }
    }

    /// Seat the player in a waiting match for `stake`, creating one if needed.
    pub async fn join_or_create(
        &self,
        stake: Stake,
        info: PlayerInfo,
    ) -> Result<JoinOutcome, SessionError> {
        let bucket = self.bucket(stake).await;
        let _serialized = bucket.lock().await;

        for slot in self.registry.open_matches(stake).await {
            match self.registry.seat_player(&slot, info.clone()).await {
                Ok(seat) => {
                    return Ok(JoinOutcome {
                        match_id: slot.id().clone(),
                        seat,
                        created: false,
                    });
                }
                Err(Rejection::AlreadySeated) => {
                    let seat = self.registry.reconfirm_seat(&slot, &info).await?;
                    return Ok(JoinOutcome {
                        match_id: slot.id().clone(),
                        seat,
                        created: false,
                    });
                }
                Err(reason) => {
                    debug!(match_id = %slot.id(), %reason, "waiting match refused player");
                }
            }
        }

        let slot = self.registry.create(stake).await?;
        let seat = self.registry.seat_player(&slot, info).await?;
        info!(match_id = %slot.id(), %stake, "opened new match");
        Ok(JoinOutcome {
            match_id: slot.id().clone(),
            seat,
            created: true,
        })
    }

    async fn bucket(&self, stake: Stake) -> Arc<Mutex<()>> {
        let mut buckets = self.buckets.lock().await;
        Arc::clone(buckets.entry(stake).or_default())
    }
}
