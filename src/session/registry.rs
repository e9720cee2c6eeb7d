//! Live match registry.
//!
//! Owns every in-memory match for its lifetime and is the only place that
//! executes engine effects.
//!
//! ## Concurrency
//!
//! - Each match sits behind its own `tokio::sync::Mutex`: one writer per match
//! - Snapshots are enqueued while that lock is held, so per-match delivery
//!   order equals mutation order
//! - Gateway calls and auto-advance timers run in spawned tasks and never
//!   hold the lock while waiting
//! - Timers carry the epoch they were scheduled at; the engine rejects them
//!   if the match has moved on

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::broadcast::{Broadcaster, OutboundEvent};
use super::gateway::PersistenceGateway;
use crate::core::{
    DieRoller, DieValue, GameRng, MatchId, MatchSnapshot, MatchStatus, PlayerId, PlayerInfo, Seat,
    Stake, SyncConfig,
};
use crate::engine::{Effect, Effects, MatchEngine, MatchEngineBuilder, MoveOutcome, Transition};
use crate::error::{Rejection, SessionError};
use crate::games::ludo::ClassicRules;
use crate::rules::MoveRules;

/// A registered match: its immutable key data plus the locked engine.
pub struct MatchSlot {
    id: MatchId,
    stake: Stake,
    engine: Mutex<MatchEngine>,
}

impl MatchSlot {
    #[must_use]
    pub fn id(&self) -> &MatchId {
        &self.id
    }

    #[must_use]
    pub fn stake(&self) -> Stake {
        self.stake
    }

    /// Current snapshot (waits for the match lock).
    pub async fn snapshot(&self) -> MatchSnapshot {
        self.engine.lock().await.snapshot()
    }
}

impl std::fmt::Debug for MatchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSlot")
            .field("id", &self.id)
            .field("stake", &self.stake)
            .finish_non_exhaustive()
    }
}

/// Shared reference to a registered match.
pub type MatchHandle = Arc<MatchSlot>;

/// Builds the dice for the n-th match a registry creates.
pub type DiceFactory = Arc<dyn Fn(u64) -> Box<dyn DieRoller> + Send + Sync>;

/// Mapping from match id to engine, plus the collaborators effects need.
pub struct SessionRegistry {
    matches: RwLock<FxHashMap<MatchId, MatchHandle>>,
    gateway: Arc<dyn PersistenceGateway>,
    broadcaster: Arc<dyn Broadcaster>,
    rules: Arc<dyn MoveRules>,
    dice: DiceFactory,
    config: SyncConfig,
    created: AtomicU64,
}

/// Builder for creating a `SessionRegistry`.
pub struct RegistryBuilder {
    config: SyncConfig,
    gateway: Arc<dyn PersistenceGateway>,
    broadcaster: Arc<dyn Broadcaster>,
    rules: Option<Arc<dyn MoveRules>>,
    dice: Option<DiceFactory>,
}

impl RegistryBuilder {
    /// Rule set shared by every match. Defaults to `ClassicRules`.
    pub fn rules(mut self, rules: Arc<dyn MoveRules>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Dice source per match. Defaults to streams derived from the config
    /// seed, or OS entropy when no seed is set.
    pub fn dice(mut self, factory: DiceFactory) -> Self {
        self.dice = Some(factory);
        self
    }

    pub fn build(self) -> Arc<SessionRegistry> {
        let dice: DiceFactory = match (self.dice, self.config.rng_seed) {
            (Some(factory), _) => factory,
            (None, Some(seed)) => {
                let root = GameRng::new(seed);
                Arc::new(move |stream: u64| Box::new(root.derive(stream)) as Box<dyn DieRoller>)
            }
            (None, None) => {
                Arc::new(|_: u64| Box::new(GameRng::from_entropy()) as Box<dyn DieRoller>)
            }
        };

        Arc::new(SessionRegistry {
            matches: RwLock::new(FxHashMap::default()),
            gateway: self.gateway,
            broadcaster: self.broadcaster,
            rules: self.rules.unwrap_or_else(|| Arc::new(ClassicRules::new())),
            dice,
            config: self.config,
            created: AtomicU64::new(0),
        })
    }
}

impl SessionRegistry {
    /// Create a registry with classic rules and default dice.
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn PersistenceGateway>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Arc<Self> {
        Self::builder(config, gateway, broadcaster).build()
    }

    pub fn builder(
        config: SyncConfig,
        gateway: Arc<dyn PersistenceGateway>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> RegistryBuilder {
        RegistryBuilder {
            config,
            gateway,
            broadcaster,
            rules: None,
            dice: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // === Lifecycle ===

    /// Ask the gateway for a new match id and register a fresh engine under it.
    pub async fn create(&self, stake: Stake) -> Result<MatchHandle, SessionError> {
        let id = self.gateway.create_match(stake).await?;
        let stream = self.created.fetch_add(1, Ordering::Relaxed);

        let engine = MatchEngineBuilder::new(id.clone(), stake)
            .rules(Arc::clone(&self.rules))
            .boxed_dice((self.dice)(stream))
            .config(&self.config)
            .build();

        let slot = Arc::new(MatchSlot {
            id: id.clone(),
            stake,
            engine: Mutex::new(engine),
        });
        self.matches.write().await.insert(id.clone(), Arc::clone(&slot));
        info!(match_id = %id, %stake, "match created");
        Ok(slot)
    }

    /// Look up a live match.
    pub async fn get(&self, id: &MatchId) -> Option<MatchHandle> {
        self.matches.read().await.get(id).cloned()
    }

    /// Drop a match from memory. Returns whether it was registered.
    pub async fn remove(&self, id: &MatchId) -> bool {
        let removed = self.matches.write().await.remove(id).is_some();
        if removed {
            info!(match_id = %id, "match retired");
        }
        removed
    }

    /// Number of live matches.
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }

    /// Waiting matches for `stake` that still have an open seat.
    pub async fn open_matches(&self, stake: Stake) -> Vec<MatchHandle> {
        let candidates: Vec<MatchHandle> = self
            .matches
            .read()
            .await
            .values()
            .filter(|slot| slot.stake == stake)
            .cloned()
            .collect();

        let mut open = Vec::with_capacity(candidates.len());
        for slot in candidates {
            if slot.engine.lock().await.is_open() {
                open.push(slot);
            }
        }
        open
    }

    // === Commands ===

    /// Seat a player in `slot`, telling the joining client before anyone
    /// receives the resulting snapshot.
    pub async fn seat_player(
        self: &Arc<Self>,
        slot: &MatchHandle,
        info: PlayerInfo,
    ) -> Result<Seat, Rejection> {
        let user = info.user_id.clone();
        let address = info.transport.clone();

        let mut engine = slot.engine.lock().await;
        let transition = engine.add_player(info).inspect_err(|reason| {
            debug!(match_id = %slot.id, player = %user, %reason, "join rejected");
        })?;

        if let Some(address) = &address {
            self.broadcaster.send_to(
                address,
                OutboundEvent::GameJoined {
                    match_id: slot.id.clone(),
                    player_id: user.clone(),
                },
            );
        }
        info!(match_id = %slot.id, player = %user, seat = transition.value.0, "player seated");
        self.run_effects(slot, transition.effects);
        Ok(transition.value)
    }

    /// Route a roll to the match.
    pub async fn roll_dice(
        self: &Arc<Self>,
        id: &MatchId,
        player: &PlayerId,
    ) -> Result<DieValue, SessionError> {
        let slot = self.require(id).await?;
        let die = self.apply(&slot, |engine| engine.roll_dice(player)).await?;
        debug!(match_id = %id, %player, %die, "dice rolled");
        Ok(die)
    }

    /// Route a move to the match.
    pub async fn move_piece(
        self: &Arc<Self>,
        id: &MatchId,
        player: &PlayerId,
        piece_index: u8,
    ) -> Result<MoveOutcome, SessionError> {
        let slot = self.require(id).await?;
        let outcome = self
            .apply(&slot, |engine| engine.move_piece(player, piece_index))
            .await?;
        debug!(match_id = %id, %player, piece_index, to = ?outcome.to, "piece moved");
        Ok(outcome)
    }

    /// Confirm the seat a player already holds in `slot`.
    ///
    /// Used when a client repeats a join: the seat is rebound to the new
    /// transport address and `gameJoined` is sent again. Nothing is published.
    pub async fn reconfirm_seat(
        &self,
        slot: &MatchHandle,
        info: &PlayerInfo,
    ) -> Result<Seat, Rejection> {
        let mut engine = slot.engine.lock().await;
        let seat = engine
            .state()
            .seat_of(&info.user_id)
            .ok_or(Rejection::UnknownPlayer)?;

        if let Some(address) = &info.transport {
            engine.rebind_transport(&info.user_id, address.clone())?;
            self.broadcaster.send_to(
                address,
                OutboundEvent::GameJoined {
                    match_id: slot.id.clone(),
                    player_id: info.user_id.clone(),
                },
            );
        }
        debug!(match_id = %slot.id, player = %info.user_id, %seat, "join repeated; seat kept");
        Ok(seat)
    }

    // === Internals ===

    async fn require(&self, id: &MatchId) -> Result<MatchHandle, SessionError> {
        self.get(id)
            .await
            .ok_or_else(|| SessionError::MatchNotFound(id.clone()))
    }

    async fn apply<T>(
        self: &Arc<Self>,
        slot: &MatchHandle,
        op: impl FnOnce(&mut MatchEngine) -> Result<Transition<T>, Rejection>,
    ) -> Result<T, Rejection> {
        let mut engine = slot.engine.lock().await;
        let transition = op(&mut engine)
            .inspect_err(|reason| debug!(match_id = %slot.id, %reason, "command ignored"))?;
        self.run_effects(slot, transition.effects);
        Ok(transition.value)
    }

    /// Execute effects in order. Called with the match lock held.
    fn run_effects(self: &Arc<Self>, slot: &MatchHandle, effects: Effects) {
        for effect in effects {
            match effect {
                Effect::Publish(snapshot) => self.broadcaster.publish(&slot.id, snapshot),
                Effect::ScheduleAutoAdvance { epoch, delay } => {
                    // Counted from the roll, not from when the task is first polled.
                    let deadline = Instant::now() + delay;
                    let registry = Arc::clone(self);
                    let slot = Arc::clone(slot);
                    tokio::spawn(async move {
                        tokio::time::sleep_until(deadline).await;
                        registry.fire_auto_advance(&slot, epoch).await;
                    });
                }
                Effect::LinkPlayer(user) => {
                    let gateway = Arc::clone(&self.gateway);
                    let id = slot.id.clone();
                    tokio::spawn(async move {
                        if let Err(err) = gateway.link_player(&id, &user).await {
                            warn!(
                                match_id = %id,
                                player = %user,
                                error = %err,
                                "failed to link player to match"
                            );
                        }
                    });
                }
                Effect::Finalize { winner } => {
                    let registry = Arc::clone(self);
                    let id = slot.id.clone();
                    info!(match_id = %id, %winner, "match completed");
                    tokio::spawn(async move {
                        registry.finalize(&id, &winner).await;
                    });
                }
            }
        }
    }

    async fn fire_auto_advance(self: &Arc<Self>, slot: &MatchHandle, epoch: u64) {
        match self.apply(slot, |engine| engine.auto_advance(epoch)).await {
            Ok(seat) => debug!(match_id = %slot.id, %seat, "turn passed automatically"),
            Err(reason) => debug!(match_id = %slot.id, %reason, "auto-advance skipped"),
        }
    }

    async fn finalize(&self, id: &MatchId, winner: &PlayerId) {
        if let Err(err) = self
            .gateway
            .finalize_match(id, MatchStatus::Completed, winner)
            .await
        {
            warn!(match_id = %id, %winner, error = %err, "failed to persist match result");
        }
        self.remove(id).await;
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
