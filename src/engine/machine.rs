//! The per-match state machine.

use std::sync::Arc;
use std::time::Duration;

use smallvec::smallvec;

use super::effect::{Effect, Effects, Transition};
use crate::core::{
    Color, Command, DieRoller, DieValue, GameRng, MatchId, MatchSnapshot, MatchState, MatchStatus,
    PiecePosition, Player, PlayerId, PlayerInfo, Seat, Stake, SyncConfig, TransportAddress,
    TurnPhase, PIECES_PER_PLAYER,
};
use crate::error::Rejection;
use crate::games::ludo::ClassicRules;
use crate::rules::{Capture, GameResult, MoveRules};

/// What happened after a piece moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AfterMove {
    /// Rolled a 6: the same player rolls again.
    ExtraTurn,
    /// The turn passed to this seat.
    TurnPassed(Seat),
    /// The mover brought their last piece home.
    Finished(GameResult),
}

/// Result of an accepted `move_piece`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub piece_index: usize,
    pub from: PiecePosition,
    pub to: PiecePosition,
    pub captures: Vec<Capture>,
    pub after: AfterMove,
}

/// Sole mutator of one match.
///
/// Every operation validates first and mutates only on success, so a
/// rejected command leaves the state exactly as it was.
pub struct MatchEngine {
    state: MatchState,
    rules: Arc<dyn MoveRules>,
    dice: Box<dyn DieRoller>,
    max_players: usize,
    auto_advance_delay: Duration,
}

/// Builder for creating a `MatchEngine`.
pub struct MatchEngineBuilder {
    id: MatchId,
    stake: Stake,
    rules: Option<Arc<dyn MoveRules>>,
    dice: Option<Box<dyn DieRoller>>,
    config: SyncConfig,
}

impl MatchEngineBuilder {
    pub fn new(id: MatchId, stake: Stake) -> Self {
        Self {
            id,
            stake,
            rules: None,
            dice: None,
            config: SyncConfig::default(),
        }
    }

    pub fn rules(mut self, rules: Arc<dyn MoveRules>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn dice(mut self, dice: impl DieRoller + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    pub fn boxed_dice(mut self, dice: Box<dyn DieRoller>) -> Self {
        self.dice = Some(dice);
        self
    }

    pub fn config(mut self, config: &SyncConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Build the engine. Defaults: classic rules, dice seeded from the
    /// config or from OS entropy.
    pub fn build(self) -> MatchEngine {
        let rules = self.rules.unwrap_or_else(|| Arc::new(ClassicRules::new()));
        let dice = self.dice.unwrap_or_else(|| match self.config.rng_seed {
            Some(seed) => Box::new(GameRng::new(seed)),
            None => Box::new(GameRng::from_entropy()),
        });

        MatchEngine {
            state: MatchState::new(self.id, self.stake),
            rules,
            dice,
            max_players: self.config.max_players,
            auto_advance_delay: self.config.auto_advance_delay(),
        }
    }
}

impl MatchEngine {
    /// Create an engine with classic rules and the given dice.
    pub fn new(id: MatchId, stake: Stake, dice: impl DieRoller + 'static) -> Self {
        MatchEngineBuilder::new(id, stake).dice(dice).build()
    }

    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    #[must_use]
    pub fn id(&self) -> &MatchId {
        self.state.id()
    }

    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        self.state.snapshot()
    }

    #[must_use]
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    #[must_use]
    pub fn rules(&self) -> &dyn MoveRules {
        self.rules.as_ref()
    }

    /// Whether the match is still looking for players.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.status() == MatchStatus::Waiting && self.state.has_open_seat(self.max_players)
    }

    // === Operations ===

    /// Seat a player. The second seat starts the match.
    pub fn add_player(&mut self, info: PlayerInfo) -> Result<Transition<Seat>, Rejection> {
        if !self.state.has_open_seat(self.max_players) {
            return Err(Rejection::MatchFull);
        }
        if self.state.status() != MatchStatus::Waiting {
            return Err(Rejection::WrongStatus(self.state.status()));
        }
        if self.state.seat_of(&info.user_id).is_some() {
            return Err(Rejection::AlreadySeated);
        }
        let seat = Seat::new(self.state.player_count() as u8);
        let color = Color::for_seat(seat).ok_or(Rejection::MatchFull)?;

        let user = info.user_id.clone();
        self.state.players.push(Player::seated(info, color));

        if !self.state.has_open_seat(self.max_players) {
            self.state.set_status(MatchStatus::Playing);
            self.state.begin_turn(Seat::new(0));
        }
        self.state.touch();

        let effects = smallvec![Effect::LinkPlayer(user), self.publish()];
        Ok(Transition::new(seat, effects))
    }

    /// Roll the die for the current player.
    ///
    /// If no piece can use the result, the transition asks for the turn to
    /// pass automatically after the configured delay.
    pub fn roll_dice(&mut self, player: &PlayerId) -> Result<Transition<DieValue>, Rejection> {
        let seat = self.acting_seat(player)?;
        if !self.state.can_roll() {
            return Err(Rejection::NotRollingPhase);
        }

        let die = self.dice.roll();
        self.state.phase = TurnPhase::AwaitingMove(die);
        self.state.record(seat, Command::Roll, die);
        self.state.touch();

        let mut effects: Effects = smallvec![self.publish()];
        if !self.has_valid_moves(seat, die) {
            effects.push(Effect::ScheduleAutoAdvance {
                epoch: self.state.epoch(),
                delay: self.auto_advance_delay,
            });
        }
        Ok(Transition::new(die, effects))
    }

    /// Move one of the current player's pieces by the pending die value.
    pub fn move_piece(
        &mut self,
        player: &PlayerId,
        piece_index: u8,
    ) -> Result<Transition<MoveOutcome>, Rejection> {
        let seat = self.acting_seat(player)?;
        let die = self.state.pending_die().ok_or(Rejection::NoPendingDie)?;
        let index = usize::from(piece_index);
        if index >= PIECES_PER_PLAYER {
            return Err(Rejection::PieceOutOfRange(piece_index));
        }
        let from = self.state.players[seat.index()].pieces[index];
        let to = self.rules.advance(from, die).ok_or(Rejection::IllegalMove)?;

        self.state.players[seat.index()].pieces[index] = to;
        let captures = self.rules.captures(&self.state.players, seat, index, to);
        for capture in &captures {
            if let Some(victim) = self.state.players.get_mut(capture.seat.index()) {
                if let Some(piece) = victim.pieces.get_mut(capture.piece_index) {
                    *piece = PiecePosition::Base;
                }
            }
        }
        self.state.record(seat, Command::Move { piece_index }, die);

        let mut effects = Effects::new();
        let after = if self.state.players[seat.index()].has_finished() {
            let winner = player.clone();
            self.state.winners.push(winner.clone());
            self.state.set_status(MatchStatus::Completed);
            self.state.phase = TurnPhase::Idle;
            self.state.touch();
            effects.push(self.publish());
            effects.push(Effect::Finalize {
                winner: winner.clone(),
            });
            AfterMove::Finished(GameResult::Winner(winner))
        } else if die.is_six() {
            self.state.phase = TurnPhase::AwaitingRoll;
            self.state.touch();
            effects.push(self.publish());
            AfterMove::ExtraTurn
        } else {
            let next = self.pass_turn();
            effects.push(self.publish());
            AfterMove::TurnPassed(next)
        };

        let outcome = MoveOutcome {
            piece_index: index,
            from,
            to,
            captures,
            after,
        };
        Ok(Transition::new(outcome, effects))
    }

    /// Hand the turn to the next seat.
    pub fn advance_turn(&mut self) -> Result<Transition<Seat>, Rejection> {
        self.require_playing()?;
        let next = self.pass_turn();
        Ok(Transition::new(next, smallvec![self.publish()]))
    }

    /// Fire an auto-advance timer scheduled at `epoch`.
    ///
    /// Rejected as stale if anything changed since the timer was scheduled.
    pub fn auto_advance(&mut self, epoch: u64) -> Result<Transition<Seat>, Rejection> {
        self.require_playing()?;
        if epoch != self.state.epoch() || self.state.pending_die().is_none() {
            return Err(Rejection::StaleTimer);
        }
        self.advance_turn()
    }

    /// Point a seated player at a new transport address.
    ///
    /// Not observable by other participants, so nothing is published and
    /// pending timers stay valid.
    pub fn rebind_transport(
        &mut self,
        player: &PlayerId,
        address: TransportAddress,
    ) -> Result<(), Rejection> {
        let seat = self.state.seat_of(player).ok_or(Rejection::UnknownPlayer)?;
        self.state.players[seat.index()].transport = Some(address);
        Ok(())
    }

    // === Queries ===

    /// Whether `position` accepts `die` under this match's rules.
    #[must_use]
    pub fn is_valid_move(&self, position: PiecePosition, die: DieValue) -> bool {
        self.rules.is_valid_move(position, die)
    }

    /// Whether any piece of the player at `seat` accepts `die`.
    #[must_use]
    pub fn has_valid_moves(&self, seat: Seat, die: DieValue) -> bool {
        self.state
            .player(seat)
            .is_some_and(|p| self.rules.has_valid_moves(&p.pieces, die))
    }

    /// Transport addresses of every seated player.
    pub fn participants(&self) -> impl Iterator<Item = &TransportAddress> {
        self.state.players().iter().filter_map(|p| p.transport.as_ref())
    }

    // === Internals ===

    fn require_playing(&self) -> Result<(), Rejection> {
        match self.state.status() {
            MatchStatus::Playing => Ok(()),
            other => Err(Rejection::WrongStatus(other)),
        }
    }

    fn acting_seat(&self, player: &PlayerId) -> Result<Seat, Rejection> {
        self.require_playing()?;
        let seat = self.state.seat_of(player).ok_or(Rejection::UnknownPlayer)?;
        if seat != self.state.current_turn() {
            return Err(Rejection::WrongTurn);
        }
        Ok(seat)
    }

    fn pass_turn(&mut self) -> Seat {
        let next = self.state.current_turn().next(self.state.player_count());
        self.state.begin_turn(next);
        self.state.touch();
        next
    }

    fn publish(&self) -> Effect {
        Effect::Publish(Arc::new(self.state.snapshot()))
    }
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("state", &self.state)
            .field("max_players", &self.max_players)
            .field("auto_advance_delay", &self.auto_advance_delay)
            .finish_non_exhaustive()
    }
}
