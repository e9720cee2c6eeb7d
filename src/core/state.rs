//! Match state: the aggregate root mutated by the engine.
//!
//! ## MatchState
//!
//! Authoritative, in-memory state of one match:
//! - Seated players (join order = turn order = color order)
//! - Whose turn it is and which half of the turn we are in
//! - Winners in finishing order
//! - Lifecycle status
//! - Action history
//!
//! ## MatchSnapshot
//!
//! The full, serializable view broadcast to participants after every
//! mutation. Not a diff.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::action::{ActionRecord, Command};
use super::ids::{MatchId, Stake};
use super::player::{Player, PlayerId, Seat};
use super::position::DieValue;

/// Lifecycle of a match. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Playing,
    Completed,
}

impl MatchStatus {
    /// Check whether moving to `next` respects `Waiting -> Playing -> Completed`.
    #[must_use]
    pub fn can_become(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Waiting, MatchStatus::Playing)
                | (MatchStatus::Playing, MatchStatus::Completed)
        )
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Playing => "playing",
            MatchStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Which half of a turn the current player is in.
///
/// Rolling permitted and a pending die value are mutually exclusive by
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// No turn in progress (waiting for players, or completed).
    Idle,
    /// The current player may roll.
    AwaitingRoll,
    /// The current player rolled and must move (or wait for the turn to pass).
    AwaitingMove(DieValue),
}

/// Authoritative state of one match.
#[derive(Clone, Debug)]
pub struct MatchState {
    pub(crate) id: MatchId,
    pub(crate) stake: Stake,
    pub(crate) players: Vec<Player>,
    pub(crate) current_turn: Seat,
    pub(crate) phase: TurnPhase,
    pub(crate) winners: Vec<PlayerId>,
    pub(crate) status: MatchStatus,
    /// Bumped on every mutation; stale timers compare against it.
    pub(crate) epoch: u64,
    pub(crate) turn_number: u32,
    pub(crate) action_sequence: u32,
    pub(crate) history: Vector<ActionRecord>,
}

impl MatchState {
    /// Create an empty match waiting for players.
    #[must_use]
    pub fn new(id: MatchId, stake: Stake) -> Self {
        Self {
            id,
            stake,
            players: Vec::new(),
            current_turn: Seat::default(),
            phase: TurnPhase::Idle,
            winners: Vec::new(),
            status: MatchStatus::Waiting,
            epoch: 0,
            turn_number: 0,
            action_sequence: 0,
            history: Vector::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &MatchId {
        &self.id
    }

    #[must_use]
    pub fn stake(&self) -> Stake {
        self.stake
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    #[must_use]
    pub fn current_turn(&self) -> Seat {
        self.current_turn
    }

    /// The player whose turn it is, if the match is underway.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        match self.status {
            MatchStatus::Playing => self.player(self.current_turn),
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn can_roll(&self) -> bool {
        self.phase == TurnPhase::AwaitingRoll
    }

    #[must_use]
    pub fn pending_die(&self) -> Option<DieValue> {
        match self.phase {
            TurnPhase::AwaitingMove(die) => Some(die),
            _ => None,
        }
    }

    #[must_use]
    pub fn winners(&self) -> &[PlayerId] {
        &self.winners
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    #[must_use]
    pub fn history(&self) -> &Vector<ActionRecord> {
        &self.history
    }

    /// Seat occupied by `player`, if seated.
    #[must_use]
    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| &p.id == player)
            .map(|i| Seat::new(i as u8))
    }

    #[must_use]
    pub fn has_open_seat(&self, max_players: usize) -> bool {
        self.players.len() < max_players
    }

    // === Mutation helpers (engine only) ===

    pub(crate) fn touch(&mut self) {
        self.epoch += 1;
    }

    pub(crate) fn set_status(&mut self, next: MatchStatus) {
        debug_assert!(self.status.can_become(next), "{} -> {}", self.status, next);
        self.status = next;
    }

    /// Start a new turn for `seat`.
    pub(crate) fn begin_turn(&mut self, seat: Seat) {
        self.current_turn = seat;
        self.phase = TurnPhase::AwaitingRoll;
        self.turn_number += 1;
        self.action_sequence = 0;
    }

    pub(crate) fn record(&mut self, seat: Seat, command: Command, die: DieValue) {
        let Some(player) = self.player(seat) else {
            return;
        };
        let record = ActionRecord::new(
            player.id.clone(),
            seat,
            command,
            die,
            self.turn_number,
            self.action_sequence,
        );
        self.action_sequence += 1;
        self.history.push_back(record);
    }

    /// Build the broadcast view.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id.clone(),
            stake: self.stake,
            players: self.players.clone(),
            current_turn: self.current_turn,
            dice_value: self.pending_die(),
            can_roll: self.can_roll(),
            winners: self.winners.clone(),
            status: self.status,
            epoch: self.epoch,
            turn_number: self.turn_number,
            history: self.history.clone(),
        }
    }

    /// Check every structural invariant of a match.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self, max_players: usize) -> Result<(), String> {
        if self.players.len() > max_players {
            return Err(format!("{} players seated", self.players.len()));
        }
        match self.status {
            MatchStatus::Waiting => {
                if self.phase != TurnPhase::Idle {
                    return Err("turn in progress while waiting".into());
                }
            }
            MatchStatus::Playing => {
                if self.players.len() != max_players {
                    return Err("playing without a full table".into());
                }
                if self.current_turn.index() >= self.players.len() {
                    return Err(format!("current turn {} out of range", self.current_turn));
                }
                if self.phase == TurnPhase::Idle {
                    return Err("no turn in progress while playing".into());
                }
            }
            MatchStatus::Completed => {
                if self.winners.is_empty() {
                    return Err("completed without a winner".into());
                }
            }
        }
        for (i, winner) in self.winners.iter().enumerate() {
            if self.seat_of(winner).is_none() {
                return Err(format!("winner {winner} is not seated"));
            }
            if self.winners[..i].contains(winner) {
                return Err(format!("winner {winner} listed twice"));
            }
        }
        for player in &self.players {
            if let Some(bad) = player.pieces.iter().find(|p| !p.is_well_formed()) {
                return Err(format!("{} has malformed piece {:?}", player.id, bad));
            }
        }
        Ok(())
    }
}

/// Full match state as sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub stake: Stake,
    pub players: Vec<Player>,
    pub current_turn: Seat,
    pub dice_value: Option<DieValue>,
    pub can_roll: bool,
    pub winners: Vec<PlayerId>,
    pub status: MatchStatus,
    pub epoch: u64,
    pub turn_number: u32,
    /// Kept in memory for replay; not sent, so frames stay constant-size.
    #[serde(skip)]
    pub history: Vector<ActionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::player::{Color, PlayerInfo};

    fn seated(state: &mut MatchState, id: &str) {
        let seat = Seat::new(state.players.len() as u8);
        let color = Color::for_seat(seat).unwrap();
        state.players.push(Player::seated(PlayerInfo::new(id, id), color));
    }

    #[test]
    fn test_new_match_is_waiting() {
        let state = MatchState::new(MatchId::new("m1"), Stake::new(10));

        assert_eq!(state.status(), MatchStatus::Waiting);
        assert_eq!(state.player_count(), 0);
        assert!(!state.can_roll());
        assert_eq!(state.pending_die(), None);
        assert!(state.current_player().is_none());
        assert!(state.check_invariants(2).is_ok());
    }

    #[test]
    fn test_status_monotonic() {
        assert!(MatchStatus::Waiting.can_become(MatchStatus::Playing));
        assert!(MatchStatus::Playing.can_become(MatchStatus::Completed));
        assert!(!MatchStatus::Waiting.can_become(MatchStatus::Completed));
        assert!(!MatchStatus::Completed.can_become(MatchStatus::Playing));
        assert!(!MatchStatus::Playing.can_become(MatchStatus::Waiting));
    }

    #[test]
    fn test_phase_exclusivity() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        state.phase = TurnPhase::AwaitingRoll;
        assert!(state.can_roll());
        assert_eq!(state.pending_die(), None);

        state.phase = TurnPhase::AwaitingMove(DieValue::SIX);
        assert!(!state.can_roll());
        assert_eq!(state.pending_die(), Some(DieValue::SIX));
    }

    #[test]
    fn test_seat_of() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        seated(&mut state, "b");

        assert_eq!(state.seat_of(&PlayerId::new("a")), Some(Seat::new(0)));
        assert_eq!(state.seat_of(&PlayerId::new("b")), Some(Seat::new(1)));
        assert_eq!(state.seat_of(&PlayerId::new("c")), None);
    }

    #[test]
    fn test_begin_turn_resets_sequence() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        state.begin_turn(Seat::new(0));
        state.record(Seat::new(0), Command::Roll, DieValue::SIX);
        assert_eq!(state.action_sequence, 1);

        state.begin_turn(Seat::new(0));
        assert_eq!(state.turn_number, 2);
        assert_eq!(state.action_sequence, 0);
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_invariants_catch_playing_without_table() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        state.status = MatchStatus::Playing;
        state.phase = TurnPhase::AwaitingRoll;

        assert!(state.check_invariants(2).is_err());
    }

    #[test]
    fn test_invariants_catch_duplicate_winner() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        seated(&mut state, "b");
        state.status = MatchStatus::Completed;
        state.winners = vec![PlayerId::new("a"), PlayerId::new("a")];

        assert!(state.check_invariants(2).is_err());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        seated(&mut state, "b");
        state.status = MatchStatus::Playing;
        state.phase = TurnPhase::AwaitingMove(DieValue::new(3).unwrap());

        let json = serde_json::to_value(state.snapshot()).unwrap();

        assert_eq!(json["matchId"], "m1");
        assert_eq!(json["status"], "playing");
        assert_eq!(json["diceValue"], 3);
        assert_eq!(json["canRoll"], false);
        assert_eq!(json["currentTurn"], 0);
        assert_eq!(json["players"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_frame_omits_history() {
        let mut state = MatchState::new(MatchId::new("m1"), Stake::new(10));
        seated(&mut state, "a");
        seated(&mut state, "b");
        state.status = MatchStatus::Playing;
        state.begin_turn(Seat::new(0));
        for _ in 0..10 {
            state.record(Seat::new(0), Command::Roll, DieValue::new(2).unwrap());
        }

        let snapshot = state.snapshot();
        assert_eq!(snapshot.history.len(), 10);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("history").is_none());

        let decoded: MatchSnapshot = serde_json::from_value(json).unwrap();
        assert!(decoded.history.is_empty());
        assert_eq!(decoded.epoch, snapshot.epoch);
    }
}
