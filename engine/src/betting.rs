//! One street's betting sub-state-machine (spec §4.2): legal actions,
//! min-raise tracking, and round closure.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::seat::{Seat, SeatId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn next(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Street::Preflop => "Preflop",
            Street::Flop => "Flop",
            Street::Turn => "Turn",
            Street::River => "River",
        }
    }
}

/// An engine-validated action, already coerced/clamped into something legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Raise *to* this total per-street commitment (not an increment).
    Raise(u64),
    AllIn,
}

/// What the wire actually sent, before coercion. Amounts may be nonsensical;
/// that is exactly why coercion exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedAction {
    pub kind: RequestedKind,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

/// The label recorded in `player_actions` and the structured log — the kind
/// of action taken, independent of amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionLabel {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl From<Action> for ActionLabel {
    fn from(action: Action) -> Self {
        match action {
            Action::Fold => ActionLabel::Fold,
            Action::Check => ActionLabel::Check,
            Action::Call => ActionLabel::Call,
            Action::Raise(_) => ActionLabel::Raise,
            Action::AllIn => ActionLabel::AllIn,
        }
    }
}

/// What a seat is allowed to do right now, reported to the network arbiter
/// for boundary validation (spec §4.5) and to the wire's GAME_STATE message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LegalActions {
    pub can_fold: bool,
    pub can_check: bool,
    pub can_call: bool,
    pub call_amount: u64,
    pub can_raise: bool,
    pub min_raise_total: u64,
    pub max_raise_total: u64,
}

/// A record of an illegal or out-of-range action being coerced into a legal
/// one. Logged, never silently dropped (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coercion {
    pub seat: SeatId,
    pub requested_amount: i64,
    pub applied: ActionLabel,
    pub reason: String,
}

/// The state of betting on a single street.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingRound {
    pub street: Street,
    pub current_bet: u64,
    pub player_bets: BTreeMap<SeatId, u64>,
    pub player_actions: BTreeMap<SeatId, ActionLabel>,
    pub min_raise: u64,
    pub last_raiser: Option<SeatId>,
    acted: BTreeSet<SeatId>,
    order: Vec<SeatId>,
}

impl BettingRound {
    /// Builds the pre-flop round: blinds already posted into `player_bets`,
    /// `current_bet` is the big blind, `min_raise` is the big blind, and
    /// neither blind poster is marked as having acted — so the big blind
    /// keeps its option even if action never re-opens (spec §4.2).
    pub fn new_preflop(
        order: Vec<SeatId>,
        sb_seat: SeatId,
        sb_amount: u64,
        bb_seat: SeatId,
        bb_amount: u64,
    ) -> Self {
        let mut player_bets = BTreeMap::new();
        player_bets.insert(sb_seat, sb_amount);
        player_bets.insert(bb_seat, bb_amount);
        Self {
            street: Street::Preflop,
            current_bet: bb_amount,
            player_bets,
            player_actions: BTreeMap::new(),
            min_raise: bb_amount,
            last_raiser: None,
            acted: BTreeSet::new(),
            order,
        }
    }

    /// Builds a post-flop round: bets reset to zero, min-raise resets to the
    /// big blind, nobody has acted yet.
    pub fn new_postflop(street: Street, big_blind: u64, order: Vec<SeatId>) -> Self {
        Self {
            street,
            current_bet: 0,
            player_bets: BTreeMap::new(),
            player_actions: BTreeMap::new(),
            min_raise: big_blind,
            last_raiser: None,
            acted: BTreeSet::new(),
            order,
        }
    }

    fn bet_of(&self, seat: SeatId) -> u64 {
        *self.player_bets.get(&seat).unwrap_or(&0)
    }

    /// Seats still owed an action before the round can close (spec's
    /// `waiting_for`, computed rather than stored so it can never drift out
    /// of sync with `current_bet`/`player_bets`).
    pub fn waiting_for(&self, seats: &[Seat]) -> BTreeSet<SeatId> {
        seats
            .iter()
            .filter(|s| s.is_active() && !s.is_all_in())
            .filter(|s| {
                let bet = self.bet_of(s.id);
                !self.acted.contains(&s.id) || bet != self.current_bet
            })
            .map(|s| s.id)
            .collect()
    }

    /// The next seat to act, in this street's turn order, or `None` if the
    /// round is closed.
    pub fn next_to_act(&self, seats: &[Seat]) -> Option<SeatId> {
        let waiting = self.waiting_for(seats);
        self.order.iter().copied().find(|id| waiting.contains(id))
    }

    /// True once no seat is owed an action and either everyone live has
    /// matched `current_bet`, or at most one active seat still has chips.
    pub fn is_closed(&self, seats: &[Seat]) -> bool {
        if !self.waiting_for(seats).is_empty() {
            return false;
        }
        let live_with_chips = seats
            .iter()
            .filter(|s| s.is_active() && s.stack > 0)
            .count();
        live_with_chips <= 1
            || seats
                .iter()
                .filter(|s| s.is_active() && !s.is_all_in())
                .all(|s| self.bet_of(s.id) == self.current_bet)
    }

    pub fn legal_actions(&self, seat: &Seat) -> LegalActions {
        let bet = self.bet_of(seat.id);
        let to_call = self.current_bet.saturating_sub(bet);
        let max_raise_total = bet + seat.stack;
        let min_raise_total = self.current_bet + self.min_raise;
        LegalActions {
            can_fold: true,
            can_check: to_call == 0,
            can_call: to_call > 0 && seat.stack > 0,
            call_amount: to_call.min(seat.stack),
            can_raise: seat.stack > 0 && max_raise_total >= min_raise_total,
            min_raise_total,
            max_raise_total,
        }
    }

    /// Coerces a wire-level requested action into a legal engine `Action`,
    /// per spec §4.2/§4.5's precedence. Returns the coercion record whenever
    /// the requested action was not already exactly legal.
    pub fn coerce(&self, seat: &Seat, requested: RequestedAction) -> (Action, Option<Coercion>) {
        let bet = self.bet_of(seat.id);
        let to_call = self.current_bet.saturating_sub(bet);
        let max_raise_total = bet + seat.stack;

        let record = |applied: Action, reason: &str| {
            (
                applied,
                Some(Coercion {
                    seat: seat.id,
                    requested_amount: requested.amount,
                    applied: applied.into(),
                    reason: reason.to_string(),
                }),
            )
        };

        if seat.stack == 0 {
            return if to_call == 0 {
                if requested.kind == RequestedKind::Check {
                    (Action::Check, None)
                } else {
                    record(Action::Check, "seat has no chips; nothing owed, coerced to check")
                }
            } else {
                record(Action::Fold, "seat has no chips and owes a call; coerced to fold")
            };
        }

        match requested.kind {
            RequestedKind::Fold => (Action::Fold, None),
            RequestedKind::Check => {
                if to_call == 0 {
                    (Action::Check, None)
                } else {
                    record(Action::Fold, "check is illegal while a bet is outstanding")
                }
            }
            RequestedKind::Call => {
                if to_call == 0 {
                    record(Action::Check, "nothing to call; coerced to check")
                } else {
                    (Action::Call, None)
                }
            }
            RequestedKind::AllIn => (Action::AllIn, None),
            RequestedKind::Raise => {
                let amount = requested.amount.max(0) as u64;
                let min_raise_total = self.current_bet + self.min_raise;
                if amount >= max_raise_total {
                    if amount == max_raise_total {
                        (Action::AllIn, None)
                    } else {
                        record(Action::AllIn, "raise exceeds stack; clamped to all-in")
                    }
                } else if amount >= min_raise_total {
                    (Action::Raise(amount), None)
                } else if to_call == 0 {
                    record(Action::Check, "raise below minimum with nothing owed; coerced to check")
                } else {
                    record(Action::Call, "raise below minimum raise; coerced to call")
                }
            }
        }
    }

    /// Applies an already-legal action, mutating the acting seat's stack and
    /// status and this round's bookkeeping.
    pub fn apply(&mut self, seats: &mut [Seat], seat_id: SeatId, action: Action) -> Result<(), EngineError> {
        let seat = seats
            .iter_mut()
            .find(|s| s.id == seat_id)
            .ok_or(EngineError::UnknownSeat(seat_id))?;

        self.player_actions.insert(seat_id, action.into());
        self.acted.insert(seat_id);

        match action {
            Action::Fold => {
                seat.status = crate::seat::SeatStatus::Folded;
            }
            Action::Check => {}
            Action::Call => {
                let bet = *self.player_bets.get(&seat_id).unwrap_or(&0);
                let owed = self.current_bet.saturating_sub(bet);
                let pay = owed.min(seat.stack);
                seat.stack -= pay;
                *self.player_bets.entry(seat_id).or_insert(0) += pay;
                if seat.stack == 0 {
                    seat.status = crate::seat::SeatStatus::AllIn;
                }
            }
            Action::Raise(total) => {
                let bet = *self.player_bets.get(&seat_id).unwrap_or(&0);
                let pay = total - bet;
                seat.stack -= pay;
                self.player_bets.insert(seat_id, total);
                let increment = total - self.current_bet;
                self.current_bet = total;
                self.min_raise = increment;
                self.last_raiser = Some(seat_id);
                if seat.stack == 0 {
                    seat.status = crate::seat::SeatStatus::AllIn;
                }
                for other in seats.iter() {
                    if other.id != seat_id && other.is_active() && !other.is_all_in() {
                        self.acted.remove(&other.id);
                    }
                }
                // recompute happens naturally via waiting_for()'s bet mismatch check
            }
            Action::AllIn => {
                let bet = *self.player_bets.get(&seat_id).unwrap_or(&0);
                let total = bet + seat.stack;
                seat.stack = 0;
                seat.status = crate::seat::SeatStatus::AllIn;
                self.player_bets.insert(seat_id, total);
                if total > self.current_bet {
                    let increment = total - self.current_bet;
                    self.current_bet = total;
                    if increment >= self.min_raise {
                        self.min_raise = increment;
                        self.last_raiser = Some(seat_id);
                        for other in seats.iter() {
                            if other.id != seat_id && other.is_active() && !other.is_all_in() {
                                self.acted.remove(&other.id);
                            }
                        }
                    }
                    // short all-in: min_raise and acted flags untouched, so
                    // waiting_for()'s bet-mismatch branch picks up exactly
                    // the seats still owing the short top-up.
                }
            }
        }
        Ok(())
    }
}
