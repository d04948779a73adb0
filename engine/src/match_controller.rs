//! The multi-hand supervisor (spec §4.4): stack carry-over, dealer-button
//! rotation skipping insolvent seats, the blind schedule, and termination.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::EngineError;
use crate::hand::{clockwise_from, next_seat_after, play_hand, ActionSource};
use crate::log::HandLog;
use crate::seat::{Seat, SeatId};

/// Blinds begin at `base_big_blind` (small blind is always half, per spec
/// §3) and multiply every `interval_hands` hands. Defaults (multiplier 1.0,
/// interval 0) mean constant blinds, matching the original dealer's config.
#[derive(Debug, Clone, Copy)]
pub struct BlindSchedule {
    pub base_big_blind: u64,
    pub multiplier: f64,
    pub interval_hands: u64,
}

impl BlindSchedule {
    pub fn constant(big_blind: u64) -> Self {
        Self { base_big_blind: big_blind, multiplier: 1.0, interval_hands: 0 }
    }

    pub fn blinds_for_hand(&self, hand_index: u64) -> (u64, u64) {
        let big_blind = if self.interval_hands == 0 {
            self.base_big_blind
        } else {
            let periods = hand_index / self.interval_hands;
            (self.base_big_blind as f64 * self.multiplier.powi(periods as i32)).round() as u64
        };
        (big_blind / 2, big_blind)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub ending_stacks: BTreeMap<SeatId, u64>,
    pub cumulative_deltas: BTreeMap<SeatId, i64>,
    pub hands_played: u64,
}

/// Drives a sequence of hands over the same seat roster with stacks that
/// carry over between them. The original dealer's starting-stack default
/// (`DEFAULT_INITIAL_MONEY` = 10,000); spec.md's CLI surface does not expose
/// a flag for it, so it is a constructor parameter here.
pub struct MatchController {
    seats: Vec<Seat>,
    seat_order: Vec<SeatId>,
    button: SeatId,
    hand_index: u64,
    blind_schedule: BlindSchedule,
    hand_cap: Option<u64>,
    cumulative_deltas: BTreeMap<SeatId, i64>,
    finalized_hands: HashSet<u64>,
    terminated: bool,
}

pub const DEFAULT_STARTING_STACK: u64 = 10_000;

impl MatchController {
    pub fn new(seat_ids: &[SeatId], starting_stack: u64, blind_schedule: BlindSchedule, hand_cap: Option<u64>) -> Self {
        let seats = seat_ids.iter().map(|&id| Seat::new(id, starting_stack)).collect();
        Self {
            seats,
            seat_order: seat_ids.to_vec(),
            button: *seat_ids.first().expect("a match needs at least one seat"),
            hand_index: 0,
            blind_schedule,
            hand_cap,
            cumulative_deltas: seat_ids.iter().map(|&id| (id, 0)).collect(),
            finalized_hands: HashSet::new(),
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn hand_index(&self) -> u64 {
        self.hand_index
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    fn able_to_afford(&self, big_blind: u64) -> usize {
        self.seats.iter().filter(|s| s.stack >= big_blind).count()
    }

    /// Advances the button clockwise, skipping any seat that cannot afford
    /// the next hand's big blind (spec §4.4's rotation invariant).
    fn next_button(&self, big_blind: u64) -> SeatId {
        clockwise_from(&self.seat_order, next_seat_after(&self.seat_order, self.button))
            .into_iter()
            .find(|&id| {
                self.seats
                    .iter()
                    .find(|s| s.id == id)
                    .is_some_and(|s| s.stack >= big_blind)
            })
            .unwrap_or(self.button)
    }

    /// Applies one hand's deltas to the match's running totals. Safe to call
    /// more than once for the same `HandLog`: a second call is a no-op,
    /// satisfying spec §4.4's end-of-hand idempotence requirement.
    pub fn finalize_hand(&mut self, log: &HandLog) {
        if !self.finalized_hands.insert(log.hand_index) {
            return;
        }
        for (&id, &delta) in &log.deltas {
            *self.cumulative_deltas.entry(id).or_insert(0) += delta;
        }
    }

    /// Requests the match stop after the current hand (operator-issued
    /// termination, spec §4.4(c)).
    pub fn request_stop(&mut self) {
        self.terminated = true;
    }

    /// Plays the next hand, updates stacks/deltas, rotates the button, and
    /// checks termination conditions. Returns `Err(InsufficientBlinds)`
    /// without touching any state if the match should have already stopped.
    pub fn play_next_hand(&mut self, action_source: &mut dyn ActionSource) -> Result<HandLog, EngineError> {
        let (sb, bb) = self.blind_schedule.blinds_for_hand(self.hand_index);
        if self.able_to_afford(bb) < 2 {
            self.terminated = true;
            return Err(EngineError::InsufficientBlinds);
        }

        let log = play_hand(&mut self.seats, &self.seat_order, self.hand_index, self.button, sb, bb, action_source)?;
        self.finalize_hand(&log);

        if log.fatal.is_some() {
            // A class-4 engine invariant violation (spec §7): the hand is
            // over, but the match does not continue to another one.
            self.terminated = true;
            return Ok(log);
        }

        self.hand_index += 1;
        let (_, next_bb) = self.blind_schedule.blinds_for_hand(self.hand_index);
        self.button = self.next_button(next_bb);

        if let Some(cap) = self.hand_cap {
            if self.hand_index >= cap {
                self.terminated = true;
            }
        }
        if self.able_to_afford(next_bb) < 2 {
            self.terminated = true;
        }

        Ok(log)
    }

    /// Final summary (spec §4.4's termination record): per-seat ending
    /// bankroll and cumulative delta since match start. The deltas always
    /// sum to zero, since each hand's deltas do.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            ending_stacks: self.seats.iter().map(|s| (s.id, s.stack)).collect(),
            cumulative_deltas: self.cumulative_deltas.clone(),
            hands_played: self.hand_index,
        }
    }
}
