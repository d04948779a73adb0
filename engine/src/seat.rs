use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A stable integer identifier for a seat at the table. Seats persist across
/// hands within a match; this id is how the log and the wire protocol refer
/// to a player rather than by pointer (spec §9's "arena-style ownership").
pub type SeatId = usize;

/// A seat's lifecycle within the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatStatus {
    Active,
    Folded,
    AllIn,
}

/// One player's seat. `starting_stack` is fixed at the start of the hand;
/// `stack` is what remains as chips move into the pot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub starting_stack: u64,
    pub stack: u64,
    pub hole: Option<(Card, Card)>,
    pub status: SeatStatus,
    pub disconnected: bool,
}

impl Seat {
    pub fn new(id: SeatId, stack: u64) -> Self {
        Self {
            id,
            starting_stack: stack,
            stack,
            hole: None,
            status: SeatStatus::Active,
            disconnected: false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SeatStatus::Active)
    }

    pub fn is_folded(&self) -> bool {
        matches!(self.status, SeatStatus::Folded)
    }

    pub fn is_all_in(&self) -> bool {
        matches!(self.status, SeatStatus::AllIn)
    }

    /// Still in the hand (not folded), whether or not still able to act.
    pub fn is_live(&self) -> bool {
        !self.is_folded()
    }

    pub fn reset_for_new_hand(&mut self, stack: u64) {
        self.starting_stack = stack;
        self.stack = stack;
        self.hole = None;
        self.status = SeatStatus::Active;
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.stack >= amount
    }
}
