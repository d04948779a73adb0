use thiserror::Error;

use crate::seat::SeatId;

/// Class-4 failures from spec §7: engine invariant violations. These abort
/// the current hand and propagate to the match controller, which terminates
/// the match. Never raised for agent misbehavior — that is coerced, not
/// errored (see `betting::Coercion`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("malformed card text: {0}")]
    InvalidCardText(String),

    #[error("seat {0:?} has no hole cards but was asked to act or show down")]
    MissingHoleCards(SeatId),

    #[error("deck underflow: tried to deal {requested} cards with {available} remaining")]
    DeckUnderflow { requested: usize, available: usize },

    #[error("pot accounting drifted: committed {committed} but distributed {distributed}")]
    PotDrift { committed: u64, distributed: u64 },

    #[error("fewer than two seats can afford their blinds; hand is void")]
    InsufficientBlinds,

    #[error("seat {0:?} is not recognized at this table")]
    UnknownSeat(SeatId),

    #[error("action requested from seat {0:?}, which is not waiting to act")]
    SeatNotWaiting(SeatId),
}

impl EngineError {
    /// `InsufficientBlinds` is the normal end-of-match condition (spec
    /// §4.4b): fewer than two seats can afford the next hand, so the match
    /// stops with exit code 0. Every other variant is a class-4 invariant
    /// violation (spec §7): it must abort the hand, terminate the match, and
    /// surface as a non-zero exit code.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::InsufficientBlinds)
    }
}
