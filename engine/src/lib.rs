//! No-Limit Hold'em game engine: card representation and hand evaluation,
//! the betting-round sub-state-machine, one full hand from deal to
//! showdown, and the multi-hand match controller. Synchronous and
//! deterministic throughout — no I/O, no async; a caller drives the engine
//! through the `ActionSource` trait at each turn.

pub mod betting;
pub mod card;
pub mod error;
pub mod eval;
pub mod hand;
pub mod log;
pub mod match_controller;
pub mod pot;
pub mod seat;

pub use betting::{Action, ActionLabel, BettingRound, Coercion, LegalActions, RequestedAction, RequestedKind, Street};
pub use card::{Card, Deck, Rank, Suit};
pub use error::EngineError;
pub use eval::{evaluate_best, evaluate_hand, HandCategory, HandRank};
pub use hand::{play_hand, ActionRequest, ActionSource, HandSnapshot, HandStartInfo};
pub use log::HandLog;
pub use match_controller::{BlindSchedule, MatchController, MatchSummary, DEFAULT_STARTING_STACK};
pub use pot::{award_pots, build_pots, Pot};
pub use seat::{Seat, SeatId, SeatStatus};
