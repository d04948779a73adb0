//! The structured per-hand log (spec §4.3/§6): one JSON record per hand,
//! written by the match controller to `game_log_<hand_index>.json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::betting::{ActionLabel, Coercion, Street};
use crate::card::Card;
use crate::eval::HandRank;
use crate::seat::SeatId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub street: Street,
    pub seat: SeatId,
    pub action: ActionLabel,
    /// This seat's total chips committed on the street after this action.
    pub committed_total: u64,
    pub coercion: Option<Coercion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowdownEntry {
    pub seat: SeatId,
    pub hole: (Card, Card),
    pub rank: HandRank,
}

/// An ordered record of one complete hand, or of a hand aborted by a fatal
/// engine invariant violation (spec §4.3's "Structured log").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandLog {
    pub hand_index: u64,
    /// Wall-clock time the log was built. Deliberately outside the scope of
    /// spec §8's "byte-identical across runs" determinism law: every other
    /// field is reproducible from a fixed deck seed and a fixed action
    /// sequence, but this one never is, by design.
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    pub seats: Vec<SeatId>,
    pub starting_stacks: BTreeMap<SeatId, u64>,
    pub button: SeatId,
    pub small_blind_seat: SeatId,
    pub big_blind_seat: SeatId,
    pub small_blind_amount: u64,
    pub big_blind_amount: u64,
    pub hole_cards: BTreeMap<SeatId, (Card, Card)>,
    pub actions: Vec<ActionRecord>,
    pub community_cards: Vec<Card>,
    pub pots: Vec<crate::pot::Pot>,
    pub showdown: Vec<ShowdownEntry>,
    pub uncontested_winner: Option<SeatId>,
    pub deltas: BTreeMap<SeatId, i64>,
    pub ending_stacks: BTreeMap<SeatId, u64>,
    /// Set only when a class-4 engine invariant violation aborted this hand
    /// (spec §7). The match controller terminates the match when this is set.
    pub fatal: Option<String>,
}
