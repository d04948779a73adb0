//! The wire protocol (spec §4.5/§6): a JSON envelope with an integer
//! message kind and a kind-specific payload, framed one object per line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use holdem_engine::{Card, HandRank, Pot, SeatId};

/// Message kind codes, matching spec §4.5's table exactly. `Disconnect` (1)
/// and `TimeStamp` (8) are reserved discriminants carried from the wire
/// protocol this was distilled from; nothing in this dealer emits them, but
/// keeping the numbering gap-free guards against future wire drift.
pub mod kind {
    pub const CONNECT: u8 = 0;
    pub const DISCONNECT: u8 = 1;
    pub const GAME_START: u8 = 2;
    pub const ROUND_START: u8 = 3;
    pub const REQUEST_PLAYER_ACTION: u8 = 4;
    pub const PLAYER_ACTION: u8 = 5;
    pub const ROUND_END: u8 = 6;
    pub const GAME_END: u8 = 7;
    pub const TIME_STAMP: u8 = 8;
    pub const GAME_STATE: u8 = 9;
    pub const MESSAGE: u8 = 10;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: u8,
    pub message: serde_json::Value,
}

impl Envelope {
    pub fn new<T: Serialize>(kind: u8, payload: &T) -> serde_json::Result<Self> {
        Ok(Self { kind, message: serde_json::to_value(payload)? })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectPayload {
    pub seat: SeatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartPayload {
    pub seat: SeatId,
    pub hole: (Card, Card),
    pub big_blind: u64,
    pub small_blind_seat: SeatId,
    pub big_blind_seat: SeatId,
    pub seats: Vec<SeatId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreetPayload {
    pub street: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPlayerActionPayload {
    pub seat: SeatId,
    pub ms_remaining: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerActionPayload {
    pub player_id: SeatId,
    /// One of `Fold`, `Check`, `Call`, `Raise`, `All In` (spec §4.5's table).
    pub action: String,
    /// The target total for `Raise`; ignored for every other action kind.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEndPayload {
    pub player_score: i64,
    pub all_scores: BTreeMap<SeatId, i64>,
    pub active_players_hands: Vec<ShowdownHand>,
    /// Set only when this hand was aborted by a class-4 engine invariant
    /// violation (spec §7); every seat's final GAME_END carries the same
    /// message, and the match does not continue past it.
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowdownHand {
    pub seat: SeatId,
    pub hole: (Card, Card),
    pub rank: HandRank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatePayload {
    pub street: String,
    pub community: Vec<Card>,
    pub pot: u64,
    pub current_bet: u64,
    pub min_raise: u64,
    pub max_raise: u64,
    pub player_bets: BTreeMap<SeatId, u64>,
    pub player_actions: BTreeMap<SeatId, String>,
    pub side_pots: Vec<Pot>,
    pub stacks: BTreeMap<SeatId, u64>,
    pub to_act: Option<SeatId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub text: String,
}

/// Class-1/2 wire-level faults (spec §7): malformed JSON, an envelope kind
/// the receiving side never expects, or a payload that doesn't match its
/// kind's shape. Always recovered locally — logged and the connection
/// treated as if it had sent nothing this turn, never propagated as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("unexpected message kind {0}")]
    UnexpectedKind(u8),
}

/// Parses a line as an envelope of the expected kind and decodes its
/// payload, or returns the specific `ProtocolError` that made it unusable.
pub fn decode<T: for<'de> Deserialize<'de>>(line: &str, expected_kind: u8) -> Result<T, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    if envelope.kind != expected_kind {
        return Err(ProtocolError::UnexpectedKind(envelope.kind));
    }
    Ok(serde_json::from_value(envelope.message)?)
}
