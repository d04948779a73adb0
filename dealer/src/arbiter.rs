//! Bridges the synchronous engine to the async network layer (spec §5/§9):
//! runs on its own blocking thread, turns `ActionSource` calls into
//! REQUEST_PLAYER_ACTION broadcasts, and blocks on a channel for the
//! matching PLAYER_ACTION (or a per-turn timeout, which folds/checks).

use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use holdem_engine::{
    ActionRequest, ActionSource, HandSnapshot, HandStartInfo, RequestedAction, RequestedKind,
};

use crate::connection::{InboundEvent, SeatHandle};
use crate::protocol::{
    kind, Envelope, GameEndPayload, GameStartPayload, GameStatePayload, MessagePayload,
    RequestPlayerActionPayload, ShowdownHand, StreetPayload,
};

/// Turns the engine's street enum into the wire's street name.
fn street_name(street: holdem_engine::Street) -> String {
    street.name().to_string()
}

pub struct Arbiter<'a> {
    seats: &'a BTreeMap<holdem_engine::SeatId, SeatHandle>,
    inbound: &'a Receiver<InboundEvent>,
    turn_timeout: Duration,
    disconnected: std::collections::HashSet<holdem_engine::SeatId>,
    last_street: Option<holdem_engine::Street>,
}

impl<'a> Arbiter<'a> {
    pub fn new(
        seats: &'a BTreeMap<holdem_engine::SeatId, SeatHandle>,
        inbound: &'a Receiver<InboundEvent>,
        turn_timeout: Duration,
    ) -> Self {
        Self {
            seats,
            inbound,
            turn_timeout,
            disconnected: std::collections::HashSet::new(),
            last_street: None,
        }
    }

    fn broadcast(&self, envelope: &Envelope) {
        for handle in self.seats.values() {
            let _ = handle.outbound.send(envelope.clone());
        }
    }

    fn send_to(&self, seat: holdem_engine::SeatId, envelope: &Envelope) {
        if let Some(handle) = self.seats.get(&seat) {
            let _ = handle.outbound.send(envelope.clone());
        }
    }

    pub fn announce_street(&self, street: holdem_engine::Street) {
        if let Ok(envelope) = Envelope::new(kind::ROUND_START, &StreetPayload { street: street_name(street) }) {
            self.broadcast(&envelope);
        }
    }

    fn announce_round_end(&self, street: holdem_engine::Street) {
        if let Ok(envelope) = Envelope::new(kind::ROUND_END, &StreetPayload { street: street_name(street) }) {
            self.broadcast(&envelope);
        }
    }

    pub fn announce_message(&self, text: &str) {
        if let Ok(envelope) = Envelope::new(kind::MESSAGE, &MessagePayload { text: text.to_string() }) {
            self.broadcast(&envelope);
        }
    }

    /// Closes out the street that was in progress when the hand ended (a
    /// runout with no further betting never otherwise gets a ROUND_END) and
    /// sends every seat its own GAME_END, each with that seat's own score
    /// alongside the shared `all_scores`/showdown-hands view.
    pub fn announce_hand_end(&mut self, log: &holdem_engine::HandLog) {
        if let Some(street) = self.last_street.take() {
            self.announce_round_end(street);
        }

        let all_scores = log.deltas.clone();
        let hands: Vec<ShowdownHand> = log
            .showdown
            .iter()
            .map(|entry| ShowdownHand { seat: entry.seat, hole: entry.hole, rank: entry.rank.clone() })
            .collect();
        for &seat in self.seats.keys() {
            let player_score = all_scores.get(&seat).copied().unwrap_or(0);
            let payload = GameEndPayload {
                player_score,
                all_scores: all_scores.clone(),
                active_players_hands: hands.clone(),
                diagnostic: log.fatal.clone(),
            };
            if let Ok(envelope) = Envelope::new(kind::GAME_END, &payload) {
                self.send_to(seat, &envelope);
            }
        }
    }

    /// Drains any inbound events that arrived before this seat's turn (late
    /// actions from a seat that already acted, stray noise) so they don't
    /// leak into the next `recv_timeout` call. Disconnects are remembered.
    fn drain_stale(&mut self) {
        while let Ok(event) = self.inbound.try_recv() {
            if let InboundEvent::Disconnected { seat } = event {
                self.disconnected.insert(seat);
            }
        }
    }
}

impl<'a> ActionSource for Arbiter<'a> {
    fn request_action(&mut self, request: ActionRequest) -> RequestedAction {
        self.drain_stale();

        let fallback = if request.legal.can_check {
            RequestedAction { kind: RequestedKind::Check, amount: 0 }
        } else {
            RequestedAction { kind: RequestedKind::Fold, amount: 0 }
        };

        if self.disconnected.contains(&request.seat) {
            return fallback;
        }

        let payload = RequestPlayerActionPayload {
            seat: request.seat,
            ms_remaining: self.turn_timeout.as_millis() as u64,
        };
        let Ok(envelope) = Envelope::new(kind::REQUEST_PLAYER_ACTION, &payload) else {
            return fallback;
        };
        self.send_to(request.seat, &envelope);

        let deadline = std::time::Instant::now() + self.turn_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                tracing::info!(seat = request.seat, "turn timed out");
                return fallback;
            }
            match self.inbound.recv_timeout(remaining) {
                Ok(InboundEvent::PlayerAction { seat, payload }) if seat == request.seat => {
                    return match payload.action.as_str() {
                        "Fold" => RequestedAction { kind: RequestedKind::Fold, amount: 0 },
                        "Check" => RequestedAction { kind: RequestedKind::Check, amount: 0 },
                        "Call" => RequestedAction { kind: RequestedKind::Call, amount: 0 },
                        "Raise" => RequestedAction { kind: RequestedKind::Raise, amount: payload.amount },
                        "All In" => RequestedAction { kind: RequestedKind::AllIn, amount: 0 },
                        other => {
                            tracing::warn!(seat, action = other, "unrecognized action kind; treating as fold/check");
                            fallback
                        }
                    };
                }
                Ok(InboundEvent::PlayerAction { seat, .. }) => {
                    tracing::debug!(seat, expected = request.seat, "discarding out-of-turn action");
                    continue;
                }
                Ok(InboundEvent::Disconnected { seat }) => {
                    self.disconnected.insert(seat);
                    if seat == request.seat {
                        tracing::info!(seat, "seat disconnected on its turn");
                        return fallback;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::info!(seat = request.seat, "turn timed out");
                    return fallback;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return fallback;
                }
            }
        }
    }

    fn notify_hand_start(&mut self, info: &HandStartInfo<'_>) {
        self.last_street = None;
        for &seat in info.seats {
            let Some(&hole) = info.hole_cards.get(&seat) else {
                continue;
            };
            let payload = GameStartPayload {
                seat,
                hole,
                big_blind: info.big_blind_amount,
                small_blind_seat: info.small_blind_seat,
                big_blind_seat: info.big_blind_seat,
                seats: info.seats.to_vec(),
            };
            if let Ok(envelope) = Envelope::new(kind::GAME_START, &payload) {
                self.send_to(seat, &envelope);
            }
        }
    }

    fn notify_state(&mut self, snapshot: &HandSnapshot<'_>) {
        if self.last_street != Some(snapshot.street) {
            if let Some(previous) = self.last_street {
                self.announce_round_end(previous);
            }
            self.announce_street(snapshot.street);
            self.last_street = Some(snapshot.street);
        }

        let pot_total: u64 = snapshot.pots.iter().map(|p| p.amount).sum();
        let max_raise_total = snapshot
            .legal_for_to_act
            .as_ref()
            .map(|legal| legal.max_raise_total)
            .unwrap_or(0);
        let player_actions = snapshot
            .player_actions
            .iter()
            .map(|(&seat, label)| (seat, format!("{label:?}")))
            .collect();
        let payload = GameStatePayload {
            street: street_name(snapshot.street),
            community: snapshot.community.to_vec(),
            pot: pot_total,
            current_bet: snapshot.current_bet,
            min_raise: snapshot.min_raise,
            max_raise: max_raise_total,
            player_bets: snapshot.player_bets.clone(),
            player_actions,
            side_pots: snapshot.pots.clone(),
            stacks: snapshot.stacks.clone(),
            to_act: snapshot.to_act,
        };
        if let Ok(envelope) = Envelope::new(kind::GAME_STATE, &payload) {
            self.broadcast(&envelope);
        }
    }
}
