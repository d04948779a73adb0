//! One complete hand from deal to showdown (spec §4.3): blinds, four
//! streets, side-pot construction, scoring, and the structured log.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::betting::{ActionLabel, BettingRound, LegalActions, RequestedAction, Street};
use crate::card::{Card, Deck};
use crate::error::EngineError;
use crate::eval::{evaluate_hand, HandCategory, HandRank};
use crate::log::{ActionRecord, HandLog, ShowdownEntry};
use crate::pot::{award_pots, build_pots, Pot};
use crate::seat::{Seat, SeatId, SeatStatus};

/// What the engine asks of the outside world at the single suspension point
/// per turn (spec §5's `await_action`), plus a hook to publish state after
/// every action for the GAME_STATE broadcast.
pub trait ActionSource {
    fn request_action(&mut self, request: ActionRequest) -> RequestedAction;
    fn notify_state(&mut self, snapshot: &HandSnapshot<'_>);

    /// Called once per hand, after dealing and blinds but before any action
    /// is requested, so a network arbiter can privately tell each seat its
    /// hole cards and the hand's blind assignment (spec §4.5's GAME_START).
    fn notify_hand_start(&mut self, _info: &HandStartInfo<'_>) {}
}

pub struct HandStartInfo<'a> {
    pub hand_index: u64,
    pub seats: &'a [SeatId],
    pub button: SeatId,
    pub small_blind_seat: SeatId,
    pub big_blind_seat: SeatId,
    pub small_blind_amount: u64,
    pub big_blind_amount: u64,
    pub hole_cards: &'a BTreeMap<SeatId, (Card, Card)>,
}

pub struct ActionRequest {
    pub seat: SeatId,
    pub street: Street,
    pub legal: LegalActions,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandSnapshot<'a> {
    pub street: Street,
    pub community: &'a [Card],
    pub pots: Vec<Pot>,
    pub current_bet: u64,
    pub min_raise: u64,
    pub player_bets: &'a BTreeMap<SeatId, u64>,
    pub player_actions: &'a BTreeMap<SeatId, ActionLabel>,
    pub stacks: BTreeMap<SeatId, u64>,
    pub to_act: Option<SeatId>,
    pub legal_for_to_act: Option<LegalActions>,
}

pub(crate) fn next_seat_after(seat_order: &[SeatId], id: SeatId) -> SeatId {
    let pos = seat_order.iter().position(|&x| x == id).unwrap_or(0);
    seat_order[(pos + 1) % seat_order.len()]
}

pub(crate) fn clockwise_from(seat_order: &[SeatId], start: SeatId) -> Vec<SeatId> {
    let pos = seat_order.iter().position(|&x| x == start).unwrap_or(0);
    seat_order.iter().cycle().skip(pos).take(seat_order.len()).copied().collect()
}

fn live_count(seats: &[Seat]) -> usize {
    seats.iter().filter(|s| s.is_live()).count()
}

fn combined_committed(committed_so_far: &BTreeMap<SeatId, u64>, round: &BettingRound) -> BTreeMap<SeatId, u64> {
    let mut combined = committed_so_far.clone();
    for (&id, &bet) in &round.player_bets {
        *combined.entry(id).or_insert(0) += bet;
    }
    combined
}

/// Picks the small blind and big blind for this hand: the first two seats
/// clockwise from the button that can afford their respective blind (spec
/// §4.3's blind-assignment invariant). Returns `None` if fewer than two
/// seats qualify, which voids the hand.
fn assign_blinds(seats: &[Seat], seat_order: &[SeatId], button: SeatId, sb_amount: u64, bb_amount: u64) -> Option<(SeatId, SeatId)> {
    // Starts at the seat right after the button and wraps all the way
    // around so the button itself is the last (and, heads-up, only other)
    // candidate — the button can become BB (or even SB) if nobody closer
    // can afford the blind.
    let candidates: Vec<SeatId> = clockwise_from(seat_order, next_seat_after(seat_order, button))
        .into_iter()
        .filter(|id| seats.iter().find(|s| s.id == *id).is_some_and(|s| s.stack > 0))
        .collect();

    let seat_by_id = |id: SeatId| seats.iter().find(|s| s.id == id).expect("candidate ids come from seats");

    let sb = candidates.iter().copied().find(|&id| seat_by_id(id).can_afford(sb_amount))?;
    let sb_pos = candidates.iter().position(|&id| id == sb)?;
    let bb = candidates
        .iter()
        .cycle()
        .skip(sb_pos + 1)
        .take(candidates.len())
        .copied()
        .find(|&id| id != sb && seat_by_id(id).can_afford(bb_amount))?;
    Some((sb, bb))
}

/// Builds a best-effort log for a hand aborted by a class-4 engine invariant
/// violation (spec §7): whatever state had already been produced when the
/// fault was hit, stamped with a diagnostic instead of silently discarding
/// the hand. `ending_stacks`/`deltas` reflect stacks as they stood at the
/// moment of failure, not a fully settled hand.
fn diagnostic_log(
    hand_index: u64,
    starting_stacks: &BTreeMap<SeatId, u64>,
    seats: &[Seat],
    button: SeatId,
    small_blind_seat: SeatId,
    big_blind_seat: SeatId,
    small_blind_amount: u64,
    big_blind_amount: u64,
    hole_cards: BTreeMap<SeatId, (Card, Card)>,
    actions: Vec<ActionRecord>,
    community_cards: Vec<Card>,
    pots: Vec<Pot>,
    showdown: Vec<ShowdownEntry>,
    error: &EngineError,
) -> HandLog {
    let ending_stacks: BTreeMap<SeatId, u64> = seats.iter().map(|s| (s.id, s.stack)).collect();
    let deltas = starting_stacks
        .iter()
        .map(|(&id, &start)| {
            let end = ending_stacks.get(&id).copied().unwrap_or(start);
            (id, end as i64 - start as i64)
        })
        .collect();
    HandLog {
        hand_index,
        recorded_at: chrono::Utc::now(),
        seats: seats.iter().map(|s| s.id).collect(),
        starting_stacks: starting_stacks.clone(),
        button,
        small_blind_seat,
        big_blind_seat,
        small_blind_amount,
        big_blind_amount,
        hole_cards,
        actions,
        community_cards,
        pots,
        showdown,
        uncontested_winner: None,
        deltas,
        ending_stacks,
        fatal: Some(error.to_string()),
    }
}

fn notify(
    round: &BettingRound,
    seats: &[Seat],
    community: &[Card],
    committed_so_far: &BTreeMap<SeatId, u64>,
    action_source: &mut dyn ActionSource,
) {
    let combined = combined_committed(committed_so_far, round);
    let pots = build_pots(seats, &combined).unwrap_or_default();
    let to_act = round.next_to_act(seats);
    let legal_for_to_act = to_act
        .and_then(|id| seats.iter().find(|s| s.id == id))
        .map(|s| round.legal_actions(s));
    let stacks = seats.iter().map(|s| (s.id, s.stack)).collect();
    let snapshot = HandSnapshot {
        street: round.street,
        community,
        pots,
        current_bet: round.current_bet,
        min_raise: round.min_raise,
        player_bets: &round.player_bets,
        player_actions: &round.player_actions,
        stacks,
        to_act,
        legal_for_to_act,
    };
    action_source.notify_state(&snapshot);
}

fn run_street(
    round: &mut BettingRound,
    seats: &mut [Seat],
    community: &[Card],
    committed_so_far: &BTreeMap<SeatId, u64>,
    actions_log: &mut Vec<ActionRecord>,
    action_source: &mut dyn ActionSource,
) -> Result<(), EngineError> {
    while let Some(seat_id) = round.next_to_act(seats) {
        let seat = seats
            .iter()
            .find(|s| s.id == seat_id)
            .cloned()
            .ok_or(EngineError::UnknownSeat(seat_id))?;
        let legal = round.legal_actions(&seat);
        let requested = action_source.request_action(ActionRequest {
            seat: seat_id,
            street: round.street,
            legal,
        });
        let (action, coercion) = round.coerce(&seat, requested);
        round.apply(seats, seat_id, action)?;

        let committed_total = *round.player_bets.get(&seat_id).unwrap_or(&0);
        actions_log.push(ActionRecord {
            street: round.street,
            seat: seat_id,
            action: action.into(),
            committed_total,
            coercion,
        });

        notify(round, seats, community, committed_so_far, action_source);
    }
    Ok(())
}

/// Plays one hand to completion, mutating `seats`' stacks/status/hole cards
/// in place and returning the structured log. `seat_order` is the table's
/// stable clockwise seating, including seats currently sitting out.
pub fn play_hand(
    seats: &mut [Seat],
    seat_order: &[SeatId],
    hand_index: u64,
    button: SeatId,
    sb_amount: u64,
    bb_amount: u64,
    action_source: &mut dyn ActionSource,
) -> Result<HandLog, EngineError> {
    let starting_stacks: BTreeMap<SeatId, u64> = seats.iter().map(|s| (s.id, s.stack)).collect();

    for seat in seats.iter_mut() {
        seat.hole = None;
        seat.status = if seat.stack > 0 { SeatStatus::Active } else { SeatStatus::Folded };
    }

    let (sb_seat, bb_seat) = assign_blinds(seats, seat_order, button, sb_amount, bb_amount)
        .ok_or(EngineError::InsufficientBlinds)?;

    let dealt_in: Vec<SeatId> = clockwise_from(seat_order, button)
        .into_iter()
        .filter(|id| seats.iter().find(|s| s.id == *id).is_some_and(|s| s.stack > 0))
        .collect();
    // (clockwise_from starts at the button itself, so a button with chips
    // is dealt in like any other seat.)

    let mut deck = Deck::new_shuffled();
    for &id in &dealt_in {
        let c1 = match deck.deal() {
            Some(card) => card,
            None => {
                let error = EngineError::DeckUnderflow { requested: 2, available: deck.len() };
                let hole_cards: BTreeMap<SeatId, (Card, Card)> =
                    seats.iter().filter_map(|s| s.hole.map(|h| (s.id, h))).collect();
                return Ok(diagnostic_log(
                    hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
                    Vec::new(), Vec::new(), Vec::new(), Vec::new(), &error,
                ));
            }
        };
        let c2 = match deck.deal() {
            Some(card) => card,
            None => {
                let error = EngineError::DeckUnderflow { requested: 1, available: deck.len() };
                let hole_cards: BTreeMap<SeatId, (Card, Card)> =
                    seats.iter().filter_map(|s| s.hole.map(|h| (s.id, h))).collect();
                return Ok(diagnostic_log(
                    hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
                    Vec::new(), Vec::new(), Vec::new(), Vec::new(), &error,
                ));
            }
        };
        let seat = seats.iter_mut().find(|s| s.id == id).expect("dealt_in ids come from seats");
        seat.hole = Some((c1, c2));
    }

    {
        let sb = seats.iter_mut().find(|s| s.id == sb_seat).expect("assign_blinds returned a real seat");
        sb.stack -= sb_amount;
        if sb.stack == 0 {
            sb.status = SeatStatus::AllIn;
        }
    }
    {
        let bb = seats.iter_mut().find(|s| s.id == bb_seat).expect("assign_blinds returned a real seat");
        bb.stack -= bb_amount;
        if bb.stack == 0 {
            bb.status = SeatStatus::AllIn;
        }
    }

    let mut community: Vec<Card> = Vec::new();
    let mut total_committed: BTreeMap<SeatId, u64> = BTreeMap::new();
    let mut actions_log: Vec<ActionRecord> = Vec::new();

    let hole_cards: BTreeMap<SeatId, (Card, Card)> =
        seats.iter().filter_map(|s| s.hole.map(|h| (s.id, h))).collect();
    action_source.notify_hand_start(&HandStartInfo {
        hand_index,
        seats: seat_order,
        button,
        small_blind_seat: sb_seat,
        big_blind_seat: bb_seat,
        small_blind_amount: sb_amount,
        big_blind_amount: bb_amount,
        hole_cards: &hole_cards,
    });

    let preflop_order = clockwise_from(seat_order, next_seat_after(seat_order, bb_seat));
    let mut round = BettingRound::new_preflop(preflop_order, sb_seat, sb_amount, bb_seat, bb_amount);
    if let Err(error) = run_street(&mut round, seats, &community, &total_committed, &mut actions_log, action_source) {
        return Ok(diagnostic_log(
            hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
            actions_log.clone(), community.clone(), Vec::new(), Vec::new(), &error,
        ));
    }
    for (&id, &bet) in &round.player_bets {
        *total_committed.entry(id).or_insert(0) += bet;
    }

    for street in [Street::Flop, Street::Turn, Street::River] {
        if live_count(seats) <= 1 {
            break;
        }
        let dealt = match street {
            Street::Flop => deck.deal_n(3),
            _ => deck.deal_n(1),
        };
        community.extend(dealt);

        let live_with_chips = seats.iter().filter(|s| s.is_active() && s.stack > 0).count();
        if live_with_chips >= 2 {
            let order = clockwise_from(seat_order, next_seat_after(seat_order, button));
            let mut round = BettingRound::new_postflop(street, bb_amount, order);
            if let Err(error) = run_street(&mut round, seats, &community, &total_committed, &mut actions_log, action_source)
            {
                return Ok(diagnostic_log(
                    hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
                    actions_log.clone(), community.clone(), Vec::new(), Vec::new(), &error,
                ));
            }
            for (&id, &bet) in &round.player_bets {
                *total_committed.entry(id).or_insert(0) += bet;
            }
        }
    }

    let pots = match build_pots(seats, &total_committed) {
        Ok(pots) => pots,
        Err(error) => {
            return Ok(diagnostic_log(
                hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
                actions_log.clone(), community.clone(), Vec::new(), Vec::new(), &error,
            ));
        }
    };
    let clockwise_award_order = clockwise_from(seat_order, button);

    let mut showdown = Vec::new();
    let mut uncontested_winner = None;
    let ranks: BTreeMap<SeatId, HandRank> = if live_count(seats) <= 1 {
        let winner = seats.iter().find(|s| s.is_live()).map(|s| s.id);
        uncontested_winner = winner;
        let mut ranks = BTreeMap::new();
        if let Some(winner) = winner {
            // Rank value is irrelevant: an uncontested pot has exactly one
            // eligible seat, so no comparison ever happens.
            ranks.insert(winner, HandRank { category: HandCategory::HighCard, tiebreakers: Vec::new() });
        }
        ranks
    } else {
        let mut ranks = BTreeMap::new();
        for seat in seats.iter().filter(|s| s.is_live()) {
            let hole = match seat.hole {
                Some(hole) => hole,
                None => {
                    let error = EngineError::MissingHoleCards(seat.id);
                    return Ok(diagnostic_log(
                        hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount,
                        hole_cards, actions_log.clone(), community.clone(), pots.clone(), showdown.clone(), &error,
                    ));
                }
            };
            let rank = evaluate_hand(hole, &community);
            showdown.push(ShowdownEntry { seat: seat.id, hole, rank: rank.clone() });
            ranks.insert(seat.id, rank);
        }
        ranks
    };

    let winnings = award_pots(&pots, &ranks, &clockwise_award_order);

    let mut deltas: BTreeMap<SeatId, i64> = BTreeMap::new();
    let mut ending_stacks: BTreeMap<SeatId, u64> = BTreeMap::new();
    for seat in seats.iter_mut() {
        let won = winnings.get(&seat.id).copied().unwrap_or(0);
        if won > 0 {
            seat.stack += won;
        }
        let committed = total_committed.get(&seat.id).copied().unwrap_or(0);
        deltas.insert(seat.id, won as i64 - committed as i64);
        ending_stacks.insert(seat.id, seat.stack);
    }

    let net: i64 = deltas.values().sum();
    if net != 0 {
        let error = EngineError::PotDrift {
            committed: total_committed.values().sum(),
            distributed: winnings.values().sum(),
        };
        return Ok(diagnostic_log(
            hand_index, &starting_stacks, seats, button, sb_seat, bb_seat, sb_amount, bb_amount, hole_cards,
            actions_log, community, pots, showdown, &error,
        ));
    }

    Ok(HandLog {
        hand_index,
        recorded_at: chrono::Utc::now(),
        seats: seats.iter().map(|s| s.id).collect(),
        starting_stacks,
        button,
        small_blind_seat: sb_seat,
        big_blind_seat: bb_seat,
        small_blind_amount: sb_amount,
        big_blind_amount: bb_amount,
        hole_cards,
        actions: actions_log,
        community_cards: community,
        pots,
        showdown,
        uncontested_winner,
        deltas,
        ending_stacks,
        fatal: None,
    })
}
