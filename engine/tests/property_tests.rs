//! Randomized-play property tests (spec §8): for any starting stacks and any
//! sequence of agent decisions, a played hand's deltas must net to zero and
//! the side pots it builds must account for every chip committed.

use proptest::prelude::*;

use holdem_engine::{
    ActionRequest, ActionSource, EngineError, HandSnapshot, RequestedAction, RequestedKind, Seat, SeatId,
};

/// A tiny deterministic PRNG (splitmix64) so a failing case shrinks like any
/// other proptest input instead of depending on OS randomness.
struct Lcg(u64);

impl Lcg {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }
}

/// Proposes pseudo-random, not-necessarily-legal actions. The engine's own
/// coercion step (spec §4.2/§4.5) sanitizes whatever comes out of this into
/// something legal, so the generator never has to compute legality itself.
struct RandomSource {
    rng: Lcg,
}

impl ActionSource for RandomSource {
    fn request_action(&mut self, request: ActionRequest) -> RequestedAction {
        let kind = match self.rng.below(10) {
            0 => RequestedKind::Fold,
            1..=4 if request.legal.can_check => RequestedKind::Check,
            1..=4 => RequestedKind::Call,
            5..=7 => RequestedKind::Call,
            8 => RequestedKind::Raise,
            _ => RequestedKind::AllIn,
        };
        let amount = if kind == RequestedKind::Raise {
            let legal = &request.legal;
            let span = legal.max_raise_total.saturating_sub(legal.min_raise_total);
            (legal.min_raise_total + self.rng.below(span + 1)) as i64
        } else {
            0
        };
        RequestedAction { kind, amount }
    }

    fn notify_state(&mut self, _snapshot: &HandSnapshot<'_>) {}
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn a_hand_never_creates_or_destroys_chips(
        seed in any::<u64>(),
        stacks in prop::collection::vec(2u64..2000, 2usize..7),
        sb_amount in 1u64..50,
    ) {
        let seat_order: Vec<SeatId> = (0..stacks.len()).collect();
        let mut seats: Vec<Seat> = stacks.iter().enumerate().map(|(id, &stack)| Seat::new(id, stack)).collect();
        let starting_total: u64 = seats.iter().map(|s| s.stack).sum();

        let mut source = RandomSource { rng: Lcg(seed) };
        let result = holdem_engine::play_hand(&mut seats, &seat_order, 0, 0, sb_amount, sb_amount * 2, &mut source);

        match result {
            Ok(log) => {
                // `fatal` is set exactly when `build_pots`/the final payout
                // check caught committed chips that don't match distributed
                // chips (spec §7); seeing it stay `None` here is itself the
                // side-pot-conservation check.
                prop_assert!(log.fatal.is_none(), "randomized play coerced to legal actions should never hit a fatal invariant");
                prop_assert_eq!(log.deltas.values().sum::<i64>(), 0);
                let ending_total: u64 = log.ending_stacks.values().sum();
                prop_assert_eq!(ending_total, starting_total);
            }
            Err(EngineError::InsufficientBlinds) => {
                // Fewer than two seats could afford the blinds: a void hand,
                // not a chip-conservation failure.
            }
            Err(other) => prop_assert!(false, "unexpected engine error under randomized legal play: {other}"),
        }
    }
}
