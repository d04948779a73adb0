//! Cross-module scenarios: a full hand driven by a scripted `ActionSource`,
//! and a multi-hand match carried through `MatchController`. Unit-level
//! behavior (single betting round, single pot split) lives in each module's
//! own `#[cfg(test)]` block; these exercise the pieces together.

use std::collections::{BTreeMap, VecDeque};

use holdem_engine::{
    ActionRequest, ActionSource, BlindSchedule, HandSnapshot, MatchController, RequestedAction,
    RequestedKind, Seat,
};

/// Plays a fixed script of actions per seat, in order; falls back to
/// check-or-call once a seat's script runs dry, so a short script can still
/// drive a hand to completion without needing one entry per decision point.
struct ScriptedSource {
    scripts: BTreeMap<usize, VecDeque<RequestedAction>>,
}

impl ScriptedSource {
    fn new(scripts: BTreeMap<usize, Vec<RequestedAction>>) -> Self {
        Self { scripts: scripts.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect() }
    }
}

impl ActionSource for ScriptedSource {
    fn request_action(&mut self, request: ActionRequest) -> RequestedAction {
        if let Some(next) = self.scripts.get_mut(&request.seat).and_then(VecDeque::pop_front) {
            return next;
        }
        if request.legal.can_check {
            RequestedAction { kind: RequestedKind::Check, amount: 0 }
        } else {
            RequestedAction { kind: RequestedKind::Call, amount: 0 }
        }
    }

    fn notify_state(&mut self, _snapshot: &HandSnapshot<'_>) {}
}

#[test]
fn a_short_all_in_creates_a_side_pot_the_short_stack_cannot_win_beyond() {
    // Seat 1 can only call 50 of a much larger raise war between 0 and 2;
    // its own chips can only ever win up to the 50-a-head layer.
    let mut seats = vec![Seat::new(0, 1000), Seat::new(1, 50), Seat::new(2, 1000)];
    let order = vec![0, 1, 2];

    let mut scripts = BTreeMap::new();
    scripts.insert(0, vec![RequestedAction { kind: RequestedKind::Raise, amount: 200 }]);
    scripts.insert(2, vec![RequestedAction { kind: RequestedKind::Raise, amount: 400 }]);
    let mut source = ScriptedSource::new(scripts);

    let log = holdem_engine::play_hand(&mut seats, &order, 0, 0, 5, 10, &mut source).unwrap();

    assert!(log.pots.len() >= 2, "seat 1's short stack should force at least one side pot");
    let main_pot = &log.pots[0];
    assert!(main_pot.eligible.contains(&1), "seat 1 must be eligible for the pot its own chips fund");

    let sum: i64 = log.deltas.values().sum();
    assert_eq!(sum, 0);
    assert_eq!(log.ending_stacks.values().sum::<u64>(), 2050);
}

#[test]
fn a_multi_hand_match_carries_stacks_and_rotates_the_button() {
    struct AlwaysCheckOrCall;
    impl ActionSource for AlwaysCheckOrCall {
        fn request_action(&mut self, request: ActionRequest) -> RequestedAction {
            if request.legal.can_check {
                RequestedAction { kind: RequestedKind::Check, amount: 0 }
            } else {
                RequestedAction { kind: RequestedKind::Call, amount: 0 }
            }
        }
        fn notify_state(&mut self, _snapshot: &HandSnapshot<'_>) {}
    }

    let mut controller = MatchController::new(&[0, 1, 2], 500, BlindSchedule::constant(20), None);
    let mut source = AlwaysCheckOrCall;

    let mut hands_played = 0;
    while !controller.is_terminated() && hands_played < 20 {
        if controller.play_next_hand(&mut source).is_err() {
            break;
        }
        hands_played += 1;
    }

    let summary = controller.summary();
    assert_eq!(summary.cumulative_deltas.values().sum::<i64>(), 0);
    assert_eq!(summary.ending_stacks.values().sum::<u64>(), 1500);
    assert!(summary.hands_played > 0);
}
