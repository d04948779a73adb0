//! Side-pot construction and award. Built by peeling the lowest remaining
//! commitment off every seat still owed a layer, which naturally produces
//! pots whose eligible sets are strictly nested (spec §4.3).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::eval::HandRank;
use crate::seat::{Seat, SeatId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u64,
    /// Seats who can win this pot: contributed at least this layer and did
    /// not fold. A folded seat's chips still count toward `amount`.
    pub eligible: BTreeSet<SeatId>,
}

/// Builds the ordered list of pots from each seat's total chips committed
/// this hand (summed across all streets). Pots are ordered main pot first.
pub fn build_pots(seats: &[Seat], committed: &BTreeMap<SeatId, u64>) -> Result<Vec<Pot>, EngineError> {
    let mut remaining: BTreeMap<SeatId, u64> = committed
        .iter()
        .filter(|&(_, &amount)| amount > 0)
        .map(|(&id, &amount)| (id, amount))
        .collect();
    let total_committed: u64 = remaining.values().sum();

    let mut pots = Vec::new();
    while !remaining.is_empty() {
        let threshold = *remaining
            .values()
            .min()
            .expect("remaining is non-empty inside this loop");
        let pot_amount = threshold * remaining.len() as u64;
        let eligible: BTreeSet<SeatId> = remaining
            .keys()
            .copied()
            .filter(|id| {
                seats
                    .iter()
                    .find(|s| s.id == *id)
                    .map(|s| s.is_live())
                    .unwrap_or(false)
            })
            .collect();
        pots.push(Pot {
            amount: pot_amount,
            eligible,
        });

        let ids: Vec<SeatId> = remaining.keys().copied().collect();
        for id in ids {
            let left = remaining.get_mut(&id).expect("id was just read from remaining");
            *left -= threshold;
            if *left == 0 {
                remaining.remove(&id);
            }
        }
    }

    let distributed: u64 = pots.iter().map(|p| p.amount).sum();
    if distributed != total_committed {
        return Err(EngineError::PotDrift {
            committed: total_committed,
            distributed,
        });
    }
    Ok(pots)
}

/// Awards each pot to the best hand(s) among its eligible seats, splitting
/// evenly and handing any odd remainder chips one at a time to winners in
/// `clockwise_from_button` order — the tie-break §4.3 specifies explicitly.
pub fn award_pots(
    pots: &[Pot],
    hands: &BTreeMap<SeatId, HandRank>,
    clockwise_from_button: &[SeatId],
) -> BTreeMap<SeatId, u64> {
    let mut winnings: BTreeMap<SeatId, u64> = BTreeMap::new();
    for pot in pots {
        if pot.amount == 0 {
            continue;
        }
        let best = pot
            .eligible
            .iter()
            .filter_map(|id| hands.get(id).map(|rank| (id, rank)))
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(_, rank)| rank.clone());

        let Some(best) = best else { continue };

        let winners: Vec<SeatId> = clockwise_from_button
            .iter()
            .copied()
            .filter(|id| pot.eligible.contains(id) && hands.get(id) == Some(&best))
            .collect();
        if winners.is_empty() {
            continue;
        }

        let share = pot.amount / winners.len() as u64;
        let mut remainder = pot.amount % winners.len() as u64;
        for &id in &winners {
            let mut take = share;
            if remainder > 0 {
                take += 1;
                remainder -= 1;
            }
            *winnings.entry(id).or_insert(0) += take;
        }
    }
    winnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::Seat;

    #[test]
    fn single_pot_when_no_one_is_short() {
        let seats = vec![Seat::new(0, 900), Seat::new(1, 900), Seat::new(2, 900)];
        let committed: BTreeMap<SeatId, u64> = [(0, 100), (1, 100), (2, 100)].into_iter().collect();
        let pots = build_pots(&seats, &committed).unwrap();
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn short_all_in_creates_nested_side_pot() {
        let seats = vec![Seat::new(0, 0), Seat::new(1, 0), Seat::new(2, 0)];
        // seat 0 all-in for 50, seats 1 and 2 each committed 150
        let committed: BTreeMap<SeatId, u64> = [(0, 50), (1, 150), (2, 150)].into_iter().collect();
        let pots = build_pots(&seats, &committed).unwrap();
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 150); // 50 * 3
        assert_eq!(pots[0].eligible, BTreeSet::from([0, 1, 2]));
        assert_eq!(pots[1].amount, 200); // 100 * 2
        assert_eq!(pots[1].eligible, BTreeSet::from([1, 2]));
        assert_eq!(pots.iter().map(|p| p.amount).sum::<u64>(), 350);
    }

    #[test]
    fn folded_seat_forfeits_eligibility_but_not_its_chips() {
        let mut seats = vec![Seat::new(0, 0), Seat::new(1, 0), Seat::new(2, 0)];
        seats[1].status = crate::seat::SeatStatus::Folded;
        let committed: BTreeMap<SeatId, u64> = [(0, 100), (1, 100), (2, 100)].into_iter().collect();
        let pots = build_pots(&seats, &committed).unwrap();
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible, BTreeSet::from([0, 2]));
    }

    #[test]
    fn odd_chip_goes_to_seat_closest_clockwise_from_button() {
        use crate::eval::HandCategory;
        let pot = Pot {
            amount: 101,
            eligible: BTreeSet::from([0, 1]),
        };
        let hands: BTreeMap<SeatId, HandRank> = [
            (0, HandRank { category: HandCategory::OnePair, tiebreakers: vec![] }),
            (1, HandRank { category: HandCategory::OnePair, tiebreakers: vec![] }),
        ]
        .into_iter()
        .collect();
        // seat 1 sits closer clockwise from the button than seat 0 this hand
        let winnings = award_pots(&[pot], &hands, &[1, 0]);
        assert_eq!(winnings[&1], 51);
        assert_eq!(winnings[&0], 50);
    }
}
