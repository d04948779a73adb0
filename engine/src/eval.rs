//! Seven-card hand evaluation: enumerate every five-card combination and take
//! the best. Deterministic and side-effect-free, as required by spec §4.1 —
//! called both at showdown and when building the structured log's reveals.

use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, Suit};

/// Hand categories, weakest to strongest. Derived `Ord` gives exactly the
/// total order spec §4.1 requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

/// A hand's strength: category first, tiebreaker ranks (already in the order
/// that makes them comparable left-to-right) second. `Ord` on this struct is
/// exactly the derived field-order comparison: category, then tiebreakers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandRank {
    pub category: HandCategory,
    pub tiebreakers: Vec<Rank>,
}

/// Evaluates the best 5-card hand obtainable from a seat's two hole cards
/// plus the community cards seen so far (3, 4, or 5 of them).
pub fn evaluate_hand(hole: (Card, Card), community: &[Card]) -> HandRank {
    let mut all = Vec::with_capacity(2 + community.len());
    all.push(hole.0);
    all.push(hole.1);
    all.extend_from_slice(community);
    evaluate_best(&all)
}

/// Evaluates the best 5-card hand out of up to 7 available cards.
pub fn evaluate_best(cards: &[Card]) -> HandRank {
    if cards.len() <= 5 {
        return evaluate_five(cards);
    }
    cards
        .iter()
        .copied()
        .combinations(5)
        .map(|five| evaluate_five(&five))
        .max()
        .expect("combinations(5) of a non-empty slice is never empty")
}

fn evaluate_five(cards: &[Card]) -> HandRank {
    debug_assert_eq!(cards.len(), 5, "evaluate_five requires exactly 5 cards");

    let mut rank_counts: HashMap<Rank, u8> = HashMap::new();
    for card in cards {
        *rank_counts.entry(card.rank).or_insert(0) += 1;
    }
    let mut suit_counts: HashMap<Suit, u8> = HashMap::new();
    for card in cards {
        *suit_counts.entry(card.suit).or_insert(0) += 1;
    }

    let is_flush = suit_counts.values().any(|&n| n == 5);
    let (is_straight, straight_high) = straight_high_card(cards);

    let mut by_count: Vec<(u8, Rank)> = rank_counts.iter().map(|(&r, &n)| (n, r)).collect();
    by_count.sort_by(|a, b| b.cmp(a));

    let descending_ranks = || {
        let mut ranks: Vec<Rank> = cards.iter().map(|c| c.rank).collect();
        ranks.sort_by(|a, b| b.cmp(a));
        ranks
    };

    if is_flush && is_straight {
        return HandRank {
            category: HandCategory::StraightFlush,
            tiebreakers: vec![straight_high],
        };
    }
    if by_count[0].0 == 4 {
        let quad = by_count[0].1;
        let kicker = by_count[1].1;
        return HandRank {
            category: HandCategory::FourOfAKind,
            tiebreakers: vec![quad, kicker],
        };
    }
    if by_count[0].0 == 3 && by_count[1].0 >= 2 {
        return HandRank {
            category: HandCategory::FullHouse,
            tiebreakers: vec![by_count[0].1, by_count[1].1],
        };
    }
    if is_flush {
        return HandRank {
            category: HandCategory::Flush,
            tiebreakers: descending_ranks(),
        };
    }
    if is_straight {
        return HandRank {
            category: HandCategory::Straight,
            tiebreakers: vec![straight_high],
        };
    }
    if by_count[0].0 == 3 {
        let trips = by_count[0].1;
        let mut kickers: Vec<Rank> = rank_counts
            .keys()
            .copied()
            .filter(|&r| r != trips)
            .collect();
        kickers.sort_by(|a, b| b.cmp(a));
        return HandRank {
            category: HandCategory::ThreeOfAKind,
            tiebreakers: std::iter::once(trips).chain(kickers).collect(),
        };
    }
    if by_count[0].0 == 2 && by_count[1].0 == 2 {
        let (high_pair, low_pair) = if by_count[0].1 > by_count[1].1 {
            (by_count[0].1, by_count[1].1)
        } else {
            (by_count[1].1, by_count[0].1)
        };
        let kicker = rank_counts
            .keys()
            .copied()
            .find(|&r| r != high_pair && r != low_pair)
            .expect("5 cards with two pairs leaves exactly one kicker");
        return HandRank {
            category: HandCategory::TwoPair,
            tiebreakers: vec![high_pair, low_pair, kicker],
        };
    }
    if by_count[0].0 == 2 {
        let pair = by_count[0].1;
        let mut kickers: Vec<Rank> = rank_counts.keys().copied().filter(|&r| r != pair).collect();
        kickers.sort_by(|a, b| b.cmp(a));
        return HandRank {
            category: HandCategory::OnePair,
            tiebreakers: std::iter::once(pair).chain(kickers).collect(),
        };
    }

    HandRank {
        category: HandCategory::HighCard,
        tiebreakers: descending_ranks(),
    }
}

/// Returns `(is_straight, high_card)`. The wheel (A-2-3-4-5) ranks as a
/// 5-high straight, per spec §4.1.
fn straight_high_card(cards: &[Card]) -> (bool, Rank) {
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    values.sort_unstable();
    values.dedup();
    if values.len() < 5 {
        return (false, Rank::Two);
    }

    if values == [2, 3, 4, 5, 14] {
        return (true, Rank::Five);
    }

    for window in values.windows(5) {
        if window[4] - window[0] == 4 {
            let high = Rank::ALL[(window[4] - 2) as usize];
            return (true, high);
        }
    }
    (false, Rank::Two)
}

pub fn compare_hands(a: &HandRank, b: &HandRank) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::card::{Rank::*, Suit::*};

    fn c(rank: crate::card::Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    /// Table-driven showdown comparisons spanning adjacent category
    /// boundaries. Each side is evaluated against its own board; `HandRank`'s
    /// derived `Ord` is category-first, so a higher category always outranks
    /// a lower one regardless of which board produced it.
    #[rstest]
    #[case((c(Nine, Hearts), c(Eight, Hearts)), vec![c(Seven, Hearts), c(Six, Hearts), c(Five, Hearts), c(Two, Diamonds), c(Three, Clubs)], HandCategory::StraightFlush,
           (c(Ace, Hearts), c(Ace, Diamonds)), vec![c(Ace, Clubs), c(Ace, Spades), c(King, Hearts), c(Two, Diamonds), c(Three, Clubs)], HandCategory::FourOfAKind)]
    #[case((c(Ace, Hearts), c(Ace, Diamonds)), vec![c(Ace, Clubs), c(Ace, Spades), c(King, Hearts), c(Two, Diamonds), c(Three, Clubs)], HandCategory::FourOfAKind,
           (c(King, Clubs), c(King, Diamonds)), vec![c(King, Hearts), c(Queen, Spades), c(Queen, Hearts), c(Two, Diamonds), c(Three, Clubs)], HandCategory::FullHouse)]
    #[case((c(King, Clubs), c(King, Diamonds)), vec![c(King, Hearts), c(Queen, Spades), c(Queen, Hearts), c(Two, Diamonds), c(Three, Clubs)], HandCategory::FullHouse,
           (c(Queen, Hearts), c(Nine, Diamonds)), vec![c(Ace, Hearts), c(King, Hearts), c(Seven, Hearts), c(Two, Clubs), c(Three, Hearts)], HandCategory::Flush)]
    #[case((c(Queen, Hearts), c(Nine, Diamonds)), vec![c(Ace, Hearts), c(King, Hearts), c(Seven, Hearts), c(Two, Clubs), c(Three, Hearts)], HandCategory::Flush,
           (c(Nine, Diamonds), c(Eight, Clubs)), vec![c(Seven, Diamonds), c(Six, Hearts), c(Five, Spades), c(Two, Diamonds), c(Three, Clubs)], HandCategory::Straight)]
    #[case((c(Nine, Diamonds), c(Eight, Clubs)), vec![c(Seven, Diamonds), c(Six, Hearts), c(Five, Spades), c(Two, Diamonds), c(Three, Clubs)], HandCategory::Straight,
           (c(Four, Hearts), c(Four, Diamonds)), vec![c(Four, Clubs), c(Nine, Spades), c(Seven, Diamonds), c(Two, Clubs), c(Jack, Hearts)], HandCategory::ThreeOfAKind)]
    fn showdown_ordering_matches_category_rank(
        #[case] winner_hole: (Card, Card),
        #[case] winner_community: Vec<Card>,
        #[case] winner_category: HandCategory,
        #[case] loser_hole: (Card, Card),
        #[case] loser_community: Vec<Card>,
        #[case] loser_category: HandCategory,
    ) {
        let winner = evaluate_hand(winner_hole, &winner_community);
        let loser = evaluate_hand(loser_hole, &loser_community);
        assert_eq!(winner.category, winner_category);
        assert_eq!(loser.category, loser_category);
        assert!(winner > loser);
    }

    #[test]
    fn royal_flush_beats_everything() {
        let hole = (c(Ace, Hearts), c(King, Hearts));
        let community = vec![c(Queen, Hearts), c(Jack, Hearts), c(Ten, Hearts), c(Two, Diamonds), c(Three, Clubs)];
        let rank = evaluate_hand(hole, &community);
        assert_eq!(rank.category, HandCategory::StraightFlush);
        assert_eq!(rank.tiebreakers, vec![Ace]);
    }

    #[test]
    fn wheel_straight_is_five_high() {
        let hole = (c(Ace, Hearts), c(Two, Diamonds));
        let community = vec![c(Three, Clubs), c(Four, Spades), c(Five, Hearts), c(King, Diamonds), c(Queen, Clubs)];
        let rank = evaluate_hand(hole, &community);
        assert_eq!(rank.category, HandCategory::Straight);
        assert_eq!(rank.tiebreakers, vec![Five]);
    }

    #[test]
    fn four_of_a_kind_beats_full_house() {
        let quad_hole = (c(Ace, Hearts), c(Ace, Diamonds));
        let quad_community = vec![c(Ace, Clubs), c(Ace, Spades), c(King, Hearts), c(Two, Diamonds), c(Three, Clubs)];
        let quad = evaluate_hand(quad_hole, &quad_community);

        let boat_hole = (c(King, Clubs), c(King, Diamonds));
        let boat_community = vec![c(King, Hearts), c(Queen, Spades), c(Queen, Hearts), c(Two, Diamonds), c(Three, Clubs)];
        let boat = evaluate_hand(boat_hole, &boat_community);

        assert!(quad > boat);
    }

    #[test]
    fn flush_vs_two_pair_flush_wins() {
        let flush_hole = (c(Queen, Hearts), c(Nine, Diamonds));
        let flush_community = vec![c(Ace, Hearts), c(King, Hearts), c(Seven, Hearts), c(Two, Clubs), c(Three, Hearts)];
        let flush = evaluate_hand(flush_hole, &flush_community);

        let pair_hole = (c(Ace, Clubs), c(King, Clubs));
        let pair_community = vec![c(Ace, Hearts), c(King, Hearts), c(Seven, Hearts), c(Two, Clubs), c(Three, Hearts)];
        let two_pair = evaluate_hand(pair_hole, &pair_community);

        assert_eq!(flush.category, HandCategory::Flush);
        assert_eq!(two_pair.category, HandCategory::TwoPair);
        assert!(flush > two_pair);
    }

    #[test]
    fn kicker_breaks_ties_within_same_category() {
        let community = vec![c(Ace, Hearts), c(Ace, Diamonds), c(King, Clubs), c(Seven, Clubs), c(Two, Spades)];
        let better = evaluate_hand((c(Queen, Diamonds), c(Three, Clubs)), &community);
        let worse = evaluate_hand((c(Jack, Diamonds), c(Four, Clubs)), &community);
        assert!(better > worse);
    }
}
