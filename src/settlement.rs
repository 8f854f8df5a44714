//! Round settlement: outcome draw and payout computation.
//!
//! Pure computation with no shared state or I/O. The controller owns when
//! settlement runs; this module owns what it produces.

use crate::models::Bet;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payout factor applied to a winning stake.
///
/// Together with the 1-in-10 draw this fixes the long-run return-to-player
/// at 99%.
pub const WIN_MULTIPLIER: Decimal = dec!(9.9);

/// Lowest number a bet can be placed on.
pub const NUMBER_MIN: u8 = 1;
/// Highest number a bet can be placed on.
pub const NUMBER_MAX: u8 = 10;

/// A winning (player, payout) pair produced by settlement, in bet order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WinnerPayout {
    pub player_id: Uuid,
    pub nickname: String,
    pub payout: Decimal,
}

/// Draw the round outcome, each number equiprobable.
pub fn draw_winning_number<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(NUMBER_MIN..=NUMBER_MAX)
}

/// Apply a drawn outcome to a round's bets.
///
/// Every unsettled bet gets its `payout` and `is_winner` fields written:
/// `amount * WIN_MULTIPLIER` on a match, zero otherwise. Bets that already
/// carry a payout are left untouched and not re-reported, so re-applying the
/// same outcome is a no-op.
pub fn apply_outcome(bets: &mut [Bet], winning_number: u8) -> Vec<WinnerPayout> {
    let mut winners = Vec::new();

    for bet in bets.iter_mut().filter(|bet| !bet.is_settled()) {
        if bet.number == winning_number {
            let payout = bet.amount * WIN_MULTIPLIER;
            bet.payout = Some(payout);
            bet.is_winner = Some(true);
            winners.push(WinnerPayout {
                player_id: bet.player_id,
                nickname: bet.nickname.clone(),
                payout,
            });
        } else {
            bet.payout = Some(Decimal::ZERO);
            bet.is_winner = Some(false);
        }
    }

    winners
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::prelude::ToPrimitive;

    fn bet_on(number: u8, amount: Decimal) -> Bet {
        Bet {
            id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            nickname: format!("player-{number}"),
            round_id: Uuid::nil(),
            number,
            amount,
            payout: None,
            is_winner: None,
            placed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn draw_stays_inside_the_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let n = draw_winning_number(&mut rng);
            assert!((NUMBER_MIN..=NUMBER_MAX).contains(&n));
        }
    }

    #[test]
    fn matching_bets_pay_the_multiplier_others_pay_zero() {
        let mut bets = vec![
            bet_on(5, dec!(100)),
            bet_on(7, dec!(100)),
            bet_on(5, dec!(20)),
        ];

        let winners = apply_outcome(&mut bets, 5);

        assert_eq!(bets[0].payout, Some(dec!(990.0)));
        assert_eq!(bets[0].is_winner, Some(true));
        assert_eq!(bets[1].payout, Some(Decimal::ZERO));
        assert_eq!(bets[1].is_winner, Some(false));
        assert_eq!(bets[2].payout, Some(dec!(198.0)));

        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].payout, dec!(990.0));
        assert_eq!(winners[1].payout, dec!(198.0));
    }

    #[test]
    fn reapplying_the_outcome_changes_nothing_and_reports_nobody() {
        let mut bets = vec![bet_on(3, dec!(50)), bet_on(9, dec!(50))];

        let first = apply_outcome(&mut bets, 3);
        let snapshot = bets.clone();
        let second = apply_outcome(&mut bets, 3);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(bets, snapshot);
    }

    #[test]
    fn round_with_no_bets_settles_with_no_winners() {
        let mut bets: Vec<Bet> = Vec::new();
        assert!(apply_outcome(&mut bets, 1).is_empty());
    }

    /// Long-run return-to-player must converge to (1/10) * 9.9 = 99%.
    #[test]
    fn rtp_converges_to_99_percent() {
        const ROUNDS: usize = 250_000;
        const BETS_PER_ROUND: usize = 10;
        let stake = dec!(100);

        let mut rng = StdRng::seed_from_u64(0x7e2a_91d4);
        let mut bets: Vec<Bet> = (0..BETS_PER_ROUND).map(|_| bet_on(1, stake)).collect();

        let mut total_staked = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;

        for _ in 0..ROUNDS {
            for bet in bets.iter_mut() {
                bet.number = rng.gen_range(NUMBER_MIN..=NUMBER_MAX);
                bet.payout = None;
                bet.is_winner = None;
                total_staked += stake;
            }

            let winning = draw_winning_number(&mut rng);
            for winner in apply_outcome(&mut bets, winning) {
                total_paid += winner.payout;
            }
        }

        let rtp = (total_paid / total_staked)
            .to_f64()
            .expect("rtp fits in f64");
        assert!(
            (rtp - 0.99).abs() < 0.01,
            "rtp {rtp} outside 0.99 +/- 0.01 after {ROUNDS} rounds"
        );
    }
}
