use super::{checked_sum, Redemptions, WinnerPots};
use crate::error::BillingError;
use crate::state::{BidderMetadata, NonWinningConstraint, ParticipationConfig, WinningConstraint};

use solana_program::pubkey::Pubkey;

fn is_redeemed_for_participation(
    redemptions: &Redemptions,
    bidder: &Pubkey,
    participation_order: u64,
) -> bool {
    redemptions
        .get(bidder)
        .map(|ticket| ticket.is_bid_redeemed(participation_order))
        .unwrap_or(false)
}

/// Bids that still count towards billing: uncancelled bids, and bids that
/// were cancelled for a refund only after being redeemed for participation.
pub fn compute_usable_bids<'a>(
    bids: &'a [BidderMetadata],
    redemptions: &Redemptions,
    participation_order: u64,
) -> Vec<&'a BidderMetadata> {
    bids.iter()
        .filter(|bid| {
            !bid.cancelled
                || is_redeemed_for_participation(
                    redemptions,
                    &bid.bidder_pubkey,
                    participation_order,
                )
        })
        .collect()
}

/// Usable bids that may receive the participation prize.
///
/// Empty if the auction has no participation config. Winners are filtered
/// out when the config denies them the prize.
pub fn compute_participation_eligible<'a>(
    usable_bids: &[&'a BidderMetadata],
    participation_config: Option<&ParticipationConfig>,
    winner_pots: &WinnerPots,
) -> Vec<&'a BidderMetadata> {
    let config = match participation_config {
        Some(config) => config,
        None => return Vec::new(),
    };

    usable_bids
        .iter()
        .copied()
        .filter(|bid| {
            config.winner_constraint != WinningConstraint::NoParticipationPrize
                || !winner_pots.contains_key(&bid.bidder_pubkey)
        })
        .collect()
}

/// Price a non-winning bidder pays for the participation prize.
pub fn losing_participation_price(
    bid: &BidderMetadata,
    participation_config: Option<&ParticipationConfig>,
) -> u64 {
    match participation_config {
        Some(ParticipationConfig {
            non_winning_constraint: NonWinningConstraint::GivenForFixedPrice,
            fixed_price,
            ..
        }) => fixed_price.unwrap_or(0),
        Some(ParticipationConfig {
            non_winning_constraint: NonWinningConstraint::GivenForBidPrice,
            ..
        }) => bid.last_bid,
        _ => 0,
    }
}

/// Participation fees owed by eligible losers who have not redeemed their
/// participation prize yet.
pub fn compute_unredeemed_participation_total(
    eligible: &[&BidderMetadata],
    winner_pots: &WinnerPots,
    redemptions: &Redemptions,
    participation_order: u64,
    participation_config: Option<&ParticipationConfig>,
) -> Result<u64, BillingError> {
    let is_paid = participation_config
        .map(|config| config.non_winning_constraint.is_paid())
        .unwrap_or(false);
    if !is_paid {
        return Ok(0);
    }

    checked_sum(
        eligible
            .iter()
            // winners get the prize for free
            .filter(|bid| !winner_pots.contains_key(&bid.bidder_pubkey))
            .filter(|bid| {
                !is_redeemed_for_participation(
                    redemptions,
                    &bid.bidder_pubkey,
                    participation_order,
                )
            })
            .map(|bid| losing_participation_price(bid, participation_config)),
        "unredeemed participation fees",
    )
}

/// Participation fees the auction may collect in total, redeemed or not.
pub fn compute_possible_participation_total(
    eligible: &[&BidderMetadata],
    winner_pots: &WinnerPots,
    participation_config: Option<&ParticipationConfig>,
) -> Result<u64, BillingError> {
    checked_sum(
        eligible
            .iter()
            .filter(|bid| !winner_pots.contains_key(&bid.bidder_pubkey))
            .map(|bid| losing_participation_price(bid, participation_config)),
        "possible participation fees",
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::{BidRedemptionTicket, BidderPot};

    fn bidder(last_bid: u64, cancelled: bool) -> BidderMetadata {
        BidderMetadata {
            bidder_pubkey: Pubkey::new_unique(),
            auction_pubkey: Pubkey::default(),
            last_bid,
            last_bid_timestamp: 0,
            cancelled,
        }
    }

    fn pot_of(bid: &BidderMetadata) -> BidderPot {
        BidderPot {
            bidder_pot: Pubkey::new_unique(),
            bidder_act: bid.bidder_pubkey,
            auction_act: bid.auction_pubkey,
            emptied: false,
        }
    }

    fn redeemed_at(order: u64) -> BidRedemptionTicket {
        let mut redeemed = vec![0; order as usize / 8 + 1];
        redeemed[order as usize / 8] = 1_u8 << (7 - order % 8);
        BidRedemptionTicket::V2 {
            winner_index: None,
            auction_manager: Pubkey::default(),
            redeemed,
        }
    }

    fn config(
        winner_constraint: WinningConstraint,
        non_winning_constraint: NonWinningConstraint,
        fixed_price: Option<u64>,
    ) -> ParticipationConfig {
        ParticipationConfig {
            winner_constraint,
            non_winning_constraint,
            fixed_price,
        }
    }

    #[test]
    fn cancelled_bids_are_usable_only_if_redeemed() {
        let active = bidder(100, false);
        let cancelled = bidder(150, true);
        let cancelled_redeemed = bidder(200, true);
        let cancelled_redeemed_elsewhere = bidder(250, true);
        let bids = vec![
            active.clone(),
            cancelled,
            cancelled_redeemed.clone(),
            cancelled_redeemed_elsewhere.clone(),
        ];

        let mut redemptions = Redemptions::new();
        redemptions.insert(cancelled_redeemed.bidder_pubkey, redeemed_at(3));
        redemptions.insert(cancelled_redeemed_elsewhere.bidder_pubkey, redeemed_at(1));

        let usable = compute_usable_bids(&bids, &redemptions, 3);
        assert_eq!(usable, vec![&active, &cancelled_redeemed]);
    }

    #[test]
    fn winners_are_excluded_without_winner_prize() {
        let winner = bidder(300, false);
        let loser = bidder(100, false);
        let usable = vec![&winner, &loser];
        let mut winner_pots = WinnerPots::new();
        winner_pots.insert(winner.bidder_pubkey, pot_of(&winner));

        let no_prize = config(
            WinningConstraint::NoParticipationPrize,
            NonWinningConstraint::GivenForFixedPrice,
            Some(10),
        );
        let eligible = compute_participation_eligible(&usable, Some(&no_prize), &winner_pots);
        assert_eq!(eligible, vec![&loser]);

        let prize_given = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForFixedPrice,
            Some(10),
        );
        let eligible = compute_participation_eligible(&usable, Some(&prize_given), &winner_pots);
        assert_eq!(eligible, vec![&winner, &loser]);

        assert!(compute_participation_eligible(&usable, None, &winner_pots).is_empty());
    }

    #[test]
    fn losing_price_follows_constraint() {
        let bid = bidder(120, false);
        let fixed = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForFixedPrice,
            Some(10),
        );
        let fixed_without_price = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForFixedPrice,
            None,
        );
        let bid_price = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForBidPrice,
            Some(10),
        );
        let free = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::NoParticipationPrize,
            Some(10),
        );
        assert_eq!(losing_participation_price(&bid, Some(&fixed)), 10);
        assert_eq!(losing_participation_price(&bid, Some(&fixed_without_price)), 0);
        assert_eq!(losing_participation_price(&bid, Some(&bid_price)), 120);
        assert_eq!(losing_participation_price(&bid, Some(&free)), 0);
        assert_eq!(losing_participation_price(&bid, None), 0);
    }

    #[test]
    fn unredeemed_fixed_price_loser() {
        let loser = bidder(100, false);
        let eligible = vec![&loser];
        let fixed = config(
            WinningConstraint::NoParticipationPrize,
            NonWinningConstraint::GivenForFixedPrice,
            Some(10),
        );
        let winner_pots = WinnerPots::new();
        let mut redemptions = Redemptions::new();

        let total = compute_unredeemed_participation_total(
            &eligible,
            &winner_pots,
            &redemptions,
            0,
            Some(&fixed),
        )
        .unwrap();
        assert_eq!(total, 10);

        // redeemed at a different order still counts as outstanding
        redemptions.insert(loser.bidder_pubkey, redeemed_at(2));
        let total = compute_unredeemed_participation_total(
            &eligible,
            &winner_pots,
            &redemptions,
            0,
            Some(&fixed),
        )
        .unwrap();
        assert_eq!(total, 10);

        redemptions.insert(loser.bidder_pubkey, redeemed_at(0));
        let total = compute_unredeemed_participation_total(
            &eligible,
            &winner_pots,
            &redemptions,
            0,
            Some(&fixed),
        )
        .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn winners_pay_nothing_for_participation() {
        let winner = bidder(500, false);
        let loser_a = bidder(100, false);
        let loser_b = bidder(50, false);
        let eligible = vec![&winner, &loser_a, &loser_b];
        let mut winner_pots = WinnerPots::new();
        winner_pots.insert(winner.bidder_pubkey, pot_of(&winner));
        let bid_price = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForBidPrice,
            None,
        );

        let possible =
            compute_possible_participation_total(&eligible, &winner_pots, Some(&bid_price))
                .unwrap();
        assert_eq!(possible, 150);

        let mut redemptions = Redemptions::new();
        redemptions.insert(loser_a.bidder_pubkey, redeemed_at(0));
        let unredeemed = compute_unredeemed_participation_total(
            &eligible,
            &winner_pots,
            &redemptions,
            0,
            Some(&bid_price),
        )
        .unwrap();
        assert_eq!(unredeemed, 50);
    }

    #[test]
    fn overflowing_fees_are_reported() {
        let a = bidder(u64::MAX, false);
        let b = bidder(1, false);
        let bid_price = config(
            WinningConstraint::ParticipationPrizeGiven,
            NonWinningConstraint::GivenForBidPrice,
            None,
        );
        assert!(matches!(
            compute_possible_participation_total(&[&a, &b], &WinnerPots::new(), Some(&bid_price)),
            Err(BillingError::ArithmeticOverflow(_))
        ));
    }
}
