use super::{checked_sum, WinnerPots};
use crate::error::BillingError;
use crate::state::{BidderMetadata, BidderPot, PayoutTicket};

use solana_program::pubkey::Pubkey;

use std::collections::btree_map::Entry::{Occupied, Vacant};
use std::collections::BTreeMap;

/// Payouts received by a single recipient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientPayouts {
    pub tickets: Vec<PayoutTicket>,
    pub sum: u64,
}

pub type PayoutsByRecipient = BTreeMap<Pubkey, RecipientPayouts>;

/// A winner pot together with the bidder's record on the auction.
#[derive(Debug, Clone, PartialEq)]
pub struct BidToClaim {
    pub metadata: BidderMetadata,
    pub pot: BidderPot,
}

pub fn aggregate_payouts_by_recipient(
    tickets: &[PayoutTicket],
) -> Result<PayoutsByRecipient, BillingError> {
    let mut payouts = PayoutsByRecipient::new();
    for ticket in tickets {
        let record = match payouts.entry(ticket.recipient) {
            Vacant(entry) => entry.insert(RecipientPayouts::default()),
            Occupied(entry) => entry.into_mut(),
        };
        record.sum = record
            .sum
            .checked_add(ticket.amount_paid)
            .ok_or(BillingError::ArithmeticOverflow("recipient payouts"))?;
        record.tickets.push(ticket.clone());
    }
    Ok(payouts)
}

pub fn total_collected(payouts: &PayoutsByRecipient) -> Result<u64, BillingError> {
    checked_sum(payouts.values().map(|record| record.sum), "collected payouts")
}

/// Winner pots whose funds have not been withdrawn yet.
pub fn compute_claimable_bids(winner_pots: &WinnerPots) -> Vec<&BidderPot> {
    winner_pots.values().filter(|pot| !pot.emptied).collect()
}

/// Pairs a pot with its bidder's metadata, if the bidder is known.
pub fn find_bid_to_claim(
    pot: &BidderPot,
    bidder_metadata: &[BidderMetadata],
) -> Option<BidToClaim> {
    bidder_metadata
        .iter()
        .find(|metadata| metadata.bidder_pubkey == pot.bidder_act)
        .map(|metadata| BidToClaim {
            metadata: metadata.clone(),
            pot: pot.clone(),
        })
}

/// Pairs every pot with the metadata of its bidder.
///
/// A pot without metadata cannot be valued, so it is reported instead of
/// being counted as zero.
pub fn pair_with_metadata(
    pots: &[&BidderPot],
    bidder_metadata: &[BidderMetadata],
) -> Result<Vec<BidToClaim>, BillingError> {
    pots.iter()
        .map(|pot| {
            find_bid_to_claim(pot, bidder_metadata).ok_or(BillingError::MissingAccount {
                kind: "bidder metadata",
                pubkey: pot.bidder_act,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn ticket(recipient: Pubkey, amount_paid: u64) -> PayoutTicket {
        PayoutTicket {
            key: crate::state::PAYOUT_TICKET_KEY,
            recipient,
            amount_paid,
        }
    }

    fn pot(bidder: Pubkey, emptied: bool) -> BidderPot {
        BidderPot {
            bidder_pot: Pubkey::new_unique(),
            bidder_act: bidder,
            auction_act: Pubkey::default(),
            emptied,
        }
    }

    #[test]
    fn payouts_sum_per_recipient() {
        let x = Pubkey::new_unique();
        let y = Pubkey::new_unique();
        let tickets = vec![ticket(x, 50), ticket(x, 30), ticket(y, 20)];

        let payouts = aggregate_payouts_by_recipient(&tickets).unwrap();
        assert_eq!(payouts.len(), 2);
        assert_eq!(payouts[&x].sum, 80);
        assert_eq!(payouts[&x].tickets.len(), 2);
        assert_eq!(payouts[&x].tickets[0].amount_paid, 50);
        assert_eq!(payouts[&y].sum, 20);
        assert_eq!(payouts[&y].tickets.len(), 1);
        assert_eq!(total_collected(&payouts).unwrap(), 100);

        // aggregating again yields the same result
        assert_eq!(aggregate_payouts_by_recipient(&tickets).unwrap(), payouts);
        assert!(aggregate_payouts_by_recipient(&[]).unwrap().is_empty());
    }

    #[test]
    fn payout_overflow() {
        let x = Pubkey::new_unique();
        let tickets = vec![ticket(x, u64::MAX), ticket(x, 1)];
        assert!(matches!(
            aggregate_payouts_by_recipient(&tickets),
            Err(BillingError::ArithmeticOverflow("recipient payouts"))
        ));
    }

    #[test]
    fn only_unemptied_pots_are_claimable() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let mut winner_pots = WinnerPots::new();
        winner_pots.insert(a, pot(a, false));
        winner_pots.insert(b, pot(b, true));

        let claimable = compute_claimable_bids(&winner_pots);
        assert_eq!(claimable.len(), 1);
        assert_eq!(claimable[0].bidder_act, a);
    }

    #[test]
    fn pots_without_metadata_are_reported() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let pot_a = pot(a, false);
        let pot_b = pot(b, false);
        let metadata = vec![BidderMetadata {
            bidder_pubkey: a,
            auction_pubkey: Pubkey::default(),
            last_bid: 70,
            last_bid_timestamp: 0,
            cancelled: false,
        }];

        let paired = pair_with_metadata(&[&pot_a], &metadata).unwrap();
        assert_eq!(paired[0].metadata.last_bid, 70);
        assert_eq!(paired[0].pot, pot_a);

        match pair_with_metadata(&[&pot_a, &pot_b], &metadata) {
            Err(BillingError::MissingAccount { pubkey, .. }) => assert_eq!(pubkey, b),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(find_bid_to_claim(&pot_b, &metadata).is_none());
        assert_eq!(find_bid_to_claim(&pot_a, &metadata), Some(paired[0].clone()));
    }
}
