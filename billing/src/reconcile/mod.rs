mod participation;
mod payouts;

pub use participation::*;
pub use payouts::*;

use crate::error::BillingError;
use crate::state::{
    Bid, BidRedemptionTicket, BidderMetadata, BidderPot, ParticipationConfig, PayoutTicket,
};

use solana_program::pubkey::Pubkey;

use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;

/// Pots of the current winners, keyed by the bidder's wallet.
pub type WinnerPots = BTreeMap<Pubkey, BidderPot>;
/// Bid redemption tickets, keyed by the bidder's wallet.
pub type Redemptions = HashMap<Pubkey, BidRedemptionTicket>;

pub(crate) fn checked_sum<I>(amounts: I, what: &'static str) -> Result<u64, BillingError>
where
    I: IntoIterator<Item = u64>,
{
    amounts.into_iter().try_fold(0_u64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or(BillingError::ArithmeticOverflow(what))
    })
}

/// Immutable snapshot of every record the reconciliation needs.
#[derive(Debug, Clone, Default)]
pub struct BillingSnapshot {
    pub auction: Pubkey,
    pub num_winners: u64,
    pub participation_config: Option<ParticipationConfig>,
    /// Safety deposit order of the participation prize.
    pub participation_order: u64,
    /// The auction's bid state in insertion order.
    pub bids: Vec<Bid>,
    /// Every bidder that ever bid on the auction.
    pub bidder_metadata: Vec<BidderMetadata>,
    pub winner_pots: WinnerPots,
    pub redemptions: Redemptions,
    pub payout_tickets: Vec<PayoutTicket>,
    /// Balance of the auction's escrow token account, if it was fetched.
    pub escrow_balance: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BillingTotals {
    pub total_auction_value: u64,
    pub total_redeemed_value: u64,
    /// Collected by the creators and the auctioneer.
    pub total_collected: u64,
    pub total_unsettled: u64,
    pub outstanding_participation_fees: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingReport {
    pub winners: Vec<Bid>,
    /// Winner bids whose pots still hold funds.
    pub bids_to_claim: Vec<BidToClaim>,
    /// Every winner pot with a known bidder, emptied or not.
    pub other_bids_to_claim: Vec<BidToClaim>,
    pub payouts: PayoutsByRecipient,
    pub participation_eligible: Vec<BidderMetadata>,
    pub has_participation: bool,
    pub totals: BillingTotals,
    pub escrow_balance: Option<u64>,
}

/// The most recent `num_winners` bids, most recent first.
pub fn compute_winners(bids: &[Bid], num_winners: u64) -> Vec<&Bid> {
    let num_winners = usize::try_from(num_winners).unwrap_or(usize::MAX);
    bids.iter().rev().take(num_winners).collect()
}

pub fn compute_totals(
    winners: &[&Bid],
    possible_participation_total: u64,
    unredeemed_participation_total: u64,
    payouts: &PayoutsByRecipient,
    bids_to_claim: &[BidToClaim],
) -> Result<BillingTotals, BillingError> {
    let winner_payments = checked_sum(winners.iter().map(|bid| bid.amount), "winning bids")?;
    let total_auction_value = winner_payments
        .checked_add(possible_participation_total)
        .ok_or(BillingError::ArithmeticOverflow("auction value"))?;
    // unredeemed fees are a subset of the possible ones
    let total_redeemed_value = total_auction_value.saturating_sub(unredeemed_participation_total);
    let total_unsettled = checked_sum(
        bids_to_claim.iter().map(|bid| bid.metadata.last_bid),
        "unsettled bids",
    )?;

    Ok(BillingTotals {
        total_auction_value,
        total_redeemed_value,
        total_collected: total_collected(payouts)?,
        total_unsettled,
        outstanding_participation_fees: unredeemed_participation_total,
    })
}

/// Derives the billing state of an auction from a [`BillingSnapshot`].
pub struct BillingReconciler<'a> {
    snapshot: &'a BillingSnapshot,
}

impl<'a> BillingReconciler<'a> {
    pub fn new(snapshot: &'a BillingSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn winners(&self) -> Vec<&'a Bid> {
        compute_winners(&self.snapshot.bids, self.snapshot.num_winners)
    }

    pub fn usable_bids(&self) -> Vec<&'a BidderMetadata> {
        compute_usable_bids(
            &self.snapshot.bidder_metadata,
            &self.snapshot.redemptions,
            self.snapshot.participation_order,
        )
    }

    pub fn participation_eligible(&self) -> Vec<&'a BidderMetadata> {
        compute_participation_eligible(
            &self.usable_bids(),
            self.snapshot.participation_config.as_ref(),
            &self.snapshot.winner_pots,
        )
    }

    pub fn reconcile(&self) -> Result<BillingReport, BillingError> {
        let snapshot = self.snapshot;
        let participation_config = snapshot.participation_config.as_ref();

        let winners = self.winners();
        let eligible = self.participation_eligible();

        let unredeemed = compute_unredeemed_participation_total(
            &eligible,
            &snapshot.winner_pots,
            &snapshot.redemptions,
            snapshot.participation_order,
            participation_config,
        )?;
        let possible = compute_possible_participation_total(
            &eligible,
            &snapshot.winner_pots,
            participation_config,
        )?;

        let payouts = aggregate_payouts_by_recipient(&snapshot.payout_tickets)?;

        let claimable = compute_claimable_bids(&snapshot.winner_pots);
        let bids_to_claim = pair_with_metadata(&claimable, &snapshot.bidder_metadata)?;
        let other_bids_to_claim = snapshot
            .winner_pots
            .values()
            .filter_map(|pot| find_bid_to_claim(pot, &snapshot.bidder_metadata))
            .collect();

        let totals = compute_totals(&winners, possible, unredeemed, &payouts, &bids_to_claim)?;

        Ok(BillingReport {
            winners: winners.into_iter().cloned().collect(),
            bids_to_claim,
            other_bids_to_claim,
            payouts,
            participation_eligible: eligible.into_iter().cloned().collect(),
            has_participation: participation_config.is_some(),
            totals,
            escrow_balance: snapshot.escrow_balance,
        })
    }
}
