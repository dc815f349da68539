mod ticket_cache;

pub use ticket_cache::PayoutTicketCache;

use crate::client::{AccountStore, ChainClient};
use crate::error::BillingError;
use crate::pda::PayoutSlot;
use crate::reconcile::{compute_winners, BillingSnapshot, Redemptions, WinnerPots};
use crate::state::{
    AccountRecord, AuctionData, AuctionItem, AuctionView, BidRedemptionTicket, BidderPot,
    PayoutTicket,
};

use agsol_token_metadata::state::Metadata;
use log::{debug, info, warn};
use solana_program::pubkey::Pubkey;

impl AccountRecord for Metadata {
    const KIND: &'static str = "token metadata";
}

/// Lists every payout slot of the auction.
///
/// Prize arrays are the winning configs followed by the participation item.
/// Each item pays out to its creators and finally to the auctioneer.
pub fn payout_slots<F>(view: &AuctionView, mut creators_of: F) -> Result<Vec<PayoutSlot>, BillingError>
where
    F: FnMut(&AuctionItem) -> Result<Vec<Pubkey>, BillingError>,
{
    let participation = view
        .participation_item
        .as_ref()
        .map(|item| (true, std::slice::from_ref(item)));
    let prize_arrays = view
        .items
        .iter()
        .map(|items| (false, items.as_slice()))
        .chain(participation);

    let mut slots = Vec::new();
    for (winning_config_index, (is_participation, items)) in prize_arrays.enumerate() {
        for (item_index, item) in items.iter().enumerate() {
            let mut recipients = creators_of(item)?;
            recipients.push(view.auction_manager.authority);
            let auctioneer_index = recipients.len() - 1;
            for (creator_index, recipient) in recipients.into_iter().enumerate() {
                slots.push(PayoutSlot {
                    winning_config_index: (!is_participation).then(|| winning_config_index),
                    winning_config_item_index: (!is_participation).then(|| item_index),
                    creator_index: (creator_index < auctioneer_index).then(|| creator_index),
                    safety_deposit: item.safety_deposit,
                    recipient,
                });
            }
        }
    }
    Ok(slots)
}

/// Creator addresses of a prize, read from its token metadata.
///
/// Fails with [`BillingError::IncompleteMetadata`] while the metadata is not
/// available, since the payout recipients cannot be known without it.
pub fn item_creators<C: ChainClient>(
    client: &C,
    item: &AuctionItem,
) -> Result<Vec<Pubkey>, BillingError> {
    let metadata_pubkey = client.metadata_key(&item.mint)?;
    let metadata: Metadata =
        client
            .get_record(&metadata_pubkey)?
            .ok_or(BillingError::IncompleteMetadata {
                safety_deposit: item.safety_deposit,
            })?;
    Ok(metadata
        .data
        .creators
        .unwrap_or_default()
        .into_iter()
        .map(|creator| creator.address)
        .collect())
}

fn load_winner_pots<C: ChainClient>(
    client: &C,
    auction: &Pubkey,
    winners: &[Pubkey],
) -> Result<WinnerPots, BillingError> {
    let pot_keys = winners
        .iter()
        .map(|bidder| client.bidder_pot_key(auction, bidder))
        .collect::<Result<Vec<_>, _>>()?;
    let pots: Vec<Option<BidderPot>> = client.get_multiple_records(&pot_keys)?;
    Ok(winners
        .iter()
        .zip(pots)
        .filter_map(|(bidder, pot)| pot.map(|pot| (*bidder, pot)))
        .collect())
}

fn load_redemptions<C: ChainClient>(
    client: &C,
    auction: &Pubkey,
    bidders: &[Pubkey],
) -> Result<Redemptions, BillingError> {
    let redemption_keys = bidders
        .iter()
        .map(|bidder| client.bid_redemption_key(auction, bidder))
        .collect::<Result<Vec<_>, _>>()?;
    let tickets: Vec<Option<BidRedemptionTicket>> =
        client.get_multiple_records(&redemption_keys)?;
    Ok(bidders
        .iter()
        .zip(tickets)
        .filter_map(|(bidder, ticket)| ticket.map(|ticket| (*bidder, ticket)))
        .collect())
}

fn load_payout_tickets<C: ChainClient>(
    client: &C,
    view: &AuctionView,
    cache: &mut PayoutTicketCache,
) -> Result<Vec<PayoutTicket>, BillingError> {
    let auction_manager = view.auction_manager.pubkey;
    let slots = payout_slots(view, |item| item_creators(client, item))?;
    let missing = cache.missing(&auction_manager, &slots);
    debug!(
        "auction manager {}: {} payout slots, {} not found yet",
        auction_manager,
        slots.len(),
        missing.len()
    );

    let ticket_keys = missing
        .iter()
        .map(|slot| client.payout_ticket_key(&auction_manager, slot))
        .collect::<Result<Vec<_>, _>>()?;
    let tickets: Vec<Option<PayoutTicket>> = client.get_multiple_records(&ticket_keys)?;
    for ((slot, pubkey), ticket) in missing.into_iter().zip(ticket_keys).zip(tickets) {
        if let Some(ticket) = ticket {
            debug!(
                "payout ticket {}: {} paid to {}",
                pubkey, ticket.amount_paid, ticket.recipient
            );
            cache.insert(auction_manager, slot.clone(), ticket);
        }
    }

    Ok(cache.tickets(&auction_manager, &slots))
}

/// Materializes a [`BillingSnapshot`] of the auction.
///
/// The payout ticket cache is shared between consecutive loads of the same
/// auction so that found tickets are not requested again.
pub fn load_snapshot<C: ChainClient>(
    client: &C,
    view: &AuctionView,
    cache: &mut PayoutTicketCache,
) -> Result<BillingSnapshot, BillingError> {
    let auction_data: AuctionData =
        client
            .get_record(&view.auction)?
            .ok_or(BillingError::MissingAccount {
                kind: AuctionData::KIND,
                pubkey: view.auction,
            })?;
    let bids = auction_data.bid_state.bids().to_vec();

    // payout recipients are unknown until every item's metadata is there
    let payout_tickets = load_payout_tickets(client, view, cache)?;

    let bidder_metadata: Vec<_> = client
        .bidder_metadata_for_auction(&view.auction)?
        .into_iter()
        .map(|(_, metadata)| metadata)
        .collect();

    let winners: Vec<Pubkey> = compute_winners(&bids, view.auction_manager.num_winners)
        .into_iter()
        .map(|bid| bid.bidder_pubkey)
        .collect();
    let winner_pots = load_winner_pots(client, &view.auction, &winners)?;

    let bidders: Vec<Pubkey> = bidder_metadata
        .iter()
        .map(|metadata| metadata.bidder_pubkey)
        .collect();
    let redemptions = load_redemptions(client, &view.auction, &bidders)?;

    let escrow = view.auction_manager.accept_payment;
    let escrow_balance = match client.token_account_balance(&escrow) {
        Ok(balance) => Some(balance),
        Err(BillingError::MissingAccount { pubkey, .. }) => {
            warn!("escrow account {} not found", pubkey);
            None
        }
        Err(e) => return Err(e),
    };

    info!(
        "auction {}: {} bids, {} bidders, {}/{} winner pots, {} payout tickets",
        view.auction,
        bids.len(),
        bidder_metadata.len(),
        winner_pots.len(),
        winners.len(),
        payout_tickets.len()
    );

    Ok(BillingSnapshot {
        auction: view.auction,
        num_winners: view.auction_manager.num_winners,
        participation_config: view.auction_manager.participation_config.clone(),
        participation_order: view.participation_order(),
        bids,
        bidder_metadata,
        winner_pots,
        redemptions,
        payout_tickets,
        escrow_balance,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::AuctionManager;
    use std::collections::HashMap;

    fn item(order: u64) -> AuctionItem {
        AuctionItem {
            safety_deposit: Pubkey::new_unique(),
            order,
            mint: Pubkey::new_unique(),
        }
    }

    fn view(items: Vec<Vec<AuctionItem>>, participation_item: Option<AuctionItem>) -> AuctionView {
        AuctionView {
            auction: Pubkey::new_unique(),
            auction_manager: AuctionManager {
                pubkey: Pubkey::new_unique(),
                authority: Pubkey::new_unique(),
                accept_payment: Pubkey::new_unique(),
                num_winners: 2,
                participation_config: None,
            },
            items,
            participation_item,
        }
    }

    #[test]
    fn slots_cover_creators_and_auctioneer() {
        let first = item(0);
        let second = item(1);
        let participation = item(2);
        let view = view(
            vec![vec![first.clone()], vec![second.clone()]],
            Some(participation.clone()),
        );
        let creator_a = Pubkey::new_unique();
        let creator_b = Pubkey::new_unique();
        let mut creators = HashMap::new();
        creators.insert(first.mint, vec![creator_a, creator_b]);
        creators.insert(second.mint, vec![]);
        creators.insert(participation.mint, vec![creator_a]);

        let slots = payout_slots(&view, |item| Ok(creators[&item.mint].clone())).unwrap();
        let authority = view.auction_manager.authority;
        assert_eq!(slots.len(), 3 + 1 + 2);

        assert_eq!(slots[0].winning_config_index, Some(0));
        assert_eq!(slots[0].creator_index, Some(0));
        assert_eq!(slots[0].recipient, creator_a);
        assert_eq!(slots[1].creator_index, Some(1));
        assert_eq!(slots[2].creator_index, None);
        assert_eq!(slots[2].recipient, authority);

        assert_eq!(slots[3].winning_config_index, Some(1));
        assert_eq!(slots[3].winning_config_item_index, Some(0));
        assert_eq!(slots[3].creator_index, None);
        assert_eq!(slots[3].safety_deposit, second.safety_deposit);

        assert_eq!(slots[4].winning_config_index, None);
        assert_eq!(slots[4].winning_config_item_index, None);
        assert_eq!(slots[4].creator_index, Some(0));
        assert_eq!(slots[5].recipient, authority);
        assert_eq!(slots[5].safety_deposit, participation.safety_deposit);
    }

    #[test]
    fn slot_listing_stops_on_missing_metadata() {
        let view = view(vec![vec![item(0)]], None);
        let result = payout_slots(&view, |item| {
            Err(BillingError::IncompleteMetadata {
                safety_deposit: item.safety_deposit,
            })
        });
        assert!(matches!(result, Err(ref e) if e.is_not_ready()));
    }
}
