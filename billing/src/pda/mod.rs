use crate::config::ProgramIds;
use crate::error::BillingError;

use agsol_token_metadata::state::PREFIX as METADATA_PREFIX;
use solana_program::pubkey::Pubkey;

pub const AUCTION_PREFIX: &str = "auction";
pub const METAPLEX_PREFIX: &str = "metaplex";
pub const BIDDER_METADATA_SUFFIX: &str = "metadata";

pub fn bidder_pot_seeds<'a>(
    auction_program: &'a Pubkey,
    auction: &'a Pubkey,
    bidder: &'a Pubkey,
) -> [&'a [u8]; 4] {
    [
        AUCTION_PREFIX.as_bytes(),
        auction_program.as_ref(),
        auction.as_ref(),
        bidder.as_ref(),
    ]
}

pub fn bidder_metadata_seeds<'a>(
    auction_program: &'a Pubkey,
    auction: &'a Pubkey,
    bidder: &'a Pubkey,
) -> [&'a [u8]; 5] {
    [
        AUCTION_PREFIX.as_bytes(),
        auction_program.as_ref(),
        auction.as_ref(),
        bidder.as_ref(),
        BIDDER_METADATA_SUFFIX.as_bytes(),
    ]
}

pub fn bid_redemption_seeds<'a>(auction: &'a Pubkey, bidder_metadata: &'a Pubkey) -> [&'a [u8]; 3] {
    [
        METAPLEX_PREFIX.as_bytes(),
        auction.as_ref(),
        bidder_metadata.as_ref(),
    ]
}

pub fn payout_ticket_seeds<'a>(
    auction_manager: &'a Pubkey,
    winning_config: &'a str,
    winning_config_item: &'a str,
    creator: &'a str,
    safety_deposit: &'a Pubkey,
    recipient: &'a Pubkey,
) -> [&'a [u8]; 7] {
    [
        METAPLEX_PREFIX.as_bytes(),
        auction_manager.as_ref(),
        winning_config.as_bytes(),
        winning_config_item.as_bytes(),
        creator.as_bytes(),
        safety_deposit.as_ref(),
        recipient.as_ref(),
    ]
}

pub fn metadata_seeds<'a>(token_metadata_program: &'a Pubkey, mint: &'a Pubkey) -> [&'a [u8]; 3] {
    [
        METADATA_PREFIX.as_bytes(),
        token_metadata_program.as_ref(),
        mint.as_ref(),
    ]
}

/// Identifies a single payout: the prize it was paid for and who it was paid
/// to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayoutSlot {
    /// Index of the winning config, `None` for the participation prize.
    pub winning_config_index: Option<usize>,
    /// Index of the item within the winning config, `None` for the
    /// participation prize.
    pub winning_config_item_index: Option<usize>,
    /// Index of the creator in the item's metadata, `None` for the
    /// auctioneer.
    pub creator_index: Option<usize>,
    pub safety_deposit: Pubkey,
    pub recipient: Pubkey,
}

impl PayoutSlot {
    fn seed_strings(&self) -> (String, String, String) {
        let winning_config = self
            .winning_config_index
            .map(|index| index.to_string())
            .unwrap_or_else(|| "participation".to_owned());
        let winning_config_item = self
            .winning_config_item_index
            .map(|index| index.to_string())
            .unwrap_or_else(|| "0".to_owned());
        let creator = self
            .creator_index
            .map(|index| index.to_string())
            .unwrap_or_else(|| "auctioneer".to_owned());
        (winning_config, winning_config_item, creator)
    }
}

fn find_pubkey(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    kind: &'static str,
) -> Result<Pubkey, BillingError> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(pubkey, _bump_seed)| pubkey)
        .ok_or(BillingError::MissingDerivedKey(kind))
}

pub fn bidder_pot_pubkey(
    program_ids: &ProgramIds,
    auction: &Pubkey,
    bidder: &Pubkey,
) -> Result<Pubkey, BillingError> {
    find_pubkey(
        &bidder_pot_seeds(&program_ids.auction, auction, bidder),
        &program_ids.auction,
        "bidder pot",
    )
}

pub fn bidder_metadata_pubkey(
    program_ids: &ProgramIds,
    auction: &Pubkey,
    bidder: &Pubkey,
) -> Result<Pubkey, BillingError> {
    find_pubkey(
        &bidder_metadata_seeds(&program_ids.auction, auction, bidder),
        &program_ids.auction,
        "bidder metadata",
    )
}

pub fn bid_redemption_pubkey(
    program_ids: &ProgramIds,
    auction: &Pubkey,
    bidder: &Pubkey,
) -> Result<Pubkey, BillingError> {
    let bidder_metadata = bidder_metadata_pubkey(program_ids, auction, bidder)?;
    find_pubkey(
        &bid_redemption_seeds(auction, &bidder_metadata),
        &program_ids.metaplex,
        "bid redemption",
    )
}

pub fn payout_ticket_pubkey(
    program_ids: &ProgramIds,
    auction_manager: &Pubkey,
    slot: &PayoutSlot,
) -> Result<Pubkey, BillingError> {
    let (winning_config, winning_config_item, creator) = slot.seed_strings();
    find_pubkey(
        &payout_ticket_seeds(
            auction_manager,
            &winning_config,
            &winning_config_item,
            &creator,
            &slot.safety_deposit,
            &slot.recipient,
        ),
        &program_ids.metaplex,
        "payout ticket",
    )
}

pub fn metadata_pubkey(program_ids: &ProgramIds, mint: &Pubkey) -> Result<Pubkey, BillingError> {
    find_pubkey(
        &metadata_seeds(&program_ids.token_metadata, mint),
        &program_ids.token_metadata,
        "token metadata",
    )
}
