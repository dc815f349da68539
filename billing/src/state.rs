use crate::error::BillingError;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::borsh::try_from_slice_unchecked;
use solana_program::clock::UnixTimestamp;
use solana_program::pubkey::Pubkey;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

use std::io::{Result as IoResult, Write};

/// Account discriminator of a metaplex `PayoutTicketV1`.
pub const PAYOUT_TICKET_KEY: u8 = 5;
/// Account discriminator of a legacy metaplex `BidRedemptionTicketV1`.
pub const BID_REDEMPTION_TICKET_V1_KEY: u8 = 2;
/// Account discriminator of a metaplex `BidRedemptionTicketV2`.
pub const BID_REDEMPTION_TICKET_V2_KEY: u8 = 11;

/// Parsed on-chain record that can be read from raw account data.
pub trait AccountRecord: BorshDeserialize {
    /// Human readable name used in error messages.
    const KIND: &'static str;

    /// Sanity check run after deserialization (discriminators, etc.).
    fn is_valid(&self) -> bool {
        true
    }

    fn unpack(pubkey: &Pubkey, data: &[u8]) -> Result<Self, BillingError> {
        let record: Self =
            try_from_slice_unchecked(data).map_err(|_| BillingError::InvalidAccountData {
                kind: Self::KIND,
                pubkey: *pubkey,
            })?;
        if record.is_valid() {
            Ok(record)
        } else {
            Err(BillingError::InvalidAccountData {
                kind: Self::KIND,
                pubkey: *pubkey,
            })
        }
    }
}

/// An entry of the auction's bid state.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub struct Bid {
    /// The public key of the bidder's wallet.
    pub bidder_pubkey: Pubkey,
    /// The bid amount (in the smallest unit of the auction's token).
    pub amount: u64,
}

#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub enum PriceFloor {
    None([u8; 32]),
    Minimum([u8; 32]),
    BlindedPrice([u8; 32]),
}

#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, Copy, PartialEq)]
pub enum AuctionState {
    Created,
    Started,
    Ended,
}

#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub enum BidState {
    EnglishAuction { bids: Vec<Bid>, max: u64 },
    OpenEdition { bids: Vec<Bid>, max: u64 },
}

impl BidState {
    /// Bids in insertion order.
    pub fn bids(&self) -> &[Bid] {
        match self {
            BidState::EnglishAuction { bids, .. } | BidState::OpenEdition { bids, .. } => bids,
        }
    }
}

/// Main account of an auction owned by the auction program.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone)]
pub struct AuctionData {
    pub authority: Pubkey,
    pub token_mint: Pubkey,
    pub last_bid: Option<UnixTimestamp>,
    pub ended_at: Option<UnixTimestamp>,
    pub end_auction_at: Option<UnixTimestamp>,
    pub end_auction_gap: Option<UnixTimestamp>,
    pub price_floor: PriceFloor,
    pub state: AuctionState,
    pub bid_state: BidState,
}

impl AccountRecord for AuctionData {
    const KIND: &'static str = "auction";
}

/// Per-bidder record of the auction program, created on the first bid.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub struct BidderMetadata {
    pub bidder_pubkey: Pubkey,
    pub auction_pubkey: Pubkey,
    /// Amount of the bidder's most recent bid.
    pub last_bid: u64,
    pub last_bid_timestamp: UnixTimestamp,
    /// The bid was cancelled and the funds refunded.
    pub cancelled: bool,
}

impl AccountRecord for BidderMetadata {
    const KIND: &'static str = "bidder metadata";
}

/// Escrow of a bidder's funds for a given auction.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub struct BidderPot {
    /// Token account holding the escrowed funds.
    pub bidder_pot: Pubkey,
    /// The bidder's wallet.
    pub bidder_act: Pubkey,
    pub auction_act: Pubkey,
    /// Funds have already been withdrawn from the pot.
    pub emptied: bool,
}

impl AccountRecord for BidderPot {
    const KIND: &'static str = "bidder pot";
}

/// Record of a completed payment to a creator or the auctioneer.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
pub struct PayoutTicket {
    pub key: u8,
    pub recipient: Pubkey,
    pub amount_paid: u64,
}

impl AccountRecord for PayoutTicket {
    const KIND: &'static str = "payout ticket";

    fn is_valid(&self) -> bool {
        self.key == PAYOUT_TICKET_KEY
    }
}

/// Tracks which prizes a bid has already been redeemed for.
///
/// Both versions live at the same address, the account key tells them
/// apart. The `V2` account has no length prefix in front of the redemption
/// bitmap, so the ticket is (de)serialized by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum BidRedemptionTicket {
    /// Legacy ticket of auctions created before redemption bitmaps.
    V1 {
        participation_redeemed: bool,
        items_redeemed: bool,
    },
    V2 {
        winner_index: Option<u64>,
        auction_manager: Pubkey,
        /// One bit per safety deposit box order, most significant bit first.
        redeemed: Vec<u8>,
    },
}

impl BidRedemptionTicket {
    /// Whether the prize at the given safety deposit order was redeemed.
    ///
    /// Legacy tickets only know about participation, so they answer with
    /// that for any order.
    pub fn is_bid_redeemed(&self, order: u64) -> bool {
        match self {
            Self::V1 {
                participation_redeemed,
                ..
            } => *participation_redeemed,
            Self::V2 { redeemed, .. } => {
                let index = (order / 8) as usize;
                let mask = 1_u8 << (7 - (order % 8));
                redeemed
                    .get(index)
                    .map(|byte| byte & mask != 0)
                    .unwrap_or(false)
            }
        }
    }
}

impl BorshSerialize for BidRedemptionTicket {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        match self {
            Self::V1 {
                participation_redeemed,
                items_redeemed,
            } => {
                BorshSerialize::serialize(&BID_REDEMPTION_TICKET_V1_KEY, writer)?;
                BorshSerialize::serialize(participation_redeemed, writer)?;
                BorshSerialize::serialize(items_redeemed, writer)
            }
            Self::V2 {
                winner_index,
                auction_manager,
                redeemed,
            } => {
                BorshSerialize::serialize(&BID_REDEMPTION_TICKET_V2_KEY, writer)?;
                BorshSerialize::serialize(winner_index, writer)?;
                BorshSerialize::serialize(auction_manager, writer)?;
                writer.write_all(redeemed)
            }
        }
    }
}

impl BorshDeserialize for BidRedemptionTicket {
    fn deserialize(buf: &mut &[u8]) -> IoResult<Self> {
        match <u8 as BorshDeserialize>::deserialize(buf)? {
            BID_REDEMPTION_TICKET_V1_KEY => Ok(Self::V1 {
                participation_redeemed: <bool as BorshDeserialize>::deserialize(buf)?,
                items_redeemed: <bool as BorshDeserialize>::deserialize(buf)?,
            }),
            BID_REDEMPTION_TICKET_V2_KEY => {
                let winner_index = <Option<u64> as BorshDeserialize>::deserialize(buf)?;
                let auction_manager = <Pubkey as BorshDeserialize>::deserialize(buf)?;
                let redeemed = buf.to_vec();
                *buf = &[];
                Ok(Self::V2 {
                    winner_index,
                    auction_manager,
                    redeemed,
                })
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "unexpected bid redemption ticket key",
            )),
        }
    }
}

impl AccountRecord for BidRedemptionTicket {
    const KIND: &'static str = "bid redemption ticket";
}

#[repr(C)]
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum WinningConstraint {
    NoParticipationPrize,
    ParticipationPrizeGiven,
}

#[repr(C)]
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum NonWinningConstraint {
    NoParticipationPrize,
    GivenForFixedPrice,
    GivenForBidPrice,
}

impl NonWinningConstraint {
    /// Non-winners have to pay for the participation prize.
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            NonWinningConstraint::GivenForFixedPrice | NonWinningConstraint::GivenForBidPrice
        )
    }
}

/// Rules governing the non-winning "participation" prize of an auction.
#[derive(BorshDeserialize, BorshSerialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "camelCase"))]
pub struct ParticipationConfig {
    pub winner_constraint: WinningConstraint,
    pub non_winning_constraint: NonWinningConstraint,
    pub fixed_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "camelCase"))]
pub struct AuctionManager {
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub pubkey: Pubkey,
    /// Receives the auctioneer's share of every payout.
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub authority: Pubkey,
    /// Escrow token account collecting the winning bids.
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub accept_payment: Pubkey,
    pub num_winners: u64,
    #[cfg_attr(feature = "client", serde(default))]
    pub participation_config: Option<ParticipationConfig>,
}

/// A prize held in a safety deposit box of the auction's vault.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "camelCase"))]
pub struct AuctionItem {
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub safety_deposit: Pubkey,
    /// Order of the safety deposit box within the vault.
    pub order: u64,
    /// Mint of the prize token, its metadata account is derived from it.
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub mint: Pubkey,
}

/// Everything needed to locate the billing related accounts of an auction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "camelCase"))]
pub struct AuctionView {
    #[cfg_attr(feature = "client", serde(with = "pubkey_string"))]
    pub auction: Pubkey,
    pub auction_manager: AuctionManager,
    /// Items of each winning config, in winning config order.
    pub items: Vec<Vec<AuctionItem>>,
    #[cfg_attr(feature = "client", serde(default))]
    pub participation_item: Option<AuctionItem>,
}

impl AuctionView {
    /// Order of the participation item's safety deposit box, or 0 if the
    /// auction has none.
    pub fn participation_order(&self) -> u64 {
        self.participation_item
            .as_ref()
            .map(|item| item.order)
            .unwrap_or(0)
    }

    pub fn has_participation(&self) -> bool {
        self.auction_manager.participation_config.is_some()
    }
}

#[cfg(feature = "client")]
pub(crate) mod pubkey_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_program::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Pubkey::from_str(&encoded).map_err(serde::de::Error::custom)
    }
}
