#[cfg(feature = "rpc")]
pub mod rpc;

use crate::config::ProgramIds;
use crate::error::BillingError;
use crate::pda::{self, PayoutSlot};
use crate::state::{AccountRecord, BidderMetadata};

use solana_program::program_pack::Pack;
use solana_program::pubkey::Pubkey;
use spl_token::state::Account as TokenAccount;

/// Lookup of raw on-chain accounts by key.
pub trait AccountStore {
    /// Returns `None` if the account does not exist.
    fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, BillingError>;

    /// Returns the accounts in the order of `pubkeys`.
    fn get_multiple_account_data(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, BillingError> {
        pubkeys
            .iter()
            .map(|pubkey| self.get_account_data(pubkey))
            .collect()
    }

    /// Every bidder metadata account belonging to the given auction.
    fn bidder_metadata_for_auction(
        &self,
        auction: &Pubkey,
    ) -> Result<Vec<(Pubkey, BidderMetadata)>, BillingError>;

    fn get_record<T: AccountRecord>(&self, pubkey: &Pubkey) -> Result<Option<T>, BillingError>
    where
        Self: Sized,
    {
        match self.get_account_data(pubkey)? {
            Some(data) => T::unpack(pubkey, &data).map(Some),
            None => Ok(None),
        }
    }

    /// Fetches and parses the accounts that exist, keeping their position
    /// in `pubkeys`.
    fn get_multiple_records<T: AccountRecord>(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<T>>, BillingError>
    where
        Self: Sized,
    {
        self.get_multiple_account_data(pubkeys)?
            .into_iter()
            .zip(pubkeys)
            .map(|(data, pubkey)| match data {
                Some(data) => T::unpack(pubkey, &data).map(Some),
                None => Ok(None),
            })
            .collect()
    }
}

/// Chain level capabilities on top of account lookups.
pub trait ChainClient: AccountStore {
    fn program_ids(&self) -> &ProgramIds;

    fn bidder_pot_key(&self, auction: &Pubkey, bidder: &Pubkey) -> Result<Pubkey, BillingError> {
        pda::bidder_pot_pubkey(self.program_ids(), auction, bidder)
    }

    fn bid_redemption_key(&self, auction: &Pubkey, bidder: &Pubkey) -> Result<Pubkey, BillingError> {
        pda::bid_redemption_pubkey(self.program_ids(), auction, bidder)
    }

    fn payout_ticket_key(
        &self,
        auction_manager: &Pubkey,
        slot: &PayoutSlot,
    ) -> Result<Pubkey, BillingError> {
        pda::payout_ticket_pubkey(self.program_ids(), auction_manager, slot)
    }

    fn metadata_key(&self, mint: &Pubkey) -> Result<Pubkey, BillingError> {
        pda::metadata_pubkey(self.program_ids(), mint)
    }

    /// Raw token amount held by an SPL token account.
    fn token_account_balance(&self, pubkey: &Pubkey) -> Result<u64, BillingError> {
        let data = self
            .get_account_data(pubkey)?
            .ok_or(BillingError::MissingAccount {
                kind: "token",
                pubkey: *pubkey,
            })?;
        let account = TokenAccount::unpack_from_slice(&data).map_err(|_| {
            BillingError::InvalidAccountData {
                kind: "token",
                pubkey: *pubkey,
            }
        })?;
        Ok(account.amount)
    }
}
