use super::{AccountStore, ChainClient};
use crate::config::ProgramIds;
use crate::error::BillingError;
use crate::state::{AccountRecord, BidderMetadata};

use solana_account_decoder::UiAccountEncoding;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType};
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;

/// Upper limit of accounts in a single `getMultipleAccounts` request.
const MAX_MULTIPLE_ACCOUNTS: usize = 100;
/// Serialized size of a [`BidderMetadata`] account.
const BIDDER_METADATA_LEN: u64 = 32 + 32 + 8 + 8 + 1;
/// Offset of the auction key within a [`BidderMetadata`] account.
const BIDDER_METADATA_AUCTION_OFFSET: usize = 32;

/// [`ChainClient`] backed by a Solana JSON RPC node.
pub struct RpcChainClient {
    client: RpcClient,
    commitment: CommitmentConfig,
    program_ids: ProgramIds,
}

impl RpcChainClient {
    pub fn new(url: String, program_ids: ProgramIds) -> Self {
        Self::new_with_commitment(url, CommitmentConfig::confirmed(), program_ids)
    }

    pub fn new_with_commitment(
        url: String,
        commitment: CommitmentConfig,
        program_ids: ProgramIds,
    ) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url, commitment),
            commitment,
            program_ids,
        }
    }
}

impl AccountStore for RpcChainClient {
    fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, BillingError> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, self.commitment)?;
        Ok(response.value.map(|account| account.data))
    }

    fn get_multiple_account_data(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, BillingError> {
        let mut accounts = Vec::with_capacity(pubkeys.len());
        for chunk in pubkeys.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let response = self
                .client
                .get_multiple_accounts_with_commitment(chunk, self.commitment)?;
            accounts.extend(
                response
                    .value
                    .into_iter()
                    .map(|account| account.map(|account| account.data)),
            );
        }
        Ok(accounts)
    }

    fn bidder_metadata_for_auction(
        &self,
        auction: &Pubkey,
    ) -> Result<Vec<(Pubkey, BidderMetadata)>, BillingError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(BIDDER_METADATA_LEN),
                RpcFilterType::Memcmp(Memcmp {
                    offset: BIDDER_METADATA_AUCTION_OFFSET,
                    bytes: MemcmpEncodedBytes::Base58(auction.to_string()),
                    encoding: None,
                }),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            with_context: None,
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(&self.program_ids.auction, config)?;

        accounts
            .into_iter()
            .map(|(pubkey, account)| {
                BidderMetadata::unpack(&pubkey, &account.data).map(|metadata| (pubkey, metadata))
            })
            .collect()
    }
}

impl ChainClient for RpcChainClient {
    fn program_ids(&self) -> &ProgramIds {
        &self.program_ids
    }
}
