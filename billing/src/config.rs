use solana_program::pubkey::Pubkey;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

pub mod auction_program {
    solana_program::declare_id!("auctxRXPeJoc4817jDhf4HbjnhEcr1cCXenosMhK5R8");
}

pub mod metaplex_program {
    solana_program::declare_id!("p1exdMJcjVao65QdewkaZRUnU6VPSXhus9n2GzWfh98");
}

pub mod token_metadata_program {
    solana_program::declare_id!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
}

/// Addresses of the programs owning the accounts read during
/// reconciliation.
///
/// Passed explicitly to every key derivation so that different clusters (or
/// forks of the programs) can be targeted side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "camelCase"))]
pub struct ProgramIds {
    #[cfg_attr(feature = "client", serde(with = "crate::state::pubkey_string"))]
    pub auction: Pubkey,
    #[cfg_attr(feature = "client", serde(with = "crate::state::pubkey_string"))]
    pub metaplex: Pubkey,
    #[cfg_attr(feature = "client", serde(with = "crate::state::pubkey_string"))]
    pub token_metadata: Pubkey,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            auction: auction_program::ID,
            metaplex: metaplex_program::ID,
            token_metadata: token_metadata_program::ID,
        }
    }
}
