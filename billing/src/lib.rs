//! Billing and settlement reconciliation of [Metaplex](https://www.metaplex.com/)
//! auctions on the [Solana](https://solana.com/) blockchain.
//!
//! Computes what an auction is worth, what has already been paid out to its
//! creators and auctioneer, and which winning bids are still waiting to be
//! settled. Nothing here moves funds.
mod error;

/// Capabilities for reading accounts and resolving keys on chain.
pub mod client;
/// Program addresses the derived keys are computed against.
pub mod config;
/// Program Derived Addresses of the accounts involved in billing.
pub mod pda;
/// Pure derivations of the billing state.
pub mod reconcile;
/// Loading a consistent set of accounts for reconciliation.
pub mod snapshot;
/// Parsed on-chain records.
pub mod state;

pub use error::BillingError;
pub use solana_program;
