use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Billing report of a Metaplex auction (default cluster = testnet)")]
pub struct BillingReportOpt {
    #[structopt(
        long,
        short = "-l",
        help("Sets connection url to localhost"),
        conflicts_with("mainnet"),
        conflicts_with("devnet")
    )]
    pub localnet: bool,
    #[structopt(
        long,
        short = "-d",
        help("Sets connection url to devnet"),
        conflicts_with("mainnet"),
        conflicts_with("localnet")
    )]
    pub devnet: bool,
    #[structopt(
        long,
        short = "-m",
        help("Sets connection url to mainnet"),
        conflicts_with("devnet"),
        conflicts_with("localnet")
    )]
    pub mainnet: bool,
    #[structopt(long, parse(from_os_str), help("JSON file describing the auction"))]
    pub auction_view: PathBuf,
    #[structopt(long, short, help("Keep polling and log the report when it changes"))]
    pub watch: bool,
    #[structopt(
        long,
        default_value = "5000",
        help("Polling interval in milliseconds when watching")
    )]
    pub interval: u64,
    #[structopt(long, default_value = "9", help("Decimals of the payment mint"))]
    pub decimals: u8,
    #[structopt(long, help("Overrides the auction program id"))]
    pub auction_program: Option<Pubkey>,
    #[structopt(long, help("Overrides the metaplex program id"))]
    pub metaplex_program: Option<Pubkey>,
    #[structopt(long, help("Overrides the token metadata program id"))]
    pub token_metadata_program: Option<Pubkey>,
}
