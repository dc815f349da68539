use crate::cli_opts::BillingReportOpt;

use auction_billing::config::ProgramIds;
use auction_billing::reconcile::BillingReport;
use auction_billing::state::AuctionView;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn cluster_url(opt: &BillingReportOpt) -> &'static str {
    if opt.mainnet {
        "https://api.mainnet-beta.solana.com"
    } else if opt.devnet {
        "https://api.devnet.solana.com"
    } else if opt.localnet {
        "http://localhost:8899"
    } else {
        "https://api.testnet.solana.com"
    }
}

pub fn program_ids(opt: &BillingReportOpt) -> ProgramIds {
    let defaults = ProgramIds::default();
    ProgramIds {
        auction: opt.auction_program.unwrap_or(defaults.auction),
        metaplex: opt.metaplex_program.unwrap_or(defaults.metaplex),
        token_metadata: opt.token_metadata_program.unwrap_or(defaults.token_metadata),
    }
}

pub fn read_auction_view(path: &Path) -> Result<AuctionView, anyhow::Error> {
    let file = File::open(path)?;
    let view = serde_json::from_reader(BufReader::new(file))?;
    Ok(view)
}

pub fn to_ui_amount(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10_f64.powi(i32::from(decimals))
}

pub fn log_report(report: &BillingReport, decimals: u8) {
    let totals = &report.totals;
    let ui = |amount| to_ui_amount(amount, decimals);
    info!("total auction value:          {}", ui(totals.total_auction_value));
    info!("total auction redeemed value: {}", ui(totals.total_redeemed_value));
    info!("total collected:              {}", ui(totals.total_collected));
    info!("total unsettled:              {}", ui(totals.total_unsettled));
    if let Some(escrow_balance) = report.escrow_balance {
        info!("total in escrow:              {}", ui(escrow_balance));
    }
    if report.has_participation {
        info!(
            "unredeemed participation fees outstanding: {}",
            ui(totals.outstanding_participation_fees)
        );
    }
    for (recipient, payouts) in report.payouts.iter() {
        info!(
            "paid to {}: {} ({} tickets)",
            recipient,
            ui(payouts.sum),
            payouts.tickets.len()
        );
    }
    for bid in report.bids_to_claim.iter() {
        info!(
            "unsettled bid of {}: {}    pot: {}",
            bid.metadata.bidder_pubkey,
            ui(bid.metadata.last_bid),
            bid.pot.bidder_pot
        );
    }
}

#[test]
fn ui_amount_test() {
    assert_eq!(to_ui_amount(1_500_000_000, 9), 1.5);
    assert_eq!(to_ui_amount(25, 0), 25.0);
    assert_eq!(to_ui_amount(0, 6), 0.0);
}
