mod cli_opts;
mod cli_utils;

use cli_opts::BillingReportOpt;
use cli_utils::*;

use auction_billing::client::rpc::RpcChainClient;
use auction_billing::reconcile::{BillingReconciler, BillingReport, BillingTotals};
use auction_billing::snapshot::{load_snapshot, PayoutTicketCache};
use auction_billing::state::AuctionView;
use auction_billing::BillingError;

use env_logger::Env;
use log::{error, info, warn};
use structopt::StructOpt;

const MAX_ERROR_STREAK: u8 = 20;

pub fn main() {
    let opt = BillingReportOpt::from_args();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(opt: BillingReportOpt) -> Result<(), anyhow::Error> {
    let connection_url = cluster_url(&opt);
    let view = read_auction_view(&opt.auction_view)?;
    let client = RpcChainClient::new(connection_url.to_owned(), program_ids(&opt));
    info!("auction {}    cluster: {}", view.auction, connection_url);

    let mut cache = PayoutTicketCache::new();
    let mut last_totals: Option<BillingTotals> = None;
    let mut error_streak: u8 = 0;
    loop {
        match report(&client, &view, &mut cache) {
            Ok(report) => {
                error_streak = 0;
                if last_totals != Some(report.totals) {
                    log_report(&report, opt.decimals);
                    last_totals = Some(report.totals);
                }
            }
            Err(e) if !opt.watch => return Err(e.into()),
            Err(e) => {
                if !keep_watching(&e, &mut error_streak) {
                    anyhow::bail!("giving up after {} consecutive errors", error_streak);
                }
            }
        }

        if !opt.watch {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_millis(opt.interval));
    }
}

/// Logs a failed poll. Returns `false` once the errors have piled up.
fn keep_watching(e: &BillingError, error_streak: &mut u8) -> bool {
    if e.is_not_ready() {
        warn!("{}, retrying", e);
        return true;
    }
    *error_streak += 1;
    error!("{}    error streak: {}", e, error_streak);
    *error_streak <= MAX_ERROR_STREAK
}

fn report(
    client: &RpcChainClient,
    view: &AuctionView,
    cache: &mut PayoutTicketCache,
) -> Result<BillingReport, BillingError> {
    let snapshot = load_snapshot(client, view, cache)?;
    BillingReconciler::new(&snapshot).reconcile()
}
