// Entrypoint for the claim run.
// - Configuration or bootstrap problems are fatal and exit with status 1.
// - Anything that goes wrong inside an account is reported and the run
//   still exits with status 0.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vip_claim::api::ApiClient;
use vip_claim::config::{load_accounts, Cli};
use vip_claim::processor::{display_date, Processor};
use vip_claim::service::ServiceGuard;
use vip_claim::ui::{self, SpinnerPause};

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ui::error(&format!("\nFatal error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let entries = load_accounts(cli.userinfo.as_deref())?;
    info!(accounts = entries.len(), "loaded USERINFO");

    let mut pause = SpinnerPause;
    let service = ServiceGuard::start(cli.service_cmd.as_deref(), cli.warmup(), &mut pause)?;
    let api = ApiClient::new(&cli.api_url, cli.timeout()).context("Failed to set up the API client")?;
    info!(base_url = api.base_url(), "API client ready");

    let date = display_date(chrono::Utc::now());
    let mut processor = Processor::new(api, pause, cli.claim_settings(), date);
    let report = processor.run(&entries);
    report.summarize();

    service.close();
    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vip_claim=debug,warn")
    } else {
        EnvFilter::new("vip_claim=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
