use clap::Parser;

use resv::{init_tracing, ConnectionArgs, StdoutReporter};
use resv_client::RestClient;
use resv_core::config::AdjustConfig;
use resv_core::error::ResvResult;
use resv_core::workflow::run_adjustment;

#[derive(Parser)]
#[command(name = "resv-adjust")]
#[command(about = "Double the CPU and memory reservations of matching VMs", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> ResvResult<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = cli.connection.endpoint_config()?;
    let client = RestClient::connect(&config).await?;

    let adjust = AdjustConfig::new(&cli.connection.vms);
    let summary = run_adjustment(&client, &adjust, &StdoutReporter).await?;

    // Per-VM failures were already reported as they happened; repeat them
    // in a short summary but leave the exit code untouched.
    if summary.failed_count() > 0 {
        eprintln!(
            "{} of {} updates failed",
            summary.failed_count(),
            summary.outcomes.len()
        );
        for outcome in summary.failed() {
            if let Err(error) = &outcome.result {
                eprintln!("  {}: {}", outcome.vm_name, error);
            }
        }
    }
    Ok(())
}
