use clap::Parser;

use resv::{init_tracing, ConnectionArgs};
use resv_client::RestClient;
use resv_core::error::ResvResult;
use resv_core::workflow::run_listing;

#[derive(Parser)]
#[command(name = "resv-list")]
#[command(about = "List virtual machines whose name matches a pattern", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print also the power state of the VM
    #[arg(short = 'P', long)]
    powerstate: bool,

    /// Print also the IP addresses of the VM
    #[arg(short = 'I', long)]
    ips: bool,
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
    let vms = run_listing(&client, &cli.connection.vms).await?;

    for vm in &vms {
        let mut line = format!("{} ({})", vm.name, vm.id);
        if cli.powerstate {
            line.push_str(&format!(" {}", vm.power_state));
        }
        if cli.ips {
            line.push_str(&format!(" {}", vm.ip_addresses.join(",")));
        }
        println!("{}", line);
    }
    Ok(())
}
