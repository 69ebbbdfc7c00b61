//! Shared CLI plumbing for the `resv-list` and `resv-adjust` binaries:
//! the common connection flags, the interactive password prompt and the
//! stdout progress reporter.

use dialoguer::Password;

use resv_core::config::EndpointConfig;
use resv_core::error::{ResvError, ResvResult};
use resv_core::progress::{ProgressEvent, ProgressReporter};
use resv_core::types::{ReservationUpdate, VmRecord};

/// Connection flags shared by both binaries.
#[derive(Debug, clap::Args)]
pub struct ConnectionArgs {
    /// Remote host to connect to
    #[arg(short = 's', long)]
    pub host: String,

    /// Port to connect on
    #[arg(short = 'o', long, default_value_t = 443)]
    pub port: u16,

    /// User name to use when connecting to host
    #[arg(short = 'u', long, default_value_t = default_user())]
    pub user: String,

    /// Password to use when connecting to host. If not supplied, it will
    /// be prompted
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Disable SSL verification for the connection
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Regular expression matching the names of the virtual machines
    #[arg(short = 'v', long)]
    pub vms: String,
}

impl ConnectionArgs {
    /// Resolve the endpoint configuration, prompting for the password
    /// without echoing when it was not supplied on the command line.
    pub fn endpoint_config(&self) -> ResvResult<EndpointConfig> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => Password::new()
                .with_prompt(format!("Enter {}@{}", self.user, self.host))
                .interact()
                .map_err(|e| ResvError::Config {
                    message: format!("password prompt failed: {}", e),
                })?,
        };
        Ok(EndpointConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password,
            insecure: self.insecure,
        })
    }
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

/// Initialize logging; `RUST_LOG` overrides the defaults.
pub fn init_tracing() -> ResvResult<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "resv=info"
            .parse()
            .map_err(|e| ResvError::Config {
                message: format!("Invalid log directive: {}", e),
            })?,
    );
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Prints submission and progress lines to standard output, failures to
/// standard error.
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl ProgressReporter for StdoutReporter {
    fn update_submitted(&self, vm: &VmRecord, update: &ReservationUpdate) {
        println!(
            "Setting the reservation to {} MB and {} MHz for VM {}",
            update.memory_reservation_mb, update.cpu_reservation_mhz, vm.name
        );
    }

    fn task_progress(&self, event: &ProgressEvent) {
        match (event.percent, event.state_text.as_deref()) {
            (Some(percent), _) => {
                println!("Update of VM {} is {}% complete.", event.vm_name, percent)
            }
            (None, Some(text)) => println!("Update of VM {} is {}.", event.vm_name, text),
            (None, None) => {}
        }
    }

    fn update_finished(&self, vm_name: &str, error: Option<&ResvError>) {
        if let Some(error) = error {
            eprintln!("Update of VM {} failed: {}", vm_name, error);
        }
    }
}
