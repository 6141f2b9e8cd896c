mod commands;

use clap::{Parser, Subcommand};
use clusterflow_cloud::{CredentialResolver, ProvisionHandler, ProvisioningDriver};
use clusterflow_cloud_aws::SecretsManagerStore;
use clusterflow_cloud_gcp::GkeClientFactory;
use commands::DescriptorArgs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clusterflow")]
#[command(about = "Create a GKE cluster and wait until it is available", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the cluster, or resume a create already in flight
    Create {
        #[command(flatten)]
        descriptor: DescriptorArgs,
        /// Directory holding continuation state
        #[arg(long, env = "CLUSTERFLOW_STATE_DIR")]
        state_dir: Option<PathBuf>,
        /// Perform a single create-or-poll step and exit
        #[arg(long)]
        once: bool,
    },
    /// Show the stored continuation for a cluster
    Status {
        #[command(flatten)]
        descriptor: DescriptorArgs,
        /// Directory holding continuation state
        #[arg(long, env = "CLUSTERFLOW_STATE_DIR")]
        state_dir: Option<PathBuf>,
    },
    /// Discard the stored continuation for a cluster
    Reset {
        #[command(flatten)]
        descriptor: DescriptorArgs,
        /// Directory holding continuation state
        #[arg(long, env = "CLUSTERFLOW_STATE_DIR")]
        state_dir: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("clusterflow {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Create {
            descriptor,
            state_dir,
            once,
        } => {
            let descriptor = descriptor.resolve()?;
            let store = commands::open_store(state_dir)?;
            let handler = ProvisionHandler::new(
                CredentialResolver::new(SecretsManagerStore::new(), GkeClientFactory::new()),
                ProvisioningDriver::default(),
            );
            commands::create::handle(&handler, &store, &descriptor, once).await
        }
        Commands::Status {
            descriptor,
            state_dir,
        } => {
            let descriptor = descriptor.resolve()?;
            let store = commands::open_store(state_dir)?;
            commands::status::handle(&store, &descriptor).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Reset {
            descriptor,
            state_dir,
        } => {
            let descriptor = descriptor.resolve()?;
            let store = commands::open_store(state_dir)?;
            commands::reset::handle(&store, &descriptor).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
