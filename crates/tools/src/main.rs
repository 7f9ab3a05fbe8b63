use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use uhuru_tools::artifacts::DEFAULT_ARTIFACTS_DIR;
use uhuru_tools::config::{DEFAULT_CONFIG_FILE, DEFAULT_NETWORK};
use uhuru_tools::deploy::{self, DEFAULT_CONTRACT};
use uhuru_tools::settings::DEFAULT_SETTINGS_FILE;
use uhuru_tools::{ArtifactStore, RpcClient, Settings, ToolchainConfig};

#[derive(Parser)]
#[command(name = "uhuru")]
#[command(about = "Uhuru tools for NFT contract deployment")]
struct Cli {
    /// Settings file holding API and signing keys
    #[arg(long, global = true, env = "UHURU_ENV_FILE", default_value = DEFAULT_SETTINGS_FILE)]
    env_file: PathBuf,
    /// Toolchain configuration file
    #[arg(long, global = true, env = "UHURU_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a compiled contract and print its address
    Deploy {
        /// Network to deploy to
        #[arg(short, long, default_value = DEFAULT_NETWORK)]
        network: String,
        /// Contract name as found in the artifacts
        #[arg(short, long, default_value = DEFAULT_CONTRACT)]
        contract: String,
        /// Compiled artifacts directory
        #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
        artifacts: PathBuf,
    },
    /// Show the resolved configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List signing accounts for a network
    Accounts {
        #[arg(short, long, default_value = DEFAULT_NETWORK)]
        network: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.env_file);
    let config = ToolchainConfig::load(&cli.config)
        .map_err(|err| anyhow!("failed to load {}: {err}", cli.config.display()))?;

    match cli.command {
        Commands::Deploy {
            network,
            contract,
            artifacts,
        } => {
            let profile = config.profile(&network, &settings)?;
            tracing::info!(%profile, solidity = %config.solidity, "connecting");
            let client = RpcClient::new(&profile)?;
            let store = ArtifactStore::new(artifacts);

            let result = deploy::run(&client, &store, &contract).await?;
            println!("{result}");
            Ok(())
        }
        Commands::Config { json } => {
            let summary = config.summary(&settings);
            if json {
                println!("{}", summary.to_json()?);
            } else {
                summary.print_summary();
            }
            Ok(())
        }
        Commands::Accounts { network } => {
            let profile = config.profile(&network, &settings)?;
            for address in profile.addresses() {
                println!("{address}");
            }
            Ok(())
        }
    }
}
