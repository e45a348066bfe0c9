// Safe smart-account deployer CLI
//
// `create` is the interactive flow: connect the configured wallet, derive
// the Safe address, send the deployment user operation and wait for it.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use safe_deployer_sdk::core::connection::HttpConnection;
use safe_deployer_sdk::core::constants::SafeDeployment;
use safe_deployer_sdk::{
    derive_safe_address, utils, AccountSpec, DeployerConfig, DeploymentController,
    DeploymentState, DeploymentStatus, NetworkConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a 1-of-1 Safe owned by the wallet's first account
    Create {
        /// TOML configuration file
        #[clap(long, short)]
        config: Option<PathBuf>,
    },

    /// Print the counterfactual Safe address for an owner
    Address {
        /// Owner address
        #[clap(long)]
        owner: Address,

        /// TOML configuration file
        #[clap(long, short)]
        config: Option<PathBuf>,
    },

    /// Show the configured network and bundler
    Network {
        /// TOML configuration file
        #[clap(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Create { config } => {
            let config = DeployerConfig::load(config.as_deref())?;
            create(&config).await
        },
        Commands::Address { owner, config } => {
            let config = DeployerConfig::load(config.as_deref())?;
            address(&config, owner).await?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Network { config } => {
            let config = DeployerConfig::load(config.as_deref())?;
            network(&config);
            Ok(ExitCode::SUCCESS)
        },
    }
}

async fn create(config: &DeployerConfig) -> Result<ExitCode> {
    let controller =
        DeploymentController::from_config(config).context("cannot set up deployment clients")?;
    let printer = tokio::spawn(print_progress(
        controller.subscribe_events(),
        controller.network().clone(),
    ));

    let status = controller.deploy().await;
    drop(controller);
    printer.await.context("status printer panicked")?;

    match status.state {
        DeploymentState::Deployed => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

/// One line per published transition, plus the explorer link once the
/// address is known
async fn print_progress(mut rx: broadcast::Receiver<DeploymentStatus>, network: NetworkConfig) {
    let mut link_printed = false;
    loop {
        let status = match rx.recv().await {
            Ok(status) => status,
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("status printer skipped {} transitions", skipped);
                continue;
            },
            Err(RecvError::Closed) => break,
        };
        println!("{}", status.status_line());
        if !link_printed {
            if let Some(link) = status.explorer_link(&network) {
                println!("  {}", link);
                link_printed = true;
            }
        }
        if status.state.is_terminal() {
            break;
        }
    }
}

async fn address(config: &DeployerConfig, owner: Address) -> Result<()> {
    let options = config.account_options()?;
    let deployment = SafeDeployment::for_version(&options.version)?;

    let code = match options.proxy_creation_code {
        Some(code) => code,
        None => {
            let connection = HttpConnection::new(config.rpc_endpoint()?);
            utils::fetch_proxy_creation_code(&connection, &deployment)
                .await
                .context("cannot read proxy creation code")?
        },
    };

    let safe = derive_safe_address(
        &AccountSpec::single_owner(owner),
        &deployment,
        options.salt_nonce,
        &code,
    );
    log::debug!("salt nonce {}", options.salt_nonce);
    println!("{}", safe);
    println!("  {}", config.network.address_url(&safe));
    Ok(())
}

fn network(config: &DeployerConfig) {
    let network = &config.network;
    println!("{} (chain id {})", network.name, network.chain_id);
    println!("  RPC:      {}", network.rpc_url().unwrap_or("<none>"));
    println!("  Explorer: {}", network.block_explorer.url);
    println!("  Currency: {}", network.native_currency.symbol);
    println!("  Bundler:  {}", config.bundler.redacted());
    match &config.wallet.url {
        Some(url) => println!("  Wallet:   {}", url),
        None => println!("  Wallet:   not configured"),
    }
}
