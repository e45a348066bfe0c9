// Example: computing the counterfactual address of a 1-of-1 Safe
//
// This example demonstrates how to:
// 1. Resolve the Safe 1.4.1 deployment contracts
// 2. Read the proxy creation code from the factory
// 3. Derive the address the Safe will have once deployed
//
// Run against Rootstock testnet (or set SAFE_DEPLOYER_RPC_URL):
//   cargo run --example derive_address -- 0x<owner address>

use alloy_primitives::{Address, U256};
use safe_deployer_sdk::core::constants::SafeDeployment;
use safe_deployer_sdk::core::connection::HttpConnection;
use safe_deployer_sdk::utils;
use safe_deployer_sdk::{derive_safe_address, AccountSpec, DeployerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Owner from the command line
    let owner: Address = std::env::args()
        .nth(1)
        .ok_or("usage: derive_address <owner>")?
        .parse()?;

    // 2. Network and contracts
    let config = DeployerConfig::load(None)?;
    let deployment = SafeDeployment::for_version(&config.safe.version)?;
    let connection = HttpConnection::new(config.rpc_endpoint()?);

    // 3. Proxy bytecode, then the CREATE2 address
    let code = utils::fetch_proxy_creation_code(&connection, &deployment).await?;
    let safe = derive_safe_address(
        &AccountSpec::single_owner(owner),
        &deployment,
        U256::from(config.safe.salt_nonce),
        &code,
    );

    println!("Safe {} for owner {}:", config.safe.version, owner);
    println!("  Address:  {}", safe);
    println!("  Explorer: {}", config.network.address_url(&safe));

    // Deploying it takes a wallet and a bundler; see DeploymentController.
    Ok(())
}
