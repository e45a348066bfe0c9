use crate::advanced::instructions;
use crate::core::connection::EvmConnection;
use crate::core::constants::SafeDeployment;
use crate::error::{Result, SafeSdkError};
use crate::types::{AccountSpec, PollingConfig, TransactionReceipt};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use tokio::time::Instant;

//=============================================================================
// Address Derivation Helpers
//=============================================================================

/// CREATE2 salt used by `createProxyWithNonce`:
/// `keccak256(keccak256(initializer) ++ uint256(saltNonce))`
pub fn safe_salt(initializer: &[u8], salt_nonce: U256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(keccak256(initializer).as_slice());
    preimage[32..].copy_from_slice(&salt_nonce.to_be_bytes::<32>());
    keccak256(preimage)
}

/// `keccak256(proxyCreationCode ++ uint256(singleton))`
pub fn proxy_init_code_hash(proxy_creation_code: &[u8], singleton: Address) -> B256 {
    let mut init_code = Vec::with_capacity(proxy_creation_code.len() + 32);
    init_code.extend_from_slice(proxy_creation_code);
    init_code.extend_from_slice(&[0u8; 12]);
    init_code.extend_from_slice(singleton.as_slice());
    keccak256(init_code)
}

/// Address of a contract created with CREATE2 by `deployer`
pub fn create2_address(deployer: Address, salt: B256, init_code_hash: B256) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..].copy_from_slice(init_code_hash.as_slice());
    Address::from_slice(&keccak256(preimage)[12..])
}

/// Counterfactual address of the Safe described by `spec`.
///
/// Pure: identical inputs always give the identical address, whether or not
/// the account exists on-chain yet.
pub fn derive_safe_address(
    spec: &AccountSpec,
    deployment: &SafeDeployment,
    salt_nonce: U256,
    proxy_creation_code: &[u8],
) -> Address {
    let initializer = instructions::setup_initializer(spec, deployment);
    let salt = safe_salt(&initializer, salt_nonce);
    let init_code_hash = proxy_init_code_hash(proxy_creation_code, deployment.singleton);
    create2_address(deployment.proxy_factory, salt, init_code_hash)
}

/// Read the proxy bytecode the factory deploys
pub async fn fetch_proxy_creation_code(
    connection: &(impl EvmConnection + ?Sized),
    deployment: &SafeDeployment,
) -> Result<Bytes> {
    let ret = connection
        .call(deployment.proxy_factory, instructions::proxy_creation_code())
        .await?;
    let code = instructions::decode_proxy_creation_code(&ret)?;
    if code.is_empty() {
        return Err(SafeSdkError::Config(format!(
            "proxy factory {} returned empty creation code; is Safe {} deployed on this chain?",
            deployment.proxy_factory,
            crate::core::constants::SAFE_VERSION
        )));
    }
    Ok(code)
}

//=============================================================================
// Signature Helpers
//=============================================================================

/// Normalize a 65-byte ECDSA signature so that `v` is 27 or 28, the form
/// the Safe contracts expect for owner signatures.
pub fn normalize_signature(signature: &[u8]) -> Result<Bytes> {
    if signature.len() != 65 {
        return Err(SafeSdkError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let mut sig = signature.to_vec();
    match sig[64] {
        0 | 1 => sig[64] += 27,
        27 | 28 => {},
        v => {
            return Err(SafeSdkError::InvalidSignature(format!(
                "unexpected recovery byte {}",
                v
            )))
        },
    }
    Ok(sig.into())
}

//=============================================================================
// Receipt Polling
//=============================================================================

/// Poll `eth_getTransactionReceipt` until the transaction is mined.
///
/// Fails on timeout, and with [`SafeSdkError::Reverted`] when the receipt
/// carries a failing status.
pub async fn wait_for_transaction_receipt(
    connection: &(impl EvmConnection + ?Sized),
    hash: B256,
    polling: &PollingConfig,
) -> Result<TransactionReceipt> {
    let started = Instant::now();
    loop {
        if let Some(receipt) = connection.get_transaction_receipt(hash).await? {
            if !receipt.succeeded() {
                return Err(SafeSdkError::Reverted(hash));
            }
            return Ok(receipt);
        }
        if started.elapsed() >= polling.timeout {
            return Err(SafeSdkError::Timeout {
                what: format!("receipt of transaction {}", hash),
                elapsed: started.elapsed(),
            });
        }
        tokio::time::sleep(polling.interval).await;
    }
}

/// `0x12345678…` form used in status lines
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}…", &full[..10])
}
