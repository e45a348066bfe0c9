use crate::core::network::NetworkConfig;
use crate::core::rpc::JsonRpcClient;
use crate::error::{RpcError, Result, SafeSdkError};
use alloy_primitives::{Address, Bytes, U64};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// EIP-1193 style wallet boundary.
/// This allows the SDK to work with:
/// 1. Wallets exposing a JSON-RPC endpoint (Frame, a local signer daemon)
/// 2. In-process doubles in tests
///
/// Every method may suspend on a user prompt in the wallet UI. A declined
/// prompt surfaces as [`RpcError::ErrorResponse`] with code 4001.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: ask the user to expose accounts
    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError>;

    /// `eth_accounts`: accounts already exposed, no prompt
    async fn accounts(&self) -> Result<Vec<Address>, RpcError>;

    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_signTypedData_v4` with an EIP-712 JSON document
    async fn sign_typed_data(&self, signer: Address, typed_data: &Value)
        -> Result<Bytes, RpcError>;
}

/// [`WalletProvider`] reached over JSON-RPC
#[derive(Debug)]
pub struct Eip1193HttpProvider {
    rpc: JsonRpcClient,
}

impl Eip1193HttpProvider {
    pub fn new(url: reqwest::Url) -> Self {
        Self {
            rpc: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl WalletProvider for Eip1193HttpProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.rpc.request("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn sign_typed_data(
        &self,
        signer: Address,
        typed_data: &Value,
    ) -> Result<Bytes, RpcError> {
        // v4 takes the document as a JSON string
        let document = serde_json::to_string(typed_data)?;
        self.rpc
            .request("eth_signTypedData_v4", json!([signer, document]))
            .await
    }
}

/// Chain-write client: a wallet provider bound to one network.
#[derive(Clone)]
pub struct WalletClient {
    provider: Arc<dyn WalletProvider>,
    network: NetworkConfig,
}

impl WalletClient {
    pub fn new(provider: Arc<dyn WalletProvider>, network: NetworkConfig) -> Self {
        Self { provider, network }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Accounts already authorized, first one is the active account
    pub async fn addresses(&self) -> Result<Vec<Address>> {
        Ok(self.provider.accounts().await?)
    }

    pub async fn primary_address(&self) -> Result<Address> {
        self.addresses()
            .await?
            .first()
            .copied()
            .ok_or(SafeSdkError::NoAccounts)
    }

    /// Sign typed data and normalize the recovery byte to 27/28
    pub async fn sign_typed_data(&self, signer: Address, typed_data: &Value) -> Result<Bytes> {
        let signature = self.provider.sign_typed_data(signer, typed_data).await?;
        crate::utils::normalize_signature(&signature)
    }
}

impl std::fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletClient")
            .field("chain_id", &self.network.chain_id)
            .finish()
    }
}
