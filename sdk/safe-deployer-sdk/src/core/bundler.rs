use crate::core::rpc::JsonRpcClient;
use crate::error::RpcError;
use crate::types::{UserOperation, UserOperationGasEstimate, UserOperationReceipt};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::json;

/// ERC-4337 bundler RPC surface used by the SDK
#[async_trait]
pub trait BundlerClient: Send + Sync {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, RpcError>;

    async fn estimate_user_operation_gas(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimate, RpcError>;

    /// Returns the user operation hash
    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, RpcError>;

    /// `None` until the operation is included on-chain
    async fn get_user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, RpcError>;
}

/// [`BundlerClient`] over HTTP JSON-RPC.
///
/// The endpoint URL usually embeds the access key, so it is never logged.
#[derive(Debug)]
pub struct HttpBundlerClient {
    rpc: JsonRpcClient,
}

impl HttpBundlerClient {
    pub fn new(url: reqwest::Url) -> Self {
        Self {
            rpc: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl BundlerClient for HttpBundlerClient {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, RpcError> {
        self.rpc
            .request("eth_supportedEntryPoints", json!([]))
            .await
    }

    async fn estimate_user_operation_gas(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimate, RpcError> {
        self.rpc
            .request(
                "eth_estimateUserOperationGas",
                json!([user_op, entry_point]),
            )
            .await
    }

    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, RpcError> {
        self.rpc
            .request("eth_sendUserOperation", json!([user_op, entry_point]))
            .await
    }

    async fn get_user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, RpcError> {
        self.rpc
            .request("eth_getUserOperationReceipt", json!([hash]))
            .await
    }
}
