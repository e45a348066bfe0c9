use crate::core::rpc::JsonRpcClient;
use crate::error::RpcError;
use crate::types::TransactionReceipt;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde_json::json;

/// Read-only view of the chain the smart account lives on.
#[async_trait]
pub trait EvmConnection: Send + Sync {
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError>;

    async fn gas_price(&self) -> Result<U256, RpcError>;

    /// `None` while the transaction is still pending
    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError>;
}

/// [`EvmConnection`] backed by a JSON-RPC node
#[derive(Debug)]
pub struct HttpConnection {
    rpc: JsonRpcClient,
}

impl HttpConnection {
    pub fn new(url: reqwest::Url) -> Self {
        Self {
            rpc: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl EvmConnection for HttpConnection {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.rpc
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        self.rpc
            .request("eth_getCode", json!([address, "latest"]))
            .await
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        self.rpc.request("eth_gasPrice", json!([])).await
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.rpc
            .request("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
