#![allow(dead_code)]

use alloy_primitives::{address, Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use safe_deployer_sdk::advanced::instructions;
use safe_deployer_sdk::core::bundler::BundlerClient;
use safe_deployer_sdk::core::connection::EvmConnection;
use safe_deployer_sdk::core::signer::WalletProvider;
use safe_deployer_sdk::error::{RpcError, USER_REJECTED_REQUEST};
use safe_deployer_sdk::types::{
    PollingConfig, TransactionReceipt, UserOperation, UserOperationGasEstimate,
    UserOperationReceipt,
};
use safe_deployer_sdk::{DeploymentController, NetworkConfig, SafeAccountOptions};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OWNER: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const BUNDLE_TX: B256 = B256::repeat_byte(0x77);
pub const USER_OP_HASH: B256 = B256::repeat_byte(0x42);
pub const GAS_PRICE: u64 = 65_164_000;

/// Stand-in for the factory's `proxyCreationCode()`
pub fn proxy_creation_code() -> Bytes {
    Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15])
}

pub fn rejection(message: &str) -> RpcError {
    RpcError::ErrorResponse {
        code: USER_REJECTED_REQUEST,
        message: message.to_string(),
        data: None,
    }
}

pub fn rpc_error(code: i64, message: &str) -> RpcError {
    RpcError::ErrorResponse {
        code,
        message: message.to_string(),
        data: None,
    }
}

/// ABI encoding of a single `bytes` return value
fn abi_encode_bytes(data: &[u8]) -> Bytes {
    let mut out = Vec::new();
    out.extend_from_slice(&U256::from(32).to_be_bytes::<32>());
    out.extend_from_slice(&U256::from(data.len()).to_be_bytes::<32>());
    out.extend_from_slice(data);
    let pad = (32 - data.len() % 32) % 32;
    out.extend(std::iter::repeat(0u8).take(pad));
    out.into()
}

pub fn success_receipt(hash: B256) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        block_hash: Some(B256::repeat_byte(0x01)),
        block_number: Some(U64::from(5_000_000)),
        status: Some(U64::from(1)),
        gas_used: U256::from(350_000),
        from: address!("4337000000000000000000000000000000004337"),
        to: Some(address!("0000000071727De22E5E9d8BAf0edAc6f37da032")),
    }
}

//=============================================================================
// Wallet
//=============================================================================

pub struct FakeWallet {
    pub accounts: Vec<Address>,
    pub account_error: Mutex<Option<RpcError>>,
    pub sign_error: Mutex<Option<RpcError>>,
    pub signed: Mutex<Vec<(Address, Value)>>,
}

impl FakeWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            account_error: Mutex::new(None),
            sign_error: Mutex::new(None),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_accounts(message: &str) -> Self {
        let wallet = Self::new(vec![OWNER]);
        *wallet.account_error.lock().unwrap() = Some(rejection(message));
        wallet
    }

    pub fn rejecting_signature(message: &str) -> Self {
        let wallet = Self::new(vec![OWNER]);
        *wallet.sign_error.lock().unwrap() = Some(rejection(message));
        wallet
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        if let Some(err) = self.account_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(31)
    }

    async fn sign_typed_data(
        &self,
        signer: Address,
        typed_data: &Value,
    ) -> Result<Bytes, RpcError> {
        if let Some(err) = self.sign_error.lock().unwrap().take() {
            return Err(err);
        }
        self.signed
            .lock()
            .unwrap()
            .push((signer, typed_data.clone()));
        // recovery byte in 0/1 form, as some hardware wallets return it
        let mut sig = vec![0x5au8; 64];
        sig.push(0x01);
        Ok(sig.into())
    }
}

//=============================================================================
// Chain
//=============================================================================

pub enum ReceiptBehavior {
    Mined,
    Reverted,
    Pending,
}

pub struct FakeChain {
    pub deployed: bool,
    pub receipt: ReceiptBehavior,
    pub requests: AtomicUsize,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            deployed: false,
            receipt: ReceiptBehavior::Mined,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_receipt(receipt: ReceiptBehavior) -> Self {
        Self {
            receipt,
            ..Self::new()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EvmConnection for FakeChain {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.hit();
        Ok(31)
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.hit();
        let selector = &data[..4];
        if selector == &instructions::proxy_creation_code()[..4] {
            return Ok(abi_encode_bytes(&proxy_creation_code()));
        }
        if selector == &instructions::get_nonce(Address::ZERO)[..4] {
            return Ok(Bytes::from(U256::ZERO.to_be_bytes::<32>().to_vec()));
        }
        Err(rpc_error(-32000, "execution reverted"))
    }

    async fn get_code(&self, _address: Address) -> Result<Bytes, RpcError> {
        self.hit();
        if self.deployed {
            Ok(Bytes::from(vec![0x60, 0x80]))
        } else {
            Ok(Bytes::new())
        }
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        self.hit();
        Ok(U256::from(GAS_PRICE))
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.hit();
        Ok(match self.receipt {
            ReceiptBehavior::Mined => Some(success_receipt(hash)),
            ReceiptBehavior::Reverted => Some(TransactionReceipt {
                status: Some(U64::ZERO),
                ..success_receipt(hash)
            }),
            ReceiptBehavior::Pending => None,
        })
    }
}

//=============================================================================
// Bundler
//=============================================================================

pub struct FakeBundler {
    pub send_error: Mutex<Option<RpcError>>,
    pub receipt_error: Mutex<Option<RpcError>>,
    /// Revert reason reported in the user operation receipt
    pub revert_reason: Option<String>,
    /// Receipt polls answered with `None` before inclusion is reported
    pub pending_polls: AtomicUsize,
    pub sent: Mutex<Vec<UserOperation>>,
    pub requests: AtomicUsize,
}

impl FakeBundler {
    pub fn new() -> Self {
        Self {
            send_error: Mutex::new(None),
            receipt_error: Mutex::new(None),
            revert_reason: None,
            pending_polls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn failing_send(err: RpcError) -> Self {
        let bundler = Self::new();
        *bundler.send_error.lock().unwrap() = Some(err);
        bundler
    }

    pub fn failing_receipt(err: RpcError) -> Self {
        let bundler = Self::new();
        *bundler.receipt_error.lock().unwrap() = Some(err);
        bundler
    }

    pub fn reverting(reason: &str) -> Self {
        Self {
            revert_reason: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn slow_inclusion(polls: usize) -> Self {
        Self {
            pending_polls: AtomicUsize::new(polls),
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<UserOperation> {
        self.sent.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundlerClient for FakeBundler {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, RpcError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(vec![address!("0000000071727De22E5E9d8BAf0edAc6f37da032")])
    }

    async fn estimate_user_operation_gas(
        &self,
        _user_op: &UserOperation,
        _entry_point: Address,
    ) -> Result<UserOperationGasEstimate, RpcError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(UserOperationGasEstimate {
            pre_verification_gas: U256::from(55_000),
            verification_gas_limit: U256::from(480_000),
            call_gas_limit: U256::from(21_000),
        })
    }

    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        _entry_point: Address,
    ) -> Result<B256, RpcError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.send_error.lock().unwrap().take() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(user_op.clone());
        Ok(USER_OP_HASH)
    }

    async fn get_user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, RpcError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.receipt_error.lock().unwrap().take() {
            return Err(err);
        }
        let pending = self
            .pending_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Ok(None);
        }
        let sent = self.sent.lock().unwrap();
        let Some(op) = sent.last() else {
            return Ok(None);
        };
        Ok(Some(UserOperationReceipt {
            user_op_hash: hash,
            sender: op.sender,
            nonce: op.nonce,
            success: self.revert_reason.is_none(),
            reason: self.revert_reason.clone(),
            actual_gas_cost: U256::from(1_000_000),
            actual_gas_used: U256::from(400_000),
            receipt: success_receipt(BUNDLE_TX),
        }))
    }
}

//=============================================================================
// Wiring
//=============================================================================

pub fn test_options() -> SafeAccountOptions {
    SafeAccountOptions {
        polling: PollingConfig {
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(1),
        },
        ..SafeAccountOptions::default()
    }
}

pub fn setup_controller(
    wallet: Option<Arc<FakeWallet>>,
    chain: Arc<FakeChain>,
    bundler: Arc<FakeBundler>,
) -> DeploymentController {
    DeploymentController::new(
        wallet.map(|w| w as Arc<dyn WalletProvider>),
        chain,
        bundler,
        NetworkConfig::rootstock_testnet(),
        test_options(),
    )
}
