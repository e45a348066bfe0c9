use crate::error::{Result, SafeSdkError};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Owner configuration of a Safe smart account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSpec {
    owner: Address,
    threshold: u32,
    owners: Vec<Address>,
}

impl AccountSpec {
    /// 1-of-1 Safe owned by `owner`
    pub fn single_owner(owner: Address) -> Self {
        Self {
            owner,
            threshold: 1,
            owners: vec![owner],
        }
    }

    /// Build a spec for an arbitrary owner set.
    ///
    /// `owner` is the signing owner and must be part of `owners`. Owner order
    /// is preserved since it is part of the Safe setup call.
    pub fn new(owner: Address, owners: Vec<Address>, threshold: u32) -> Result<Self> {
        if owners.is_empty() {
            return Err(SafeSdkError::InvalidAccountSpec(
                "owner set is empty".to_string(),
            ));
        }
        if threshold == 0 || threshold as usize > owners.len() {
            return Err(SafeSdkError::InvalidAccountSpec(format!(
                "threshold {} out of range 1..={}",
                threshold,
                owners.len()
            )));
        }
        for (i, o) in owners.iter().enumerate() {
            if o.is_zero() {
                return Err(SafeSdkError::InvalidAccountSpec(
                    "zero address cannot be an owner".to_string(),
                ));
            }
            if owners[..i].contains(o) {
                return Err(SafeSdkError::InvalidAccountSpec(format!(
                    "duplicate owner {}",
                    o
                )));
            }
        }
        if !owners.contains(&owner) {
            return Err(SafeSdkError::InvalidAccountSpec(format!(
                "signing owner {} is not in the owner set",
                owner
            )));
        }

        Ok(Self {
            owner,
            threshold,
            owners,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }
}

/// A single call executed by the smart account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    /// Zero-value call with empty payload to the zero address.
    /// Sending it is enough for the bundler to deploy the account.
    pub fn noop() -> Self {
        Self {
            to: Address::ZERO,
            value: U256::ZERO,
            data: Bytes::new(),
        }
    }
}

/// ERC-4337 v0.7 user operation in its JSON-RPC (unpacked) form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub signature: Bytes,
}

impl UserOperation {
    /// `factory ++ factoryData`, empty once the account exists
    pub fn init_code(&self) -> Bytes {
        match (&self.factory, &self.factory_data) {
            (Some(factory), Some(data)) => {
                let mut code = Vec::with_capacity(20 + data.len());
                code.extend_from_slice(factory.as_slice());
                code.extend_from_slice(data);
                code.into()
            },
            _ => Bytes::new(),
        }
    }
}

/// Result of `eth_estimateUserOperationGas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
}

/// Transaction receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` on success, `0x0` on revert. Pre-Byzantium receipts omit it.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: U256,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }
}

/// Result of `eth_getUserOperationReceipt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    pub sender: Address,
    pub nonce: U256,
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actual_gas_cost: U256,
    #[serde(default)]
    pub actual_gas_used: U256,
    pub receipt: TransactionReceipt,
}

/// Interval and deadline used when polling for receipts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(180),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");

    #[test]
    fn test_single_owner_spec() {
        let spec = AccountSpec::single_owner(A);
        assert_eq!(spec.owner(), A);
        assert_eq!(spec.threshold(), 1);
        assert_eq!(spec.owners(), &[A]);
    }

    #[test]
    fn test_spec_validation() {
        assert!(AccountSpec::new(A, vec![A, B], 2).is_ok());
        assert!(AccountSpec::new(A, vec![A, B], 0).is_err());
        assert!(AccountSpec::new(A, vec![A, B], 3).is_err());
        assert!(AccountSpec::new(A, vec![A, A], 1).is_err());
        assert!(AccountSpec::new(A, vec![B], 1).is_err());
        assert!(AccountSpec::new(A, vec![], 1).is_err());
        assert!(AccountSpec::new(Address::ZERO, vec![Address::ZERO], 1).is_err());
    }

    #[test]
    fn test_noop_call() {
        let call = Call::noop();
        assert!(call.to.is_zero());
        assert_eq!(call.value, U256::ZERO);
        assert!(call.data.is_empty());
    }

    #[test]
    fn test_user_operation_json_shape() {
        let op = UserOperation {
            sender: A,
            nonce: U256::ZERO,
            factory: None,
            factory_data: None,
            call_data: Bytes::from(vec![0x12, 0x34]),
            call_gas_limit: U256::from(100_000u64),
            verification_gas_limit: U256::from(500_000u64),
            pre_verification_gas: U256::from(50_000u64),
            max_fee_per_gas: U256::from(60_000_000u64),
            max_priority_fee_per_gas: U256::from(60_000_000u64),
            signature: Bytes::new(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["callData"], "0x1234");
        assert_eq!(json["callGasLimit"], "0x186a0");
        assert!(json.get("factory").is_none());
        assert!(json.get("factoryData").is_none());
        assert!(op.init_code().is_empty());
    }

    #[test]
    fn test_receipt_status() {
        let json = serde_json::json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x5208",
            "from": format!("0x{}", "22".repeat(20)),
            "to": null,
            "logs": []
        });
        let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(receipt.block_number, Some(U64::from(16)));
    }
}
