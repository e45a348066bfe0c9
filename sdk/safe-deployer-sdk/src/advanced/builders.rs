use crate::core::constants::SafeDeployment;
use crate::types::UserOperation;
use alloy_primitives::{Bytes, U256};
use serde_json::{json, Value};

/// Validity window encoded in front of every Safe4337Module signature.
/// `valid_until == 0` means no expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub valid_after: u64,
    pub valid_until: u64,
}

const UINT48_MAX: u64 = (1 << 48) - 1;

/// Stand-in ECDSA signature used while estimating gas.
/// Well-formed (65 bytes, v = 28) so the module runs its full validation path.
const DUMMY_ECDSA: [u8; 65] = {
    let mut sig = [0u8; 65];
    let mut i = 0;
    while i < 16 {
        sig[i] = 0xff;
        i += 1;
    }
    sig[63] = 0x7a;
    sig[64] = 0x1c;
    sig
};

/// `uint48 validAfter ++ uint48 validUntil ++ signature`
pub fn pack_signature(window: ValidityWindow, ecdsa: &[u8]) -> Bytes {
    let mut packed = Vec::with_capacity(12 + ecdsa.len());
    packed.extend_from_slice(&uint48_bytes(window.valid_after));
    packed.extend_from_slice(&uint48_bytes(window.valid_until));
    packed.extend_from_slice(ecdsa);
    packed.into()
}

pub fn dummy_signature() -> Bytes {
    pack_signature(ValidityWindow::default(), &DUMMY_ECDSA)
}

fn uint48_bytes(value: u64) -> [u8; 6] {
    let be = value.min(UINT48_MAX).to_be_bytes();
    let mut out = [0u8; 6];
    out.copy_from_slice(&be[2..]);
    out
}

/// EIP-712 document for the Safe4337Module `SafeOp` struct, ready for
/// `eth_signTypedData_v4`.
///
/// Integers are rendered as decimal strings, which every wallet accepts for
/// uint fields of any width.
pub fn safe_operation_typed_data(
    user_op: &UserOperation,
    chain_id: u64,
    deployment: &SafeDeployment,
    window: ValidityWindow,
) -> Value {
    json!({
        "types": {
            "EIP712Domain": [
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" }
            ],
            "SafeOp": [
                { "name": "safe", "type": "address" },
                { "name": "nonce", "type": "uint256" },
                { "name": "initCode", "type": "bytes" },
                { "name": "callData", "type": "bytes" },
                { "name": "verificationGasLimit", "type": "uint128" },
                { "name": "callGasLimit", "type": "uint128" },
                { "name": "preVerificationGas", "type": "uint256" },
                { "name": "maxPriorityFeePerGas", "type": "uint128" },
                { "name": "maxFeePerGas", "type": "uint128" },
                { "name": "paymasterAndData", "type": "bytes" },
                { "name": "validAfter", "type": "uint48" },
                { "name": "validUntil", "type": "uint48" },
                { "name": "entryPoint", "type": "address" }
            ]
        },
        "primaryType": "SafeOp",
        "domain": {
            "chainId": chain_id,
            "verifyingContract": deployment.safe_4337_module
        },
        "message": {
            "safe": user_op.sender,
            "nonce": decimal(user_op.nonce),
            "initCode": user_op.init_code(),
            "callData": user_op.call_data,
            "verificationGasLimit": decimal(user_op.verification_gas_limit),
            "callGasLimit": decimal(user_op.call_gas_limit),
            "preVerificationGas": decimal(user_op.pre_verification_gas),
            "maxPriorityFeePerGas": decimal(user_op.max_priority_fee_per_gas),
            "maxFeePerGas": decimal(user_op.max_fee_per_gas),
            "paymasterAndData": Bytes::new(),
            "validAfter": window.valid_after,
            "validUntil": window.valid_until,
            "entryPoint": deployment.entry_point
        }
    })
}

fn decimal(value: U256) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address};

    fn sample_op() -> UserOperation {
        UserOperation {
            sender: address!("1111111111111111111111111111111111111111"),
            nonce: U256::from(3),
            factory: Some(address!("2222222222222222222222222222222222222222")),
            factory_data: Some(Bytes::from(vec![0xab, 0xcd])),
            call_data: Bytes::from(vec![0x01]),
            call_gas_limit: U256::from(10),
            verification_gas_limit: U256::from(20),
            pre_verification_gas: U256::from(30),
            max_fee_per_gas: U256::from(40),
            max_priority_fee_per_gas: U256::from(50),
            signature: Bytes::new(),
        }
    }

    #[test]
    fn test_pack_signature_layout() {
        let window = ValidityWindow {
            valid_after: 1,
            valid_until: 0x0102,
        };
        let packed = pack_signature(window, &[0xee; 65]);
        assert_eq!(packed.len(), 77);
        assert_eq!(&packed[..6], &[0, 0, 0, 0, 0, 1]);
        assert_eq!(&packed[6..12], &[0, 0, 0, 0, 1, 2]);
        assert_eq!(packed[12], 0xee);
    }

    #[test]
    fn test_dummy_signature_shape() {
        let sig = dummy_signature();
        assert_eq!(sig.len(), 77);
        assert_eq!(sig[76], 0x1c);
    }

    #[test]
    fn test_typed_data_message() {
        let deployment = SafeDeployment::for_version("1.4.1").unwrap();
        let doc = safe_operation_typed_data(&sample_op(), 31, &deployment, ValidityWindow::default());

        assert_eq!(doc["primaryType"], "SafeOp");
        assert_eq!(doc["domain"]["chainId"], 31);
        assert_eq!(doc["message"]["nonce"], "3");
        assert_eq!(doc["message"]["maxPriorityFeePerGas"], "50");
        assert_eq!(
            doc["message"]["initCode"],
            "0x2222222222222222222222222222222222222222abcd"
        );
        assert_eq!(doc["message"]["paymasterAndData"], "0x");
        assert_eq!(doc["types"]["SafeOp"].as_array().unwrap().len(), 13);
        let verifying: Address =
            serde_json::from_value(doc["domain"]["verifyingContract"].clone()).unwrap();
        assert_eq!(verifying, deployment.safe_4337_module);
    }
}
