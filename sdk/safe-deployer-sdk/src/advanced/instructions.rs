//! Raw ABI encoders for the contracts a Safe deployment touches.

use crate::core::constants::SafeDeployment;
use crate::error::{Result, SafeSdkError};
use crate::types::{AccountSpec, Call};
use alloy_primitives::{aliases::U192, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    interface ISafe {
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;
    }

    interface ISafeModuleSetup {
        function enableModules(address[] calldata modules) external;
    }

    interface ISafeProxyFactory {
        function createProxyWithNonce(address _singleton, bytes memory initializer, uint256 saltNonce)
            external
            returns (address proxy);

        function proxyCreationCode() external pure returns (bytes memory code);
    }

    interface ISafe4337Module {
        function executeUserOp(address to, uint256 value, bytes calldata data, uint8 operation) external;
    }

    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }
}

/// `Safe.setup` calldata enabling the 4337 module and using it as the
/// fallback handler
pub fn setup_initializer(spec: &AccountSpec, deployment: &SafeDeployment) -> Bytes {
    let enable_modules = ISafeModuleSetup::enableModulesCall {
        modules: vec![deployment.safe_4337_module],
    }
    .abi_encode();

    ISafe::setupCall {
        _owners: spec.owners().to_vec(),
        _threshold: U256::from(spec.threshold()),
        to: deployment.module_setup,
        data: enable_modules.into(),
        fallbackHandler: deployment.safe_4337_module,
        paymentToken: Address::ZERO,
        payment: U256::ZERO,
        paymentReceiver: Address::ZERO,
    }
    .abi_encode()
    .into()
}

/// Factory call deploying the proxy; becomes the user operation's `factoryData`
pub fn create_proxy_with_nonce(
    deployment: &SafeDeployment,
    initializer: Bytes,
    salt_nonce: U256,
) -> Bytes {
    ISafeProxyFactory::createProxyWithNonceCall {
        _singleton: deployment.singleton,
        initializer,
        saltNonce: salt_nonce,
    }
    .abi_encode()
    .into()
}

pub fn proxy_creation_code() -> Bytes {
    ISafeProxyFactory::proxyCreationCodeCall {}.abi_encode().into()
}

pub fn decode_proxy_creation_code(data: &[u8]) -> Result<Bytes> {
    ISafeProxyFactory::proxyCreationCodeCall::abi_decode_returns(data, true)
        .map(|ret| ret.code)
        .map_err(|e| SafeSdkError::Other(format!("bad proxyCreationCode return: {}", e)))
}

/// Module entry point executing `call` as a plain CALL (operation 0)
pub fn execute_user_op(call: &Call) -> Bytes {
    ISafe4337Module::executeUserOpCall {
        to: call.to,
        value: call.value,
        data: call.data.clone(),
        operation: 0,
    }
    .abi_encode()
    .into()
}

pub fn get_nonce(sender: Address) -> Bytes {
    IEntryPoint::getNonceCall {
        sender,
        key: U192::ZERO,
    }
    .abi_encode()
    .into()
}

pub fn decode_nonce(data: &[u8]) -> Result<U256> {
    IEntryPoint::getNonceCall::abi_decode_returns(data, true)
        .map(|ret| ret.nonce)
        .map_err(|e| SafeSdkError::Other(format!("bad getNonce return: {}", e)))
}
