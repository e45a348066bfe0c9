use crate::advanced::builders;
use crate::advanced::instructions;
use crate::core::constants::SafeDeployment;
use crate::error::{Result, SafeSdkError};
use crate::types::{Call, UserOperation, UserOperationGasEstimate};
use alloy_primitives::{Address, Bytes, U256};

/// Fluent builder for the user operation a Safe submits for one [`Call`].
pub struct UserOperationBuilder {
    sender: Option<Address>,
    nonce: U256,
    deployment: Option<(SafeDeployment, Bytes, U256)>,
    call: Call,
    gas: Option<UserOperationGasEstimate>,
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
    signature: Option<Bytes>,
}

impl UserOperationBuilder {
    pub fn new() -> Self {
        Self {
            sender: None,
            nonce: U256::ZERO,
            deployment: None,
            call: Call::noop(),
            gas: None,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            signature: None,
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Attach `factory`/`factoryData` so the operation deploys the Safe first.
    /// Only valid while the account has no code.
    pub fn with_deployment(
        mut self,
        deployment: SafeDeployment,
        initializer: Bytes,
        salt_nonce: U256,
    ) -> Self {
        self.deployment = Some((deployment, initializer, salt_nonce));
        self
    }

    pub fn with_call(mut self, call: Call) -> Self {
        self.call = call;
        self
    }

    pub fn with_fees(mut self, max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    pub fn with_gas(mut self, gas: UserOperationGasEstimate) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Assemble the operation. Missing gas limits stay zero and a missing
    /// signature is replaced by the estimation dummy.
    pub fn build(self) -> Result<UserOperation> {
        let sender = self
            .sender
            .ok_or_else(|| SafeSdkError::Other("Sender required".to_string()))?;

        let (factory, factory_data) = match self.deployment {
            Some((deployment, initializer, salt_nonce)) => (
                Some(deployment.proxy_factory),
                Some(instructions::create_proxy_with_nonce(
                    &deployment,
                    initializer,
                    salt_nonce,
                )),
            ),
            None => (None, None),
        };

        let gas = self.gas.unwrap_or(UserOperationGasEstimate {
            pre_verification_gas: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            call_gas_limit: U256::ZERO,
        });

        Ok(UserOperation {
            sender,
            nonce: self.nonce,
            factory,
            factory_data,
            call_data: instructions::execute_user_op(&self.call),
            call_gas_limit: gas.call_gas_limit,
            verification_gas_limit: gas.verification_gas_limit,
            pre_verification_gas: gas.pre_verification_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            signature: self.signature.unwrap_or_else(builders::dummy_signature),
        })
    }
}

impl Default for UserOperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
