use crate::advanced::builders::{self, ValidityWindow};
use crate::advanced::instructions;
use crate::basic::actions::UserOperationBuilder;
use crate::core::bundler::BundlerClient;
use crate::core::connection::EvmConnection;
use crate::core::constants::{SafeDeployment, SAFE_VERSION};
use crate::core::signer::WalletClient;
use crate::error::{Result, SafeSdkError};
use crate::types::{AccountSpec, Call, PollingConfig, UserOperation, UserOperationReceipt};
use crate::utils;
use alloy_primitives::{Address, Bytes, B256, U256};
use std::sync::Arc;
use tokio::time::Instant;

/// Knobs of a Safe smart account that are not part of its owner set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeAccountOptions {
    /// Safe contracts version tag
    pub version: String,
    pub salt_nonce: U256,
    /// Skip the `proxyCreationCode()` read when set
    pub proxy_creation_code: Option<Bytes>,
    pub polling: PollingConfig,
    pub validity: ValidityWindow,
}

impl Default for SafeAccountOptions {
    fn default() -> Self {
        Self {
            version: SAFE_VERSION.to_string(),
            salt_nonce: U256::ZERO,
            proxy_creation_code: None,
            polling: PollingConfig::default(),
            validity: ValidityWindow::default(),
        }
    }
}

/// Handle on a (possibly not yet deployed) Safe smart account.
pub struct SafeSmartAccount {
    spec: AccountSpec,
    deployment: SafeDeployment,
    options: SafeAccountOptions,
    initializer: Bytes,
    address: Address,
    signer: WalletClient,
    connection: Arc<dyn EvmConnection>,
    bundler: Arc<dyn BundlerClient>,
}

impl SafeSmartAccount {
    /// Resolve the deployment contracts for `options.version` and derive the
    /// counterfactual address. Nothing is written on-chain.
    pub async fn new(
        spec: AccountSpec,
        options: SafeAccountOptions,
        signer: WalletClient,
        connection: Arc<dyn EvmConnection>,
        bundler: Arc<dyn BundlerClient>,
    ) -> Result<Self> {
        let deployment = SafeDeployment::for_version(&options.version)?;

        let creation_code = match &options.proxy_creation_code {
            Some(code) => code.clone(),
            None => utils::fetch_proxy_creation_code(&*connection, &deployment).await?,
        };

        let address =
            utils::derive_safe_address(&spec, &deployment, options.salt_nonce, &creation_code);
        let initializer = instructions::setup_initializer(&spec, &deployment);
        log::debug!(
            "derived Safe {} for owners {:?} (threshold {})",
            address,
            spec.owners(),
            spec.threshold()
        );

        Ok(Self {
            spec,
            deployment,
            options,
            initializer,
            address,
            signer,
            connection,
            bundler,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn spec(&self) -> &AccountSpec {
        &self.spec
    }

    pub fn deployment(&self) -> &SafeDeployment {
        &self.deployment
    }

    pub fn options(&self) -> &SafeAccountOptions {
        &self.options
    }

    pub async fn is_deployed(&self) -> Result<bool> {
        let code = self.connection.get_code(self.address).await?;
        Ok(!code.is_empty())
    }

    /// EntryPoint nonce for key 0
    pub async fn get_nonce(&self) -> Result<U256> {
        let ret = self
            .connection
            .call(
                self.deployment.entry_point,
                instructions::get_nonce(self.address),
            )
            .await?;
        instructions::decode_nonce(&ret)
    }

    /// Build an unsigned user operation for `call` with bundler gas estimates
    pub async fn prepare_user_operation(&self, call: &Call) -> Result<UserOperation> {
        let deployed = self.is_deployed().await?;
        let nonce = self.get_nonce().await?;
        let gas_price = self.connection.gas_price().await?;

        let mut builder = UserOperationBuilder::new()
            .with_sender(self.address)
            .with_nonce(nonce)
            .with_call(call.clone())
            .with_fees(gas_price, gas_price);
        if !deployed {
            builder = builder.with_deployment(
                self.deployment,
                self.initializer.clone(),
                self.options.salt_nonce,
            );
        }
        let draft = builder.build()?;

        let gas = self
            .bundler
            .estimate_user_operation_gas(&draft, self.deployment.entry_point)
            .await?;
        log::debug!(
            "gas estimate for {}: pvg={} vgl={} cgl={}",
            self.address,
            gas.pre_verification_gas,
            gas.verification_gas_limit,
            gas.call_gas_limit
        );

        Ok(UserOperation {
            pre_verification_gas: gas.pre_verification_gas,
            verification_gas_limit: gas.verification_gas_limit,
            call_gas_limit: gas.call_gas_limit,
            ..draft
        })
    }

    /// Ask the owner's wallet to sign the `SafeOp` and attach the packed signature
    pub async fn sign_user_operation(&self, mut user_op: UserOperation) -> Result<UserOperation> {
        let typed_data = builders::safe_operation_typed_data(
            &user_op,
            self.signer.network().chain_id,
            &self.deployment,
            self.options.validity,
        );
        let ecdsa = self
            .signer
            .sign_typed_data(self.spec.owner(), &typed_data)
            .await?;
        user_op.signature = builders::pack_signature(self.options.validity, &ecdsa);
        Ok(user_op)
    }

    /// Prepare, sign and relay `call`. Returns the user operation hash once
    /// the bundler accepted it.
    pub async fn submit_transaction(&self, call: &Call) -> Result<B256> {
        let user_op = self.prepare_user_operation(call).await?;
        let user_op = self.sign_user_operation(user_op).await?;
        let hash = self
            .bundler
            .send_user_operation(&user_op, self.deployment.entry_point)
            .await?;
        log::info!("bundler accepted user operation {} for {}", hash, self.address);
        Ok(hash)
    }

    /// Poll the bundler until the operation is included.
    pub async fn wait_for_user_operation(&self, hash: B256) -> Result<UserOperationReceipt> {
        let polling = self.options.polling;
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.bundler.get_user_operation_receipt(hash).await? {
                if !receipt.success {
                    return Err(SafeSdkError::UserOperationFailed {
                        hash,
                        reason: receipt
                            .reason
                            .unwrap_or_else(|| "execution reverted".to_string()),
                    });
                }
                return Ok(receipt);
            }
            if started.elapsed() >= polling.timeout {
                return Err(SafeSdkError::Timeout {
                    what: format!("user operation {}", hash),
                    elapsed: started.elapsed(),
                });
            }
            tokio::time::sleep(polling.interval).await;
        }
    }
}

impl std::fmt::Debug for SafeSmartAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeSmartAccount")
            .field("address", &self.address)
            .field("spec", &self.spec)
            .field("version", &self.options.version)
            .finish()
    }
}
