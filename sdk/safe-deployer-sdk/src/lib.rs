pub mod advanced;
pub mod basic;
pub mod config;
pub mod core;
pub mod deployer;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::basic::wallet::{SafeAccountOptions, SafeSmartAccount};
pub use crate::config::DeployerConfig;
pub use crate::core::bundler::BundlerClient;
pub use crate::core::connection::EvmConnection;
pub use crate::core::network::NetworkConfig;
pub use crate::core::signer::{WalletClient, WalletProvider};
pub use crate::deployer::{DeploymentController, DeploymentState, DeploymentStatus};
pub use crate::error::{DeployError, DeployErrorKind, Result, RpcError, SafeSdkError};
pub use crate::types::{AccountSpec, Call, PollingConfig, TransactionReceipt};
pub use crate::utils::{derive_safe_address, wait_for_transaction_receipt};
