//! Deployment workflow controller.
//!
//! One call to [`DeploymentController::deploy`] drives a full attempt:
//! wallet discovery, account request, client construction, address
//! derivation, the no-op deployment transaction and confirmation. Progress is
//! published twice: the latest status on a `watch` channel and every
//! transition, in order, on a `broadcast` channel.

use crate::basic::wallet::{SafeAccountOptions, SafeSmartAccount};
use crate::config::DeployerConfig;
use crate::core::bundler::{BundlerClient, HttpBundlerClient};
use crate::core::connection::{EvmConnection, HttpConnection};
use crate::core::network::NetworkConfig;
use crate::core::signer::{Eip1193HttpProvider, WalletClient, WalletProvider};
use crate::error::{DeployError, Result, SafeSdkError};
use crate::types::{AccountSpec, Call, PollingConfig};
use crate::utils;
use alloy_primitives::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

/// Transitions buffered per event subscriber before it starts lagging
const EVENT_CAPACITY: usize = 64;

/// Where an attempt currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    Idle,
    ConnectingWallet,
    AddressDerived,
    SubmittingTransaction,
    AwaitingConfirmation,
    Deployed,
    Failed(DeployError),
}

impl DeploymentState {
    /// Position along the happy path; `Failed` sorts after everything.
    fn rank(&self) -> u8 {
        match self {
            DeploymentState::Idle => 0,
            DeploymentState::ConnectingWallet => 1,
            DeploymentState::AddressDerived => 2,
            DeploymentState::SubmittingTransaction => 3,
            DeploymentState::AwaitingConfirmation => 4,
            DeploymentState::Deployed => 5,
            DeploymentState::Failed(_) => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Deployed | DeploymentState::Failed(_))
    }

    /// True when `next` may follow `self` within one attempt
    pub fn can_advance_to(&self, next: &DeploymentState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Snapshot handed to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    /// Attempt that produced this snapshot; 0 before the first attempt
    pub attempt: u64,
    pub state: DeploymentState,
    /// Counterfactual address, kept once derived even if the attempt fails
    pub safe_address: Option<Address>,
}

impl DeploymentStatus {
    fn idle() -> Self {
        Self {
            attempt: 0,
            state: DeploymentState::Idle,
            safe_address: None,
        }
    }

    /// Human-readable status line
    pub fn status_line(&self) -> String {
        let short = self.safe_address.as_ref().map(utils::short_address);
        match (&self.state, short) {
            (DeploymentState::Idle, _) => "Idle".to_string(),
            (DeploymentState::ConnectingWallet, _) => "Connecting wallet …".to_string(),
            (DeploymentState::AddressDerived, Some(addr)) => {
                format!("Smart account address: {}", addr)
            },
            (DeploymentState::AddressDerived, None) => "Smart account address derived".to_string(),
            (DeploymentState::SubmittingTransaction, _) => {
                "Sending deployment user-op … check your wallet".to_string()
            },
            (DeploymentState::AwaitingConfirmation, _) => "Waiting for bundler …".to_string(),
            (DeploymentState::Deployed, Some(addr)) => format!("Safe deployed at {}", addr),
            (DeploymentState::Deployed, None) => "Safe deployed".to_string(),
            (DeploymentState::Failed(DeployError::ProviderMissing), _) => {
                "Wallet not detected".to_string()
            },
            (DeploymentState::Failed(err), _) => format!("Error: {}", err),
        }
    }

    /// `<explorer>/address/<address>` once an address is known
    pub fn explorer_link(&self, network: &NetworkConfig) -> Option<String> {
        self.safe_address
            .as_ref()
            .map(|addr| network.address_url(addr))
    }
}

/// Drives Safe deployment attempts and publishes their progress.
pub struct DeploymentController {
    wallet: Option<Arc<dyn WalletProvider>>,
    connection: Arc<dyn EvmConnection>,
    bundler: Arc<dyn BundlerClient>,
    network: NetworkConfig,
    options: SafeAccountOptions,
    status: watch::Sender<DeploymentStatus>,
    events: broadcast::Sender<DeploymentStatus>,
    attempts: AtomicU64,
}

impl DeploymentController {
    /// `wallet` is `None` when no provider was detected
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        connection: Arc<dyn EvmConnection>,
        bundler: Arc<dyn BundlerClient>,
        network: NetworkConfig,
        options: SafeAccountOptions,
    ) -> Self {
        let (status, _) = watch::channel(DeploymentStatus::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            wallet,
            connection,
            bundler,
            network,
            options,
            status,
            events,
            attempts: AtomicU64::new(0),
        }
    }

    /// Wire HTTP clients from configuration. No request is sent here.
    ///
    /// The bundler access key is only required when a wallet is configured;
    /// without one every attempt ends at wallet discovery.
    pub fn from_config(config: &DeployerConfig) -> Result<Self> {
        let wallet = config
            .wallet_endpoint()?
            .map(|url| Arc::new(Eip1193HttpProvider::new(url)) as Arc<dyn WalletProvider>);
        let connection = Arc::new(HttpConnection::new(config.rpc_endpoint()?));
        let bundler_url = if wallet.is_some() {
            config.bundler.endpoint()?
        } else {
            log::warn!("no wallet configured, bundler key not resolved");
            config.bundler.base_endpoint()?
        };
        let bundler = Arc::new(HttpBundlerClient::new(bundler_url));

        Ok(Self::new(
            wallet,
            connection,
            bundler,
            config.network.clone(),
            config.account_options()?,
        ))
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Latest status only; back-to-back transitions may be coalesced
    pub fn subscribe(&self) -> watch::Receiver<DeploymentStatus> {
        self.status.subscribe()
    }

    /// Every published transition, in order, from the moment of subscribing
    pub fn subscribe_events(&self) -> broadcast::Receiver<DeploymentStatus> {
        self.events.subscribe()
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status.borrow().clone()
    }

    /// Run one deployment attempt and return its final status.
    ///
    /// Re-invoking starts a fresh attempt that overwrites the published
    /// status. Concurrent invocations are not serialized: each writes the
    /// same channel and the last write wins.
    pub async fn deploy(&self) -> DeploymentStatus {
        let mut attempt = Attempt::start(self);

        match self.run(&mut attempt).await {
            Ok(()) => {},
            Err(err) => {
                log::error!("deployment attempt #{} failed: {:?}", attempt.id, err);
                attempt.advance(DeploymentState::Failed(err));
            },
        }
        attempt.status.clone()
    }

    async fn run(&self, attempt: &mut Attempt<'_>) -> Result<(), DeployError> {
        // 1. wallet discovery
        let provider = self.wallet.clone().ok_or(DeployError::ProviderMissing)?;

        // 2. account request
        let accounts = provider
            .request_accounts()
            .await
            .map_err(|e| classify(SafeSdkError::from(e), DeployError::Unknown))?;
        let owner = accounts
            .first()
            .copied()
            .ok_or_else(|| DeployError::Unknown(SafeSdkError::NoAccounts.to_string()))?;
        log::debug!("attempt #{}: wallet exposed {}", attempt.id, owner);

        // 3. clients
        let wallet_client = WalletClient::new(provider, self.network.clone());

        // 4. address derivation
        let account = SafeSmartAccount::new(
            AccountSpec::single_owner(owner),
            self.options.clone(),
            wallet_client,
            self.connection.clone(),
            self.bundler.clone(),
        )
        .await
        .map_err(|e| classify(e, DeployError::Unknown))?;
        attempt.status.safe_address = Some(account.address());
        attempt.advance(DeploymentState::AddressDerived);
        log::info!("attempt #{}: smart account {}", attempt.id, account.address());

        // 5. deployment transaction
        attempt.advance(DeploymentState::SubmittingTransaction);
        let user_op_hash = account
            .submit_transaction(&Call::noop())
            .await
            .map_err(|e| classify(e, DeployError::RelaySubmissionFailed))?;

        // 6. confirmation, both polls share one deadline
        attempt.advance(DeploymentState::AwaitingConfirmation);
        let started = Instant::now();
        let included = account
            .wait_for_user_operation(user_op_hash)
            .await
            .map_err(|e| classify(e, DeployError::ConfirmationFailed))?;
        let polling = PollingConfig {
            timeout: self
                .options
                .polling
                .timeout
                .saturating_sub(started.elapsed()),
            ..self.options.polling
        };
        let receipt = utils::wait_for_transaction_receipt(
            &*self.connection,
            included.receipt.transaction_hash,
            &polling,
        )
        .await
        .map_err(|e| classify(e, DeployError::ConfirmationFailed))?;

        log::info!(
            "attempt #{}: Safe {} deployed in tx {}",
            attempt.id,
            account.address(),
            receipt.transaction_hash
        );
        attempt.advance(DeploymentState::Deployed);
        Ok(())
    }
}

/// Wallet rejections keep their own kind whatever step they happen in
fn classify(err: SafeSdkError, otherwise: fn(String) -> DeployError) -> DeployError {
    if err.is_user_rejection() {
        DeployError::UserRejected(err.to_string())
    } else {
        otherwise(err.to_string())
    }
}

/// Per-attempt view of the status; every change is published immediately.
struct Attempt<'a> {
    id: u64,
    status: DeploymentStatus,
    controller: &'a DeploymentController,
}

impl<'a> Attempt<'a> {
    fn start(controller: &'a DeploymentController) -> Self {
        let id = controller.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let status = DeploymentStatus {
            attempt: id,
            state: DeploymentState::ConnectingWallet,
            safe_address: None,
        };
        log::debug!("attempt #{} started", id);
        let attempt = Self {
            id,
            status,
            controller,
        };
        attempt.publish();
        attempt
    }

    fn publish(&self) {
        self.controller.status.send_replace(self.status.clone());
        // Err only when nobody is subscribed
        let _ = self.controller.events.send(self.status.clone());
    }

    fn advance(&mut self, next: DeploymentState) {
        debug_assert!(
            self.status.state.can_advance_to(&next),
            "{:?} -> {:?}",
            self.status.state,
            next
        );
        self.status.state = next;
        self.publish();
    }
}
