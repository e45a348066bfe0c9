use crate::advanced::builders::ValidityWindow;
use crate::basic::wallet::SafeAccountOptions;
use crate::core::constants::SAFE_VERSION;
use crate::core::network::NetworkConfig;
use crate::error::{Result, SafeSdkError};
use crate::types::PollingConfig;
use alloy_primitives::{Bytes, U256};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_WALLET_URL: &str = "SAFE_DEPLOYER_WALLET_URL";
pub const ENV_BUNDLER_URL: &str = "SAFE_DEPLOYER_BUNDLER_URL";
pub const ENV_RPC_URL: &str = "SAFE_DEPLOYER_RPC_URL";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of the wallet. `None` means no wallet is available.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Endpoint without the access key
    pub url: String,
    /// Environment variable holding the access key
    pub api_key_env: String,
    /// Resolved from `api_key_env`, never read from or written to the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            url: "https://api.pimlico.io/v1/rsk-testnet/rpc".to_string(),
            api_key_env: "PIMLICO_API_KEY".to_string(),
            api_key: None,
        }
    }
}

impl BundlerConfig {
    /// Endpoint with `apikey=<key>` appended
    pub fn endpoint(&self) -> Result<Url> {
        let key = self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            SafeSdkError::Config(format!(
                "bundler access key missing: set {}",
                self.api_key_env
            ))
        })?;
        let mut url = self.base_endpoint()?;
        url.query_pairs_mut().append_pair("apikey", key);
        Ok(url)
    }

    /// Endpoint without the access key
    pub fn base_endpoint(&self) -> Result<Url> {
        parse_url("bundler.url", &self.url)
    }

    /// Endpoint for display, key masked
    pub fn redacted(&self) -> String {
        match &self.api_key {
            Some(_) => format!("{}?apikey=***", self.url),
            None => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeConfig {
    pub version: String,
    pub salt_nonce: u64,
    /// Hex bytecode of the Safe proxy; read from the factory when absent
    pub proxy_creation_code: Option<String>,
}

impl Default for SafeConfig {
    fn default() -> Self {
        Self {
            version: SAFE_VERSION.to_string(),
            salt_nonce: 0,
            proxy_creation_code: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        let defaults = PollingConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

/// Deployer configuration: TOML file plus environment overrides
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub bundler: BundlerConfig,
    pub safe: SafeConfig,
    pub polling: PollingSettings,
}

impl DeployerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SafeSdkError::Config(e.to_string()))
    }

    /// Read `path` (if any), then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    SafeSdkError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&raw)?
            },
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_WALLET_URL) {
            self.wallet.url = Some(url);
        }
        if let Some(url) = lookup(ENV_BUNDLER_URL) {
            self.bundler.url = url;
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.network.rpc_urls = vec![url];
        }
        if let Some(key) = lookup(&self.bundler.api_key_env) {
            self.bundler.api_key = Some(key);
        }
    }

    pub fn rpc_endpoint(&self) -> Result<Url> {
        let url = self
            .network
            .rpc_url()
            .ok_or_else(|| SafeSdkError::Config("network.rpc_urls is empty".to_string()))?;
        parse_url("network.rpc_urls", url)
    }

    pub fn wallet_endpoint(&self) -> Result<Option<Url>> {
        self.wallet
            .url
            .as_deref()
            .map(|url| parse_url("wallet.url", url))
            .transpose()
    }

    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_millis(self.polling.interval_ms),
            timeout: Duration::from_secs(self.polling.timeout_secs),
        }
    }

    pub fn account_options(&self) -> Result<SafeAccountOptions> {
        let proxy_creation_code = self
            .safe
            .proxy_creation_code
            .as_deref()
            .map(|code| {
                hex::decode(code.trim_start_matches("0x"))
                    .map(Bytes::from)
                    .map_err(|e| SafeSdkError::Config(format!("safe.proxy_creation_code: {}", e)))
            })
            .transpose()?;

        Ok(SafeAccountOptions {
            version: self.safe.version.clone(),
            salt_nonce: U256::from(self.safe.salt_nonce),
            proxy_creation_code,
            polling: self.polling(),
            validity: ValidityWindow::default(),
        })
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| SafeSdkError::Config(format!("{}: {}", field, e)))
}
