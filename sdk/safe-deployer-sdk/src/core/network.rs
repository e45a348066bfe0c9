use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

/// Static description of the target chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    /// First entry is used for reads
    pub rpc_urls: Vec<String>,
    pub block_explorer: BlockExplorer,
}

impl NetworkConfig {
    /// Rootstock testnet (chain 31)
    pub fn rootstock_testnet() -> Self {
        Self {
            chain_id: 31,
            name: "Rootstock Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "tRBTC".to_string(),
                symbol: "tRBTC".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://public-node.testnet.rsk.co".to_string()],
            block_explorer: BlockExplorer {
                name: "RSK Explorer".to_string(),
                url: "https://explorer.testnet.rsk.co".to_string(),
            },
        }
    }

    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    /// Explorer page of `address`: `<explorer>/address/<address>`
    pub fn address_url(&self, address: &Address) -> String {
        format!(
            "{}/address/{}",
            self.block_explorer.url.trim_end_matches('/'),
            address
        )
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::rootstock_testnet()
    }
}
