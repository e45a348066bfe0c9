use crate::error::{Result, SafeSdkError};
use alloy_primitives::{address, Address};

pub const SAFE_VERSION: &str = "1.4.1";

/// ERC-4337 EntryPoint v0.7
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

pub const SAFE_PROXY_FACTORY_141: Address = address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67");
pub const SAFE_SINGLETON_141: Address = address!("41675C099F32341bf84BFc5382aF534df5C7461a");

/// Safe4337Module v0.3.0 (EntryPoint v0.7)
pub const SAFE_4337_MODULE_030: Address = address!("75cf11467937ce3F2f357CE24ffc3DBF8fD5c226");
pub const SAFE_MODULE_SETUP_030: Address = address!("2dd68b007B46fBe91B9A7c3EDa5A7a1063cB5b47");

/// Contract set a Safe of a given version is deployed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeDeployment {
    pub proxy_factory: Address,
    pub singleton: Address,
    pub module_setup: Address,
    pub safe_4337_module: Address,
    pub entry_point: Address,
}

impl SafeDeployment {
    pub fn for_version(version: &str) -> Result<Self> {
        match version {
            SAFE_VERSION => Ok(Self {
                proxy_factory: SAFE_PROXY_FACTORY_141,
                singleton: SAFE_SINGLETON_141,
                module_setup: SAFE_MODULE_SETUP_030,
                safe_4337_module: SAFE_4337_MODULE_030,
                entry_point: ENTRY_POINT_V07,
            }),
            other => Err(SafeSdkError::Config(format!(
                "unsupported Safe version {}",
                other
            ))),
        }
    }
}
