use alloy_primitives::B256;
use std::time::Duration;
use thiserror::Error;

/// EIP-1193 `userRejectedRequest` code returned by wallets.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Failure talking to a JSON-RPC endpoint (node, bundler or wallet)
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint answered with a JSON-RPC error object
    #[error("{message}")]
    ErrorResponse {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// HTTP level failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload could not be (de)serialized
    #[error("Invalid JSON-RPC payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Neither `result` nor `error` was present
    #[error("JSON-RPC response for {0} carried no result")]
    MissingResult(String),
}

impl RpcError {
    /// JSON-RPC error code, if the endpoint returned one
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::ErrorResponse { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the wallet reported that the user declined the request
    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_REQUEST)
    }
}

/// SDK-specific error types for Safe account operations
#[derive(Debug, Error)]
pub enum SafeSdkError {
    /// RPC error from the node, bundler or wallet
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Wallet authorized the request but exposed no account
    #[error("wallet returned no accounts")]
    NoAccounts,

    /// Owner set / threshold combination is not a valid Safe configuration
    #[error("Invalid account spec: {0}")]
    InvalidAccountSpec(String),

    /// Signature returned by the wallet cannot be used
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Transaction was mined with a failing status
    #[error("transaction {0} reverted")]
    Reverted(B256),

    /// Bundler included the user operation but its execution failed
    #[error("user operation {hash} failed: {reason}")]
    UserOperationFailed { hash: B256, reason: String },

    /// Polling gave up
    #[error("timed out after {elapsed:?} waiting for {what}")]
    Timeout { what: String, elapsed: Duration },

    /// Missing or malformed configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl SafeSdkError {
    /// True when the underlying wallet call was declined by the user
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, SafeSdkError::Rpc(e) if e.is_user_rejection())
    }
}

/// Result type alias for SDK operations
pub type Result<T, E = SafeSdkError> = std::result::Result<T, E>;

/// Fieldless discriminant of [`DeployError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployErrorKind {
    ProviderMissing,
    UserRejected,
    RelaySubmissionFailed,
    ConfirmationFailed,
    Unknown,
}

/// Terminal failure of a deployment attempt.
///
/// The display text is the collaborator's raw message, which is what the
/// status line shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("wallet not detected")]
    ProviderMissing,

    #[error("{0}")]
    UserRejected(String),

    #[error("{0}")]
    RelaySubmissionFailed(String),

    #[error("{0}")]
    ConfirmationFailed(String),

    #[error("{0}")]
    Unknown(String),
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::ProviderMissing => DeployErrorKind::ProviderMissing,
            DeployError::UserRejected(_) => DeployErrorKind::UserRejected,
            DeployError::RelaySubmissionFailed(_) => DeployErrorKind::RelaySubmissionFailed,
            DeployError::ConfirmationFailed(_) => DeployErrorKind::ConfirmationFailed,
            DeployError::Unknown(_) => DeployErrorKind::Unknown,
        }
    }

    /// Raw message carried by the failure
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_code_detection() {
        let rejected = RpcError::ErrorResponse {
            code: USER_REJECTED_REQUEST,
            message: "User rejected the request.".into(),
            data: None,
        };
        assert!(rejected.is_user_rejection());
        assert!(SafeSdkError::from(rejected).is_user_rejection());

        let other = RpcError::ErrorResponse {
            code: -32000,
            message: "execution reverted".into(),
            data: None,
        };
        assert!(!other.is_user_rejection());
        assert!(!RpcError::MissingResult("eth_call".into()).is_user_rejection());
    }

    #[test]
    fn test_deploy_error_display_is_raw_message() {
        assert_eq!(DeployError::ProviderMissing.message(), "wallet not detected");
        let err = DeployError::ConfirmationFailed("receipt timeout".into());
        assert_eq!(err.to_string(), "receipt timeout");
        assert_eq!(err.kind(), DeployErrorKind::ConfirmationFailed);
    }

    #[test]
    fn test_sdk_error_keeps_rpc_message() {
        let err = SafeSdkError::from(RpcError::ErrorResponse {
            code: -32602,
            message: "AA21 didn't pay prefund".into(),
            data: None,
        });
        assert_eq!(err.to_string(), "AA21 didn't pay prefund");
    }
}
