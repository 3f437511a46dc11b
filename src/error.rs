use alloy::primitives::TxHash;
use thiserror::Error;

/// Main error type for the balance relay
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),
}

/// Errors raised while talking to the node over JSON-RPC
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid address for {key}: {value}")]
    InvalidAddress { key: String, value: String },
}

/// Network selection errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("No {kind} endpoint configured for network {network}")]
    MissingEndpoint { network: String, kind: &'static str },

    #[error("No token contract configured for network {0}")]
    MissingToken(String),
}

/// Errors local to a single transfer attempt
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Amount conversion failed: {0}")]
    AmountConversion(String),

    #[error("Contract encoding failed: {0}")]
    ContractEncoding(String),

    #[error("Amount {amount} must be strictly positive")]
    NonPositiveAmount { amount: String },

    #[error("Amount {amount} is below the minimum income threshold {minimum}")]
    BelowThreshold { amount: String, minimum: String },
}

/// Errors raised by signing and confirmation
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid private key: {0}")]
    Wallet(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction {hash} not confirmed after {seconds} seconds")]
    ConfirmationTimeout { hash: TxHash, seconds: u64 },
}

/// Push feed errors
#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    #[error("WebSocket connection closed")]
    Closed,

    #[error("Subscription request rejected: {0}")]
    Rejected(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ForwarderError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The watch loop cannot continue
    Critical,
    /// A transfer or observation was lost
    High,
    /// Transient, the next cycle will likely succeed
    Medium,
    /// Informational
    Low,
}

impl ForwarderError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ForwarderError::Config(_) => ErrorSeverity::Critical,
            ForwarderError::Network(_) => ErrorSeverity::Critical,
            ForwarderError::Subscription(SubscriptionError::Closed) => ErrorSeverity::Critical,
            ForwarderError::Subscription(SubscriptionError::Connect(_)) => ErrorSeverity::Critical,
            ForwarderError::Dispatch(DispatchError::Wallet(_)) => ErrorSeverity::Critical,

            ForwarderError::Dispatch(_) => ErrorSeverity::High,
            ForwarderError::Subscription(_) => ErrorSeverity::High,
            ForwarderError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,

            ForwarderError::Rpc(RpcError::Timeout { .. }) => ErrorSeverity::Medium,
            ForwarderError::Rpc(RpcError::RateLimit { .. }) => ErrorSeverity::Medium,
            ForwarderError::Transfer(TransferError::AmountConversion(_)) => ErrorSeverity::Medium,
            ForwarderError::Transfer(TransferError::ContractEncoding(_)) => ErrorSeverity::Medium,

            ForwarderError::Transfer(_) => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }

    /// Check if the error is transient (an idempotent call may be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ForwarderError::Rpc(RpcError::Timeout { .. }) => true,
            ForwarderError::Rpc(RpcError::RateLimit { .. }) => true,
            ForwarderError::Rpc(RpcError::Connection(_)) => true,
            ForwarderError::Rpc(RpcError::Http(e)) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Get suggested retry delay in seconds for recoverable errors
    pub fn retry_delay(&self) -> Option<u64> {
        if !self.is_recoverable() {
            return None;
        }

        match self {
            ForwarderError::Rpc(RpcError::RateLimit { seconds }) => Some(*seconds),
            ForwarderError::Rpc(RpcError::Connection(_)) => Some(5),
            _ => Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let critical = ForwarderError::Network(NetworkError::UnknownNetwork("moon".to_string()));
        assert_eq!(critical.severity(), ErrorSeverity::Critical);

        let closed = ForwarderError::Subscription(SubscriptionError::Closed);
        assert_eq!(closed.severity(), ErrorSeverity::Critical);

        let timeout = ForwarderError::Dispatch(DispatchError::ConfirmationTimeout {
            hash: TxHash::ZERO,
            seconds: 120,
        });
        assert_eq!(timeout.severity(), ErrorSeverity::High);

        let conversion =
            ForwarderError::Transfer(TransferError::AmountConversion("1e-30".to_string()));
        assert_eq!(conversion.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_error_recoverability() {
        assert!(ForwarderError::Rpc(RpcError::Timeout { seconds: 30 }).is_recoverable());
        assert!(ForwarderError::Rpc(RpcError::Connection("reset".to_string())).is_recoverable());

        let rejected = ForwarderError::Rpc(RpcError::Method {
            code: -32000,
            message: "nonce too low".to_string(),
        });
        assert!(!rejected.is_recoverable());
        assert_eq!(rejected.retry_delay(), None);
    }

    #[test]
    fn test_retry_delay() {
        let rate_limited = ForwarderError::Rpc(RpcError::RateLimit { seconds: 60 });
        assert_eq!(rate_limited.retry_delay(), Some(60));

        let timeout = ForwarderError::Rpc(RpcError::Timeout { seconds: 30 });
        assert_eq!(timeout.retry_delay(), Some(1));
    }

    #[test]
    fn test_error_display() {
        let error = ForwarderError::Rpc(RpcError::Method {
            code: -32000,
            message: "insufficient funds for gas * price + value".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "RPC error: RPC method error: code=-32000, message=insufficient funds for gas * price + value"
        );

        let missing = ForwarderError::Network(NetworkError::MissingEndpoint {
            network: "polygon".to_string(),
            kind: "WebSocket",
        });
        assert_eq!(
            missing.to_string(),
            "Network error: No WebSocket endpoint configured for network polygon"
        );
    }
}
