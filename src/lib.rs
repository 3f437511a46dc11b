pub mod blockchain;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod network;
pub mod retry;
pub mod transfer;
pub mod watcher;

pub use blockchain::{ChainClient, RpcClient};
pub use config::{AppConfig, LoggingConfig, RpcConfig, WatchStrategy};
pub use error::{ForwarderError, Result};
pub use forwarder::{ForwardSettings, Forwarder};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use network::{NetworkName, NetworkProfile, NetworkResolver};
pub use retry::{RetryConfig, RetryManager};
pub use transfer::{AssetKind, DispatchResult, Dispatcher, Wallet};
pub use watcher::{CycleOutcome, WatchSettings, Watcher};
