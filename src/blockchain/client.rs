use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// A transaction as reported by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: u64,
    /// `None` while pending
    pub block_number: Option<u64>,
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `false` when the transaction reverted
    pub success: bool,
}

/// The node operations the relay depends on.
///
/// `RpcClient` implements this over HTTP JSON-RPC; tests substitute a scripted client.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Transaction count including pending transactions
    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    /// Gas price in wei
    async fn get_gas_price(&self) -> Result<u128>;

    /// `None` when the node does not know the hash
    async fn get_transaction(&self, hash: TxHash) -> Result<Option<ChainTransaction>>;

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash>;

    /// Wait until the transaction is mined. `None` when `timeout` elapses first.
    async fn wait_for_receipt(&self, hash: TxHash, timeout: Duration) -> Result<Option<ChainReceipt>>;
}
