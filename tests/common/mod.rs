#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use balance_relay::blockchain::{ChainClient, ChainReceipt, ChainTransaction};
use balance_relay::error::{Result, RpcError};
use balance_relay::network::{NetworkName, NetworkProfile, TokenContract, ERC20_TRANSFER_ABI};
use balance_relay::transfer::{AssetKind, Wallet};
use balance_relay::{ForwardSettings, Forwarder, WatchSettings, Watcher};

// Anvil development account #0
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const RECEIVER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const TOKEN: &str = "0x455e53CBB86018Ac2B8092FdCd39d8444aFFC3F6";

pub const WEI_PER_COIN: u64 = 1_000_000_000_000_000_000;

pub fn coins(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_COIN)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn sender() -> Address {
    DEV_ADDRESS.parse().unwrap()
}

pub fn receiver() -> Address {
    RECEIVER.parse().unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    Confirm,
    Revert,
    Timeout,
}

/// Scripted stand-in for a node
pub struct MockChainClient {
    balances: Mutex<VecDeque<Option<U256>>>,
    last_balance: Mutex<U256>,
    pending_nonce: Mutex<u64>,
    gas_price: u128,
    submit_error: Mutex<Option<String>>,
    submit_dropped: Mutex<bool>,
    receipt_mode: Mutex<ReceiptMode>,
    transactions: Mutex<HashMap<TxHash, ChainTransaction>>,
    sent: Mutex<Vec<Bytes>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(VecDeque::new()),
            last_balance: Mutex::new(U256::ZERO),
            pending_nonce: Mutex::new(0),
            gas_price: 1_000_000_000,
            submit_error: Mutex::new(None),
            submit_dropped: Mutex::new(false),
            receipt_mode: Mutex::new(ReceiptMode::Confirm),
            transactions: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Queue balances returned by successive `get_balance` calls. Once the
    /// queue is empty the last balance is repeated.
    pub fn with_balances(self, balances: &[U256]) -> Self {
        self.balances.lock().unwrap().extend(balances.iter().copied().map(Some));
        self
    }

    /// Next `get_balance` call fails with a transport error
    pub fn push_balance_error(&self) {
        self.balances.lock().unwrap().push_back(None);
    }

    pub fn push_balance(&self, balance: U256) {
        self.balances.lock().unwrap().push_back(Some(balance));
    }

    pub fn with_pending_nonce(self, nonce: u64) -> Self {
        *self.pending_nonce.lock().unwrap() = nonce;
        self
    }

    pub fn set_submit_error(&self, message: Option<&str>) {
        *self.submit_error.lock().unwrap() = message.map(str::to_string);
    }

    /// Submissions fail with a transport error, leaving it unknown whether
    /// the node received them
    pub fn set_submit_dropped(&self, dropped: bool) {
        *self.submit_dropped.lock().unwrap() = dropped;
    }

    pub fn pending_nonce(&self) -> u64 {
        *self.pending_nonce.lock().unwrap()
    }

    pub fn set_receipt_mode(&self, mode: ReceiptMode) {
        *self.receipt_mode.lock().unwrap() = mode;
    }

    pub fn add_transaction(&self, tx: ChainTransaction) {
        self.transactions.lock().unwrap().insert(tx.hash, tx);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Every raw transaction submitted so far, decoded
    pub fn sent_transactions(&self) -> Vec<TxEnvelope> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|raw| TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap())
            .collect()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_balance(&self, _address: Address) -> Result<U256> {
        let next = self.balances.lock().unwrap().pop_front();
        match next {
            Some(Some(balance)) => {
                *self.last_balance.lock().unwrap() = balance;
                Ok(balance)
            }
            Some(None) => Err(RpcError::Connection("connection reset".to_string()).into()),
            None => Ok(*self.last_balance.lock().unwrap()),
        }
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<u64> {
        Ok(*self.pending_nonce.lock().unwrap())
    }

    async fn get_gas_price(&self) -> Result<u128> {
        Ok(self.gas_price)
    }

    async fn get_transaction(&self, hash: TxHash) -> Result<Option<ChainTransaction>> {
        Ok(self.transactions.lock().unwrap().get(&hash).cloned())
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash> {
        self.sent.lock().unwrap().push(raw.clone());

        if *self.submit_dropped.lock().unwrap() {
            return Err(RpcError::Timeout { seconds: 30 }.into());
        }

        if let Some(message) = self.submit_error.lock().unwrap().clone() {
            return Err(RpcError::Method { code: -32000, message }.into());
        }

        *self.pending_nonce.lock().unwrap() += 1;
        Ok(keccak256(raw))
    }

    async fn wait_for_receipt(&self, hash: TxHash, _timeout: Duration) -> Result<Option<ChainReceipt>> {
        let mode = *self.receipt_mode.lock().unwrap();
        Ok(match mode {
            ReceiptMode::Confirm => Some(ChainReceipt {
                transaction_hash: hash,
                block_number: Some(1),
                success: true,
            }),
            ReceiptMode::Revert => Some(ChainReceipt {
                transaction_hash: hash,
                block_number: Some(7),
                success: false,
            }),
            ReceiptMode::Timeout => None,
        })
    }
}

pub fn test_profile(token_decimals: Option<u32>) -> NetworkProfile {
    let name = NetworkName::LineaSepolia;
    NetworkProfile {
        name,
        native_symbol: name.native_symbol(),
        rpc_url: "http://localhost:8545".to_string(),
        ws_url: None,
        token: token_decimals.map(|decimals| TokenContract {
            address: TOKEN.parse().unwrap(),
            abi: serde_json::from_str::<JsonAbi>(ERC20_TRANSFER_ABI).unwrap(),
            decimals,
        }),
        chain_id: name.chain_id(),
    }
}

pub fn settings(asset: AssetKind, min_income: Decimal) -> ForwardSettings {
    ForwardSettings {
        receiver: receiver(),
        asset,
        gas_limit: 21_000,
        token_gas_limit: 100_000,
        min_income,
        confirmation_timeout: Duration::from_secs(5),
    }
}

pub fn forwarder(client: &Arc<MockChainClient>, asset: AssetKind, min_income: Decimal) -> Forwarder {
    let profile = test_profile(Some(6));
    Forwarder::new(
        client.clone(),
        Wallet::from_private_key(DEV_KEY).unwrap(),
        profile,
        settings(asset, min_income),
    )
    .unwrap()
}

pub fn watcher(client: &Arc<MockChainClient>, min_income: Decimal, accept_receiver: bool) -> Watcher {
    Watcher::new(
        client.clone(),
        forwarder(client, AssetKind::Native, min_income),
        WatchSettings {
            poll_interval: Duration::from_millis(10),
            accept_receiver_as_recipient: accept_receiver,
        },
    )
}
