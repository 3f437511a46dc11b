use alloy::primitives::{Address, TxHash, U256, B256};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::blockchain::{ChainClient, ChainEvent, ChainTransaction, Subscription, TRANSFER_EVENT_TOPIC};
use crate::config::AppConfig;
use crate::error::{ForwarderError, Result, SubscriptionError};
use crate::forwarder::Forwarder;
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::transfer::amount::{format_units, from_base_units, NATIVE_DECIMALS};
use crate::transfer::DispatchResult;

/// Where the watcher is within one observation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Idle,
    Observing,
    Evaluating,
    Forwarding,
}

/// Balance baseline carried between polling cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    pub last_balance: Option<U256>,
}

/// What a single cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// First observation; nothing to compare against yet
    Seeded { balance: U256 },
    Unchanged,
    Decreased { balance: U256 },
    BelowThreshold { amount: Decimal },
    Forwarded { amount: Decimal, result: DispatchResult },
    ForwardFailed { amount: Decimal, error: ForwarderError },
    NotFound { hash: TxHash },
    Irrelevant { hash: TxHash },
    Duplicate { hash: TxHash },
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub accept_receiver_as_recipient: bool,
}

impl WatchSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.watch.poll_interval_seconds),
            accept_receiver_as_recipient: config.watch.accept_receiver_as_recipient,
        }
    }
}

/// Watches the sender account and forwards incoming value
pub struct Watcher {
    client: Arc<dyn ChainClient>,
    forwarder: Forwarder,
    settings: WatchSettings,
    state: WatchState,
    phase: WatchPhase,
    /// Incoming transactions already acted on
    seen: HashSet<TxHash>,
    /// Incoming token transfer logs already acted on
    seen_logs: HashSet<(TxHash, Option<u64>)>,
}

impl Watcher {
    pub fn new(client: Arc<dyn ChainClient>, forwarder: Forwarder, settings: WatchSettings) -> Self {
        Self {
            client,
            forwarder,
            settings,
            state: WatchState::default(),
            phase: WatchPhase::Idle,
            seen: HashSet::new(),
            seen_logs: HashSet::new(),
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    /// Whether `hash` was classified as incoming and acted on
    pub fn has_seen(&self, hash: &TxHash) -> bool {
        self.seen.contains(hash)
    }

    fn monitored(&self) -> Address {
        self.forwarder.sender()
    }

    /// Poll the balance on a fixed interval until the task is cancelled.
    /// Failed cycles are logged and the next tick tries again.
    pub async fn run_polling(&mut self) -> Result<()> {
        LogContext::new("watcher", "run_polling")
            .with_address(&self.monitored())
            .with_network(self.forwarder.profile().name.as_str())
            .with_metadata("interval_ms", json!(self.settings.poll_interval.as_millis() as u64))
            .info("Starting balance polling");

        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.poll_once().await {
                ErrorLogger::log_error(&e, Some(LogContext::new("watcher", "poll_once")));
            }
        }
    }

    /// One polling cycle: observe the balance, forward any increase of at
    /// least the minimum income, then move the baseline to the new balance.
    ///
    /// An observation error leaves the baseline untouched.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome> {
        let monitored = self.monitored();

        self.phase = WatchPhase::Observing;
        let balance = match self.client.get_balance(monitored).await {
            Ok(balance) => balance,
            Err(e) => {
                self.phase = WatchPhase::Idle;
                return Err(e);
            }
        };
        MetricsLogger::log_balance_observed(
            &monitored,
            &format_units(balance, NATIVE_DECIMALS),
            self.state
                .last_balance
                .map(|b| format_units(b, NATIVE_DECIMALS))
                .as_deref(),
        );

        self.phase = WatchPhase::Evaluating;
        let outcome = match self.state.last_balance {
            None => CycleOutcome::Seeded { balance },
            Some(previous) if balance == previous => CycleOutcome::Unchanged,
            Some(previous) if balance < previous => CycleOutcome::Decreased { balance },
            Some(previous) => {
                let increase = balance - previous;
                match from_base_units(increase, NATIVE_DECIMALS) {
                    Ok(amount) if amount >= self.forwarder.min_income() => {
                        LogContext::new("watcher", "poll_once")
                            .with_address(&monitored)
                            .with_amount(&amount.to_string())
                            .info("Incoming funds detected");
                        self.forward(amount, false).await
                    }
                    Ok(amount) => CycleOutcome::BelowThreshold { amount },
                    Err(e) => {
                        let error = ForwarderError::from(e);
                        ErrorLogger::log_error(&error, Some(LogContext::new("watcher", "poll_once")));
                        CycleOutcome::ForwardFailed {
                            amount: Decimal::ZERO,
                            error,
                        }
                    }
                }
            }
        };

        self.state.last_balance = Some(balance);
        self.phase = WatchPhase::Idle;
        Ok(outcome)
    }

    /// Consume push events until the feed closes
    pub async fn run_push(&mut self, subscription: &mut Subscription) -> Result<()> {
        LogContext::new("watcher", "run_push")
            .with_address(&self.monitored())
            .with_network(self.forwarder.profile().name.as_str())
            .info("Listening for incoming transactions");

        loop {
            match subscription.next().await {
                ChainEvent::PendingTransaction(hash) => {
                    if let Err(e) = self.handle_transaction(hash).await {
                        ErrorLogger::log_error(
                            &e,
                            Some(LogContext::new("watcher", "handle_transaction").with_transaction_hash(&hash)),
                        );
                    }
                }
                ChainEvent::Log {
                    address,
                    topics,
                    data,
                    transaction_hash,
                    log_index,
                } => {
                    if let Err(e) = self.handle_log(address, &topics, &data, transaction_hash, log_index).await {
                        ErrorLogger::log_error(&e, Some(LogContext::new("watcher", "handle_log")));
                    }
                }
                ChainEvent::ConnectionError(message) => {
                    LogContext::new("watcher", "run_push").error(&format!("WebSocket error: {}", message));
                }
                ChainEvent::ConnectionClosed => {
                    LogContext::new("watcher", "run_push").critical("WebSocket closed");
                    self.phase = WatchPhase::Idle;
                    return Err(SubscriptionError::Closed.into());
                }
            }
        }
    }

    /// Fetch a pushed transaction and forward its value when it pays the
    /// monitored account more than the minimum income. Each incoming hash is
    /// handled once; only incoming hashes are remembered.
    pub async fn handle_transaction(&mut self, hash: TxHash) -> Result<CycleOutcome> {
        if self.seen.contains(&hash) {
            return Ok(CycleOutcome::Duplicate { hash });
        }

        self.phase = WatchPhase::Observing;
        let tx = match self.client.get_transaction(hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                self.phase = WatchPhase::Idle;
                LogContext::new("watcher", "handle_transaction")
                    .with_transaction_hash(&hash)
                    .info("Transaction not found");
                return Ok(CycleOutcome::NotFound { hash });
            }
            Err(e) => {
                self.phase = WatchPhase::Idle;
                return Err(e);
            }
        };

        self.phase = WatchPhase::Evaluating;
        let outcome = if !self.is_incoming(&tx) {
            CycleOutcome::Irrelevant { hash }
        } else {
            self.seen.insert(hash);
            match from_base_units(tx.value, NATIVE_DECIMALS) {
                Ok(amount) if amount > self.forwarder.min_income() => {
                    LogContext::new("watcher", "handle_transaction")
                        .with_transaction_hash(&hash)
                        .with_address(&tx.from)
                        .with_amount(&amount.to_string())
                        .info("Found incoming transaction");
                    self.forward(amount, false).await
                }
                Ok(amount) => CycleOutcome::BelowThreshold { amount },
                Err(e) => CycleOutcome::ForwardFailed {
                    amount: Decimal::ZERO,
                    error: e.into(),
                },
            }
        };

        self.phase = WatchPhase::Idle;
        Ok(outcome)
    }

    /// Handle an ERC-20 `Transfer` log. Logs from the network's token that
    /// pay the monitored account more than the minimum income are forwarded
    /// as a token transfer of the logged amount. Anything else yields `None`.
    pub async fn handle_log(
        &mut self,
        address: Address,
        topics: &[B256],
        data: &[u8],
        transaction_hash: Option<TxHash>,
        log_index: Option<u64>,
    ) -> Result<Option<CycleOutcome>> {
        let monitored = self.monitored();
        let Some((token_address, decimals)) = self
            .forwarder
            .profile()
            .token
            .as_ref()
            .map(|token| (token.address, token.decimals))
        else {
            return Ok(None);
        };
        if address != token_address || topics.len() != 3 || topics[0] != TRANSFER_EVENT_TOPIC {
            return Ok(None);
        }
        // topics[1] is the payer, topics[2] the payee
        if topics[2] != monitored.into_word() || topics[1] == monitored.into_word() {
            return Ok(None);
        }
        let Some(hash) = transaction_hash else {
            return Ok(None);
        };
        if !self.seen_logs.insert((hash, log_index)) {
            return Ok(Some(CycleOutcome::Duplicate { hash }));
        }

        self.phase = WatchPhase::Evaluating;
        let Some(value) = data.get(..32).map(U256::from_be_slice) else {
            self.phase = WatchPhase::Idle;
            LogContext::new("watcher", "handle_log")
                .with_transaction_hash(&hash)
                .warn("Transfer log without an amount");
            return Ok(Some(CycleOutcome::Irrelevant { hash }));
        };

        let outcome = match from_base_units(value, decimals) {
            Ok(amount) if amount > self.forwarder.min_income() => {
                LogContext::new("watcher", "handle_log")
                    .with_transaction_hash(&hash)
                    .with_address(&Address::from_word(topics[1]))
                    .with_amount(&amount.to_string())
                    .info("Found incoming token transfer");
                self.forward(amount, true).await
            }
            Ok(amount) => CycleOutcome::BelowThreshold { amount },
            Err(e) => CycleOutcome::ForwardFailed {
                amount: Decimal::ZERO,
                error: e.into(),
            },
        };

        self.phase = WatchPhase::Idle;
        Ok(Some(outcome))
    }

    fn is_incoming(&self, tx: &ChainTransaction) -> bool {
        // Our own forwards are never income
        if tx.from == self.monitored() {
            return false;
        }

        match tx.to {
            Some(to) if to == self.monitored() => true,
            Some(to) => self.settings.accept_receiver_as_recipient && to == self.forwarder.receiver(),
            None => false,
        }
    }

    /// Token income always leaves as the token; anything else goes out in
    /// the configured asset
    async fn forward(&mut self, amount: Decimal, token_income: bool) -> CycleOutcome {
        self.phase = WatchPhase::Forwarding;

        let result = if token_income {
            self.forwarder.forward_token(amount).await
        } else {
            self.forwarder.forward(amount).await
        };
        match result {
            Ok(result) => CycleOutcome::Forwarded { amount, result },
            Err(error) => {
                ErrorLogger::log_error(
                    &error,
                    Some(LogContext::new("watcher", "forward").with_amount(&amount.to_string())),
                );
                CycleOutcome::ForwardFailed { amount, error }
            }
        }
    }
}
