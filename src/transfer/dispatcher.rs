use alloy::primitives::{Address, TxHash, U256};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::blockchain::ChainClient;
use crate::error::{DispatchError, ForwarderError, Result, RpcError};
use crate::logging::LogContext;
use crate::transfer::builder::UnsignedTransaction;
use crate::transfer::wallet::Wallet;

/// Final outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Confirmed { hash: TxHash },
    SubmissionFailed { reason: String },
    /// Amounts in base units; `None` when the figure could not be determined
    InsufficientFunds {
        required: Option<U256>,
        available: Option<U256>,
    },
}

impl DispatchResult {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, DispatchResult::Confirmed { .. })
    }
}

/// Figures extracted from a node's "insufficient funds" rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientFunds {
    pub required: Option<U256>,
    pub available: Option<U256>,
}

#[derive(Debug, Default)]
struct NonceLedger {
    /// Lowest nonce never handed out
    next: u64,
    /// Nonces already signed, at or above the chain's pending count
    used: BTreeSet<u64>,
}

/// Signs, submits and confirms transactions, one at a time.
///
/// Nonces are tracked per sender so that none is signed twice while it may be
/// in flight. A nonce the node explicitly rejected is released for reuse;
/// one lost to a transport failure or a missing receipt stays burned.
pub struct Dispatcher {
    client: Arc<dyn ChainClient>,
    nonces: Mutex<HashMap<Address, NonceLedger>>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client,
            nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Next nonce for `sender`: the chain's pending count, or one past the
    /// last nonce handed out if that is higher.
    pub async fn reserve_nonce(&self, sender: Address) -> Result<u64> {
        let pending = self.client.get_transaction_count(sender).await?;

        let mut nonces = self.lock_nonces();
        let ledger = nonces.entry(sender).or_default();
        let nonce = pending.max(ledger.next);
        ledger.next = nonce + 1;
        ledger.used = ledger.used.split_off(&pending);
        drop(nonces);

        LogContext::new("dispatcher", "reserve_nonce")
            .with_address(&sender)
            .with_nonce(nonce)
            .with_metadata("pending_count", json!(pending))
            .debug("Reserved nonce");

        Ok(nonce)
    }

    /// Sign and submit `tx`, then wait up to `confirmation_timeout` for its receipt.
    ///
    /// Rejections come back as `DispatchResult` values. A missing receipt is
    /// `DispatchError::ConfirmationTimeout`. Nothing is resubmitted.
    pub async fn send(
        &self,
        tx: UnsignedTransaction,
        wallet: &Wallet,
        confirmation_timeout: Duration,
    ) -> Result<DispatchResult> {
        let sender = wallet.address();
        if tx.from != sender {
            return Err(DispatchError::Signing(format!(
                "transaction is from {} but the wallet signs for {}",
                tx.from, sender
            ))
            .into());
        }

        let context = LogContext::new("dispatcher", "send")
            .with_address(&sender)
            .with_nonce(tx.nonce)
            .with_metadata("to", json!(tx.to.to_string()))
            .with_metadata("value", json!(tx.value.to_string()));

        if !self.mark_used(sender, tx.nonce) {
            let reason = format!("nonce {} was already used by {}", tx.nonce, sender);
            context.error(&format!("Refusing to sign: {}", reason));
            return Ok(DispatchResult::SubmissionFailed { reason });
        }

        let tx_nonce = tx.nonce;
        let signed = wallet.sign(tx)?;
        context.info(&format!("Submitting transaction {}", signed.hash));

        let hash = match self.client.send_raw_transaction(&signed.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                let reason = e.to_string();
                if matches!(e, ForwarderError::Rpc(RpcError::Method { .. })) {
                    self.release_nonce(sender, tx_nonce);
                }
                if let Some(shortfall) = parse_insufficient_funds(&reason) {
                    let available = match self.client.get_balance(sender).await {
                        Ok(balance) => Some(balance),
                        Err(_) => shortfall.available,
                    };
                    return Ok(DispatchResult::InsufficientFunds {
                        required: shortfall.required,
                        available,
                    });
                }

                context.error(&format!("Submission rejected: {}", reason));
                return Ok(DispatchResult::SubmissionFailed { reason });
            }
        };

        let context = context.with_transaction_hash(&hash);
        context.info("Transaction accepted, waiting for receipt");

        match self.client.wait_for_receipt(hash, confirmation_timeout).await? {
            None => Err(DispatchError::ConfirmationTimeout {
                hash,
                seconds: confirmation_timeout.as_secs(),
            }
            .into()),
            Some(receipt) if !receipt.success => {
                let reason = match receipt.block_number {
                    Some(block) => format!("reverted in block {}", block),
                    None => "reverted".to_string(),
                };
                context.error(&format!("Transaction {}", reason));
                Ok(DispatchResult::SubmissionFailed { reason })
            }
            Some(_) => Ok(DispatchResult::Confirmed { hash }),
        }
    }

    /// Record `nonce` as signed. `false` if it already was.
    fn mark_used(&self, sender: Address, nonce: u64) -> bool {
        let mut nonces = self.lock_nonces();
        let ledger = nonces.entry(sender).or_default();
        if !ledger.used.insert(nonce) {
            return false;
        }
        ledger.next = ledger.next.max(nonce + 1);
        true
    }

    /// Forget `nonce` when no transaction carrying it can be in flight: it
    /// was reserved but never passed to `send`, or the node refused it
    /// outright. The next reservation hands it out again.
    pub fn release_nonce(&self, sender: Address, nonce: u64) {
        let mut nonces = self.lock_nonces();
        let ledger = nonces.entry(sender).or_default();
        ledger.used.remove(&nonce);
        if ledger.next == nonce + 1 {
            ledger.next = nonce;
        }
        drop(nonces);

        LogContext::new("dispatcher", "release_nonce")
            .with_address(&sender)
            .with_nonce(nonce)
            .debug("Released rejected nonce");
    }

    fn lock_nonces(&self) -> std::sync::MutexGuard<'_, HashMap<Address, NonceLedger>> {
        // The ledger holds plain data, so a poisoned lock is still consistent
        self.nonces.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Recognise a node's "insufficient funds" rejection and pull out the
/// `want`/`have` figures when the message carries them.
///
/// Geth-style nodes reply with
/// `insufficient funds for gas * price + value: address 0x.. have 1000 want 2000`.
pub fn parse_insufficient_funds(message: &str) -> Option<InsufficientFunds> {
    let lower = message.to_ascii_lowercase();
    if !lower.contains("insufficient funds") {
        return None;
    }

    Some(InsufficientFunds {
        required: number_after(&lower, "want "),
        available: number_after(&lower, "have "),
    })
}

fn number_after(message: &str, marker: &str) -> Option<U256> {
    let start = message.find(marker)? + marker.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(&digits, 10).ok()
}
