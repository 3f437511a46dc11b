//! Holds the sender key and signs relay transactions.
//!
//! The key never leaves this module: it is not logged, not serialized and
//! redacted from `Debug` output.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;

use crate::error::DispatchError;
use crate::logging::LogContext;
use crate::transfer::builder::UnsignedTransaction;

/// Signing key of the monitored account
pub struct Wallet {
    signer: PrivateKeySigner,
}

/// Raw EIP-2718 bytes ready for `eth_sendRawTransaction`
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub hash: TxHash,
    pub nonce: u64,
    pub raw: Bytes,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key, with or without 0x prefix
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, DispatchError> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| DispatchError::Wallet(format!("Invalid private key format: {}", e)))?;

        LogContext::new("wallet", "initialization")
            .with_address(&signer.address())
            .info("Wallet initialized");

        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign as an EIP-155 legacy transaction
    pub fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction, DispatchError> {
        let mut legacy = TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            input: tx.input.unwrap_or_default(),
        };

        let signature = TxSignerSync::sign_transaction_sync(&self.signer, &mut legacy)
            .map_err(|e| DispatchError::Signing(e.to_string()))?;
        let signed = legacy.into_signed(signature);
        let hash = *signed.hash();
        let envelope: TxEnvelope = signed.into();

        Ok(SignedTransaction {
            hash,
            nonce: tx.nonce,
            raw: envelope.encoded_2718().into(),
        })
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
