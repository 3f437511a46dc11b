pub mod amount;
pub mod builder;
pub mod dispatcher;
pub mod wallet;

pub use builder::{build_native_transfer, build_token_transfer, UnsignedTransaction};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use wallet::{SignedTransaction, Wallet};

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TransferError;

/// Asset a forward is paid in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Native,
    Token,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => f.write_str("native"),
            AssetKind::Token => f.write_str("token"),
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "ether" | "eth" => Ok(AssetKind::Native),
            "token" | "erc20" => Ok(AssetKind::Token),
            other => Err(format!("unknown asset '{}'", other)),
        }
    }
}

/// A validated intent to move `amount` whole units from sender to receiver
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    sender: Address,
    receiver: Address,
    amount: Decimal,
    asset: AssetKind,
    gas_limit: u64,
    chain_id: u64,
}

impl TransferRequest {
    /// Rejects amounts that are not strictly positive or fall below `minimum`
    pub fn new(
        sender: Address,
        receiver: Address,
        amount: Decimal,
        asset: AssetKind,
        gas_limit: u64,
        chain_id: u64,
        minimum: Decimal,
    ) -> Result<Self, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::NonPositiveAmount {
                amount: amount.to_string(),
            });
        }
        if amount < minimum {
            return Err(TransferError::BelowThreshold {
                amount: amount.to_string(),
                minimum: minimum.to_string(),
            });
        }

        Ok(Self {
            sender,
            receiver,
            amount,
            asset,
            gas_limit,
            chain_id,
        })
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn receiver(&self) -> Address {
        self.receiver
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn asset(&self) -> AssetKind {
        self.asset
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
