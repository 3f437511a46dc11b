use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use rust_decimal::Decimal;
use serde_json::json;

use crate::error::TransferError;
use crate::logging::LogContext;
use crate::network::TokenContract;
use crate::transfer::amount::{to_base_units, NATIVE_DECIMALS};

sol! {
    function transfer(address to, uint256 amount) returns (bool);
}

/// A transaction ready to be signed. Consumed by the dispatcher exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub nonce: u64,
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
    pub input: Option<Bytes>,
}

/// Native coin transfer of `amount` whole units
#[allow(clippy::too_many_arguments)]
pub fn build_native_transfer(
    sender: Address,
    receiver: Address,
    amount: Decimal,
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    chain_id: u64,
) -> Result<UnsignedTransaction, TransferError> {
    let value = to_base_units(amount, NATIVE_DECIMALS)?;

    LogContext::new("builder", "native_transfer")
        .with_address(&receiver)
        .with_amount(&amount.to_string())
        .with_nonce(nonce)
        .trace("Built native transfer");

    Ok(UnsignedTransaction {
        from: sender,
        nonce,
        to: receiver,
        value,
        gas_limit,
        gas_price,
        chain_id,
        input: None,
    })
}

/// Token `transfer(receiver, amount)` call. The amount is already in the
/// token's base units.
#[allow(clippy::too_many_arguments)]
pub fn build_token_transfer(
    token: &TokenContract,
    receiver: Address,
    amount_base_units: U256,
    sender: Address,
    chain_id: u64,
    gas_limit: u64,
    nonce: u64,
    gas_price: u128,
) -> Result<UnsignedTransaction, TransferError> {
    let has_transfer = token
        .abi
        .function("transfer")
        .is_some_and(|overloads| overloads.iter().any(|f| f.selector().0 == transferCall::SELECTOR));
    if !has_transfer {
        return Err(TransferError::ContractEncoding(format!(
            "ABI of {} has no transfer(address,uint256)",
            token.address
        )));
    }

    let input = transferCall {
        to: receiver,
        amount: amount_base_units,
    }
    .abi_encode();

    LogContext::new("builder", "token_transfer")
        .with_address(&receiver)
        .with_metadata("token", json!(token.address.to_string()))
        .with_metadata("amount_base_units", json!(amount_base_units.to_string()))
        .with_nonce(nonce)
        .trace("Built token transfer");

    Ok(UnsignedTransaction {
        from: sender,
        nonce,
        to: token.address,
        value: U256::ZERO,
        gas_limit,
        gas_price,
        chain_id,
        input: Some(input.into()),
    })
}
