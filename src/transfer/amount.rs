//! Conversion between whole-unit decimal amounts and on-chain base units.

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::error::TransferError;

/// Decimals of every supported native coin
pub const NATIVE_DECIMALS: u32 = 18;

/// Convert a whole-unit amount into base units (`amount * 10^decimals`).
///
/// Fails when the amount is negative, carries more fractional digits than
/// `decimals`, or overflows 256 bits.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, TransferError> {
    if amount < Decimal::ZERO {
        return Err(TransferError::AmountConversion(format!(
            "negative amount {}",
            amount
        )));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > decimals {
        return Err(TransferError::AmountConversion(format!(
            "{} has more than {} fractional digits",
            amount, decimals
        )));
    }

    let mantissa = u128::try_from(normalized.mantissa())
        .map_err(|_| TransferError::AmountConversion(amount.to_string()))?;
    let factor = U256::from(10u64)
        .checked_pow(U256::from(decimals - scale))
        .ok_or_else(|| TransferError::AmountConversion(format!("10^{} overflows", decimals - scale)))?;

    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or_else(|| TransferError::AmountConversion(format!("{} overflows 256 bits", amount)))
}

/// Convert base units back into a whole-unit amount.
///
/// Balances above the decimal range (about 7.9e28 base units) cannot be represented.
pub fn from_base_units(value: U256, decimals: u32) -> Result<Decimal, TransferError> {
    let raw = u128::try_from(value)
        .ok()
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| TransferError::AmountConversion(format!("{} base units out of range", value)))?;

    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|d| d.normalize())
        .map_err(|e| TransferError::AmountConversion(format!("{} base units: {}", value, e)))
}

/// Render base units for log lines, falling back to the raw integer
pub fn format_units(value: U256, decimals: u32) -> String {
    from_base_units(value, decimals)
        .map(|d| d.to_string())
        .unwrap_or_else(|_| format!("{} base units", value))
}
