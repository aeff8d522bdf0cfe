use ethers::types::U256;
use ethers::utils::{ParseUnits, format_units, parse_units};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    Zero,
    Invalid,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "amount is empty"),
            AmountError::Zero => write!(f, "amount is zero"),
            AmountError::Invalid => write!(f, "amount is not a valid number"),
        }
    }
}

impl std::error::Error for AmountError {}

/// User input ("12.5") to base units. Negative values are invalid.
pub fn parse_amount(input: &str, decimals: u32) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) if value.is_zero() => Err(AmountError::Zero),
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) | Err(_) => Err(AmountError::Invalid),
    }
}

/// Base units back to a decimal string, trailing zeros trimmed ("1.5", "1000").
pub fn format_amount(value: U256, decimals: u32) -> String {
    match format_units(value, decimals) {
        Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}
