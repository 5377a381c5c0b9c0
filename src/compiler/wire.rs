use std::str::FromStr;

use alloy_primitives::{hex, Address, B256, I256, U256};
use num_bigint::BigUint;

use super::error::CompileError;

pub(crate) fn parse_amount(value: &str) -> Result<U256, CompileError> {
    let amount = BigUint::from_str(value)
        .map_err(|_| CompileError::invalid(format!("Invalid amount: {}", value)))?;
    biguint_to_u256_checked(&amount, "amount")
}

pub(crate) fn parse_address(value: &str) -> Result<Address, CompileError> {
    Address::from_str(value.trim())
        .map_err(|err| CompileError::invalid(format!("Invalid address {}: {}", value, err)))
}

pub(crate) fn parse_pool_id(value: &str) -> Result<B256, CompileError> {
    B256::from_str(value.trim())
        .map_err(|err| CompileError::invalid(format!("Invalid pool id {}: {}", value, err)))
}

pub(crate) fn parse_bytes(value: &str) -> Result<Vec<u8>, CompileError> {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(stripped)
        .map_err(|err| CompileError::invalid(format!("Invalid hex payload: {}", err)))
}

pub(crate) fn format_address(address: &Address) -> String {
    format!("{:#x}", address)
}

pub(crate) fn format_calldata(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub(crate) fn biguint_to_u256_checked(value: &BigUint, label: &str) -> Result<U256, CompileError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(CompileError::invalid(format!(
            "{} must fit uint256",
            label
        )));
    }
    Ok(U256::from_be_slice(&bytes))
}

pub(crate) fn u256_to_i256_checked(value: U256, label: &str) -> Result<I256, CompileError> {
    I256::try_from(value)
        .map_err(|_| CompileError::encoding(format!("{} must fit int256", label)))
}
