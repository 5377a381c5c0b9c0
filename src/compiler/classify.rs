//! Hop classification: a hop whose output token is its own pool's share
//! token mints that token (join); a hop whose input token is its own pool's
//! share token burns it (exit); anything else is a plain vault swap.

use alloy_primitives::{Address, B256};

use super::error::CompileError;
use super::model::SwapStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopKind {
    Swap,
    Join,
    Exit,
}

/// The pool's share token address, embedded in the top 20 bytes of its id.
pub fn pool_address(pool_id: B256) -> Address {
    Address::from_slice(&pool_id[..20])
}

pub fn classify_hop(hop: &SwapStep, assets: &[Address]) -> Result<HopKind, CompileError> {
    let token_in = *assets.get(hop.asset_in_index).ok_or_else(|| {
        CompileError::invalid(format!(
            "assetInIndex {} out of bounds for {} assets",
            hop.asset_in_index,
            assets.len()
        ))
    })?;
    let token_out = *assets.get(hop.asset_out_index).ok_or_else(|| {
        CompileError::invalid(format!(
            "assetOutIndex {} out of bounds for {} assets",
            hop.asset_out_index,
            assets.len()
        ))
    })?;

    let share_token = pool_address(hop.pool_id);
    let is_join = token_out == share_token;
    let is_exit = token_in == share_token;

    match (is_join, is_exit) {
        (true, true) => Err(CompileError::invalid_hop(format!(
            "hop through pool {} has its own share token on both sides",
            hop.pool_id
        ))),
        (true, false) => Ok(HopKind::Join),
        (false, true) => Ok(HopKind::Exit),
        (false, false) => Ok(HopKind::Swap),
    }
}
