use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};

use super::chained_ref::OutputReference;

/// One vault swap step. Asset indices point into the route's asset list.
/// `amount` is either a literal amount or a chained reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStep {
    pub pool_id: B256,
    pub asset_in_index: usize,
    pub asset_out_index: usize,
    pub amount: U256,
    pub user_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Swap,
    Join,
    Exit,
    BatchSwap,
}

/// A schedulable unit: one join/exit/swap (or, after scheduling, a batch of
/// swaps) together with the output slots it writes and the minimum output it
/// guarantees. Pure value object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    /// Only `BatchSwap` holds more than one step.
    pub swaps: Vec<SwapStep>,
    pub output_refs: Vec<OutputReference>,
    /// Zero unless this action produces the route's final output.
    pub min_out: U256,
}

/// Registry-supplied pool metadata. The pool's share token address is the
/// top 20 bytes of its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMeta {
    pub id: B256,
    pub tokens: Vec<Address>,
}

/// Read-only route-wide inputs every compile stage receives explicitly.
#[derive(Debug, Clone)]
pub struct RouteContext {
    pub token_in: Address,
    pub token_out: Address,
    pub assets: Vec<Address>,
    pub swap_amount: U256,
    pub return_amount: U256,
    pub user: Address,
    pub relayer: Address,
    pub deadline: U256,
    pub pools: HashMap<B256, PoolMeta>,
    /// Share-token addresses of every pool participating in the route.
    pub share_tokens: HashSet<Address>,
}

impl RouteContext {
    pub fn is_share_token(&self, address: Address) -> bool {
        self.share_tokens.contains(&address)
    }
}
