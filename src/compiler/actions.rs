//! Builds one [`Action`] per hop, wiring data dependencies between hops with
//! chained references. The walk is left to right with a single running
//! reference key: a hop that is not funded by the route input reads the key
//! the previous producer wrote.

use alloy_primitives::U256;

use super::chained_ref::{chained_reference, output_reference};
use super::classify::{classify_hop, HopKind};
use super::error::CompileError;
use super::model::{Action, ActionKind, RouteContext, SwapStep};

impl From<HopKind> for ActionKind {
    fn from(kind: HopKind) -> Self {
        match kind {
            HopKind::Swap => ActionKind::Swap,
            HopKind::Join => ActionKind::Join,
            HopKind::Exit => ActionKind::Exit,
        }
    }
}

pub fn build_actions(
    context: &RouteContext,
    hops: &[SwapStep],
) -> Result<Vec<Action>, CompileError> {
    if hops.is_empty() {
        return Err(CompileError::empty_route("route has no hops"));
    }

    let token_in_index = asset_index(context, context.token_in, "tokenIn")?;
    let token_out_index = asset_index(context, context.token_out, "tokenOut")?;

    let mut actions = Vec::with_capacity(hops.len());
    let mut ref_key: u64 = 0;

    for hop in hops {
        if !context.pools.contains_key(&hop.pool_id) {
            return Err(CompileError::unknown_pool(format!(
                "pool {} is not in the supplied pool set",
                hop.pool_id
            )));
        }
        let kind = classify_hop(hop, &context.assets)?;

        let mut swap = hop.clone();
        let mut output_refs = Vec::new();
        let mut min_out = U256::ZERO;

        if swap.asset_in_index == token_in_index && swap.asset_out_index == token_out_index {
            // Single-leg route: funded externally, exits externally, no
            // reference needed.
            min_out = context.return_amount;
        } else if swap.asset_in_index == token_in_index {
            output_refs.push(output_reference(ref_key, swap.asset_out_index));
            ref_key += 1;
        } else if swap.asset_out_index == token_out_index {
            swap.amount = chained_reference(previous_key(ref_key, hop)?, true);
            min_out = context.return_amount;
        } else {
            // Middle leg. Joins and exits run as standalone calls, so their
            // amount must be read back from the previous producer; plain
            // swaps stay inside a batch where the vault itself forwards the
            // previous leg's output.
            if matches!(kind, HopKind::Join | HopKind::Exit) {
                swap.amount = chained_reference(previous_key(ref_key, hop)?, true);
            }
            output_refs.push(output_reference(ref_key, swap.asset_out_index));
            ref_key += 1;
        }

        actions.push(Action {
            kind: kind.into(),
            swaps: vec![swap],
            output_refs,
            min_out,
        });
    }

    Ok(actions)
}

fn asset_index(
    context: &RouteContext,
    token: alloy_primitives::Address,
    label: &str,
) -> Result<usize, CompileError> {
    context
        .assets
        .iter()
        .position(|asset| *asset == token)
        .ok_or_else(|| CompileError::invalid(format!("{} is not in the asset list", label)))
}

fn previous_key(ref_key: u64, hop: &SwapStep) -> Result<U256, CompileError> {
    if ref_key == 0 {
        return Err(CompileError::invalid(format!(
            "hop through pool {} consumes an amount no earlier hop produced",
            hop.pool_id
        )));
    }
    Ok(U256::from(ref_key - 1))
}
