//! Renders scheduled actions into relayer library calls and wraps them in
//! the outer `multicall`. Field order and encoding are fixed by the relayer
//! ABI; the signatures below are a compatibility contract.

use alloy_primitives::{Address, Keccak256, B256, I256, U256};
use alloy_sol_types::SolValue;

use super::chained_ref::{chained_reference, reference_key};
use super::classify::pool_address;
use super::error::CompileError;
use super::model::{Action, ActionKind, PoolMeta, RouteContext};
use super::wire::u256_to_i256_checked;

const JOIN_POOL_SIGNATURE: &str =
    "joinPool(bytes32,uint8,address,address,(address[],uint256[],bytes,bool),uint256,uint256)";
const EXIT_POOL_SIGNATURE: &str =
    "exitPool(bytes32,uint8,address,address,(address[],uint256[],bytes,bool),(uint256,uint256)[])";
const BATCH_SWAP_SIGNATURE: &str = "batchSwap(uint8,(bytes32,uint256,uint256,uint256,bytes)[],address[],(address,bool,address,bool),int256[],uint256,uint256,(uint256,uint256)[])";
const APPROVE_VAULT_SIGNATURE: &str = "approveVault(address,uint256)";
const SET_RELAYER_APPROVAL_SIGNATURE: &str = "setRelayerApproval(address,bool,bytes)";
const MULTICALL_SIGNATURE: &str = "multicall(bytes[])";

/// The only pool kind the relayer's join/exit entry points accept. A
/// `uint8` on the wire; encoded as a full word like every other head slot.
const POOL_KIND: U256 = U256::ZERO;
/// Exact-in batch swaps.
const GIVEN_IN: U256 = U256::ZERO;
/// joinExactTokensInForBPTOut user-data tag.
const JOIN_EXACT_TOKENS_IN_FOR_BPT_OUT: U256 = U256::from_limbs([1, 0, 0, 0]);
/// exitExactBPTInForOneTokenOut user-data tag.
const EXIT_EXACT_BPT_IN_FOR_ONE_TOKEN_OUT: U256 = U256::ZERO;

/// Encodes every scheduled action in order. Batch swaps may contribute an
/// ancillary vault-approval call in addition to their own.
pub fn encode_actions(
    context: &RouteContext,
    actions: &[Action],
) -> Result<Vec<Vec<u8>>, CompileError> {
    let mut calls = Vec::with_capacity(actions.len());
    for action in actions {
        match action.kind {
            ActionKind::Join => calls.push(build_join(context, action)?),
            ActionKind::Exit => calls.push(build_exit(context, action)?),
            ActionKind::BatchSwap => calls.extend(build_batch_swap(context, action)?),
            ActionKind::Swap => {
                return Err(CompileError::internal(
                    "unbatched swap action reached the encoder",
                ))
            }
        }
    }
    Ok(calls)
}

pub fn encode_multicall(calls: Vec<Vec<u8>>) -> Result<Vec<u8>, CompileError> {
    let args = (calls,).abi_encode_params();
    encode_function_call(MULTICALL_SIGNATURE, args)
}

pub fn build_set_relayer_approval(
    relayer: Address,
    authorisation: Vec<u8>,
) -> Result<Vec<u8>, CompileError> {
    let args = (relayer, true, authorisation).abi_encode_params();
    encode_function_call(SET_RELAYER_APPROVAL_SIGNATURE, args)
}

fn build_join(context: &RouteContext, action: &Action) -> Result<Vec<u8>, CompileError> {
    let swap = single_swap(action)?;
    let pool = pool_for(context, swap.pool_id)?;
    let sorted_tokens = sort_pool_tokens(&pool.tokens);

    let join_token = asset_at(context, swap.asset_in_index)?;
    let join_index = token_index(&sorted_tokens, join_token, pool.id, "join")?;

    let mut max_amounts_in = vec![U256::ZERO; sorted_tokens.len()];
    max_amounts_in[join_index] = swap.amount;
    let user_data = (
        JOIN_EXACT_TOKENS_IN_FOR_BPT_OUT,
        max_amounts_in.clone(),
        action.min_out,
    )
        .abi_encode_params();

    // Funds come from internal balance unless this join consumes the route
    // input token; minted share tokens stay in internal custody unless they
    // are themselves the route output.
    let from_internal = join_token != context.token_in;
    let to_internal = pool_address(pool.id) != context.token_out;
    let sender = if from_internal { context.relayer } else { context.user };
    let recipient = if to_internal { context.relayer } else { context.user };

    let output_ref_key = action
        .output_refs
        .first()
        .map(|reference| reference.key)
        .unwrap_or(U256::ZERO);

    let args = (
        swap.pool_id,
        POOL_KIND,
        sender,
        recipient,
        (sorted_tokens, max_amounts_in, user_data, from_internal),
        U256::ZERO,
        output_ref_key,
    )
        .abi_encode_params();
    encode_function_call(JOIN_POOL_SIGNATURE, args)
}

fn build_exit(context: &RouteContext, action: &Action) -> Result<Vec<u8>, CompileError> {
    let swap = single_swap(action)?;
    let pool = pool_for(context, swap.pool_id)?;
    let sorted_tokens = sort_pool_tokens(&pool.tokens);

    let exit_token = asset_at(context, swap.asset_out_index)?;
    let exit_index = token_index(&sorted_tokens, exit_token, pool.id, "exit")?;

    let mut min_amounts_out = vec![U256::ZERO; sorted_tokens.len()];
    min_amounts_out[exit_index] = action.min_out;
    let user_data = (
        EXIT_EXACT_BPT_IN_FOR_ONE_TOKEN_OUT,
        swap.amount,
        U256::from(exit_index),
    )
        .abi_encode_params();

    // Withdrawn funds go to internal custody unless this exit produces the
    // route output token.
    let to_internal = exit_token != context.token_out;
    let recipient = if to_internal { context.relayer } else { context.user };

    let args = (
        swap.pool_id,
        POOL_KIND,
        context.user,
        recipient,
        (sorted_tokens, min_amounts_out, user_data, to_internal),
        output_ref_tuples(action),
    )
        .abi_encode_params();
    encode_function_call(EXIT_POOL_SIGNATURE, args)
}

fn build_batch_swap(
    context: &RouteContext,
    action: &Action,
) -> Result<Vec<Vec<u8>>, CompileError> {
    let first = action
        .swaps
        .first()
        .ok_or_else(|| CompileError::internal("batch swap action without swaps"))?;
    let last = action.swaps.last().unwrap_or(first);
    let token_in_index = first.asset_in_index;
    let token_out_index = last.asset_out_index;
    let batch_token_in = asset_at(context, token_in_index)?;
    let batch_token_out = asset_at(context, token_out_index)?;

    let mut calls = Vec::with_capacity(2);
    let mut limits = vec![I256::ZERO; context.assets.len()];
    let mut from_internal = true;
    let mut to_internal = true;

    // Share tokens cannot be exited from internal balance, so a batch ending
    // in one (or in the route output) pays out externally; the limit then
    // enforces the guaranteed minimum.
    if batch_token_out == context.token_out || context.is_share_token(batch_token_out) {
        to_internal = false;
        limits[token_out_index] = -u256_to_i256_checked(action.min_out, "minOut")?;
    }

    let sender = if batch_token_in == context.token_in {
        from_internal = false;
        limits[token_in_index] = u256_to_i256_checked(context.swap_amount, "swapAmount")?;
        context.user
    } else if context.is_share_token(batch_token_in) {
        // A share token cannot be swapped from internal balance either, and
        // the vault needs an allowance from the relayer for it. The amount
        // was written as a temporary reference consumed by this batch, so
        // the approval re-reads it through the read-only flavor.
        let readonly = chained_reference(reference_key(first.amount), false);
        calls.push(encode_approve_vault(batch_token_in, readonly)?);
        from_internal = false;
        limits[token_in_index] = I256::MAX;
        context.relayer
    } else {
        limits[token_in_index] = I256::MAX;
        context.relayer
    };
    let recipient = if to_internal { context.relayer } else { context.user };

    let steps: Vec<(B256, U256, U256, U256, Vec<u8>)> = action
        .swaps
        .iter()
        .map(|swap| {
            (
                swap.pool_id,
                U256::from(swap.asset_in_index),
                U256::from(swap.asset_out_index),
                swap.amount,
                swap.user_data.clone(),
            )
        })
        .collect();

    let args = (
        GIVEN_IN,
        steps,
        context.assets.clone(),
        (sender, from_internal, recipient, to_internal),
        limits,
        context.deadline,
        U256::ZERO,
        output_ref_tuples(action),
    )
        .abi_encode_params();
    calls.push(encode_function_call(BATCH_SWAP_SIGNATURE, args)?);
    Ok(calls)
}

fn encode_approve_vault(token: Address, amount: U256) -> Result<Vec<u8>, CompileError> {
    let args = (token, amount).abi_encode_params();
    encode_function_call(APPROVE_VAULT_SIGNATURE, args)
}

/// Pool tokens in the vault's canonical (ascending address) order.
fn sort_pool_tokens(tokens: &[Address]) -> Vec<Address> {
    let mut sorted = tokens.to_vec();
    sorted.sort();
    sorted
}

fn single_swap(action: &Action) -> Result<&super::model::SwapStep, CompileError> {
    match action.swaps.as_slice() {
        [swap] => Ok(swap),
        _ => Err(CompileError::internal(
            "join/exit action must hold exactly one swap",
        )),
    }
}

fn pool_for(context: &RouteContext, pool_id: B256) -> Result<&PoolMeta, CompileError> {
    context.pools.get(&pool_id).ok_or_else(|| {
        CompileError::unknown_pool(format!("pool {} is not in the supplied pool set", pool_id))
    })
}

fn asset_at(context: &RouteContext, index: usize) -> Result<Address, CompileError> {
    context
        .assets
        .get(index)
        .copied()
        .ok_or_else(|| CompileError::internal(format!("asset index {} out of bounds", index)))
}

fn token_index(
    sorted_tokens: &[Address],
    token: Address,
    pool_id: B256,
    side: &str,
) -> Result<usize, CompileError> {
    sorted_tokens
        .iter()
        .position(|candidate| *candidate == token)
        .ok_or_else(|| {
            CompileError::invalid(format!(
                "pool {} does not contain the {} token {}",
                pool_id, side, token
            ))
        })
}

fn output_ref_tuples(action: &Action) -> Vec<(U256, U256)> {
    action
        .output_refs
        .iter()
        .map(|reference| (reference.index, reference.key))
        .collect()
}

fn encode_function_call(signature: &str, encoded_args: Vec<u8>) -> Result<Vec<u8>, CompileError> {
    let selector = function_selector(signature)?;
    let mut call_data = Vec::with_capacity(4 + encoded_args.len());
    call_data.extend_from_slice(&selector);
    call_data.extend(encoded_args);
    Ok(call_data)
}

fn function_selector(signature: &str) -> Result<[u8; 4], CompileError> {
    let normalized = signature.trim();
    if !normalized.contains('(') {
        return Err(CompileError::encoding(format!(
            "Invalid function signature: {}",
            signature
        )));
    }
    let mut hasher = Keccak256::new();
    hasher.update(normalized.as_bytes());
    let hash = hasher.finalize();
    Ok([hash[0], hash[1], hash[2], hash[3]])
}
