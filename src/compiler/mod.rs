//! Route-to-calls compiler. Three pure stages over immutable sequences
//! (hops to actions, action scheduling, action encoding) and one outer
//! multicall wrapper. A compile invocation holds no shared state; concurrent
//! compiles on independent routes are safe.

pub mod actions;
pub mod calldata;
pub mod chained_ref;
pub mod classify;
pub mod error;
pub mod model;
pub mod schedule;
pub(crate) mod wire;


use std::collections::{HashMap, HashSet};

use alloy_primitives::U256;
use tracing::{debug, warn};

use crate::models::messages::{CompiledRoute, RouteCompileRequest};
use error::CompileError;
use model::{PoolMeta, RouteContext, SwapStep};

const DEADLINE_WINDOW_SECS: i64 = 3600;

pub fn compile_route(request: &RouteCompileRequest) -> Result<CompiledRoute, CompileError> {
    let (context, hops) = parse_request(request)?;

    if context.return_amount.is_zero() {
        warn!(
            request_id = request.request_id.as_deref().unwrap_or(""),
            "returnAmount is zero; compiled route carries no output guarantee"
        );
    }

    let built = actions::build_actions(&context, &hops)?;
    let token_in_index = asset_index(&context, context.token_in)?;
    let token_out_index = asset_index(&context, context.token_out)?;
    let ordered = schedule::order_actions(built, token_in_index, token_out_index);

    let mut calls = Vec::with_capacity(ordered.len() + 1);
    if let Some(authorisation) = &request.authorisation {
        calls.push(calldata::build_set_relayer_approval(
            context.relayer,
            wire::parse_bytes(authorisation)?,
        )?);
    }
    calls.extend(calldata::encode_actions(&context, &ordered)?);

    debug!(
        request_id = request.request_id.as_deref().unwrap_or(""),
        hops = hops.len(),
        actions = ordered.len(),
        calls = calls.len(),
        "compiled relayer route"
    );

    let data = calldata::encode_multicall(calls)?;
    Ok(CompiledRoute {
        to: wire::format_address(&context.relayer),
        data: wire::format_calldata(&data),
    })
}

fn parse_request(
    request: &RouteCompileRequest,
) -> Result<(RouteContext, Vec<SwapStep>), CompileError> {
    let token_in = wire::parse_address(&request.token_in)?;
    let token_out = wire::parse_address(&request.token_out)?;
    let user = wire::parse_address(&request.user_address)?;
    let relayer = wire::parse_address(&request.relayer_address)?;
    let swap_amount = wire::parse_amount(&request.swap_amount)?;
    let return_amount = wire::parse_amount(&request.return_amount)?;

    let assets = request
        .assets
        .iter()
        .map(|asset| wire::parse_address(asset))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pools = HashMap::with_capacity(request.pools.len());
    let mut share_tokens = HashSet::with_capacity(request.pools.len());
    for pool in &request.pools {
        let id = wire::parse_pool_id(&pool.id)?;
        let tokens = pool
            .tokens
            .iter()
            .map(|token| wire::parse_address(token))
            .collect::<Result<Vec<_>, _>>()?;
        share_tokens.insert(classify::pool_address(id));
        pools.insert(id, PoolMeta { id, tokens });
    }

    let hops = request
        .hops
        .iter()
        .map(|hop| {
            Ok(SwapStep {
                pool_id: wire::parse_pool_id(&hop.pool_id)?,
                asset_in_index: hop.asset_in_index,
                asset_out_index: hop.asset_out_index,
                amount: wire::parse_amount(&hop.amount)?,
                user_data: Vec::new(),
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    let deadline = match request.deadline {
        Some(deadline) => U256::from(deadline),
        None => U256::from(
            (chrono::Utc::now().timestamp() + DEADLINE_WINDOW_SECS).unsigned_abs(),
        ),
    };

    Ok((
        RouteContext {
            token_in,
            token_out,
            assets,
            swap_amount,
            return_amount,
            user,
            relayer,
            deadline,
            pools,
            share_tokens,
        },
        hops,
    ))
}

fn asset_index(
    context: &RouteContext,
    token: alloy_primitives::Address,
) -> Result<usize, CompileError> {
    context
        .assets
        .iter()
        .position(|asset| *asset == token)
        .ok_or_else(|| CompileError::invalid("route boundary token is not in the asset list"))
}
