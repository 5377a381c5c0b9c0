use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};

use relayer_route_encoder::compiler::actions::build_actions;
use relayer_route_encoder::compiler::calldata::encode_actions;
use relayer_route_encoder::compiler::chained_ref::{
    chained_reference, is_chained_reference, output_reference,
};
use relayer_route_encoder::compiler::classify::pool_address;
use relayer_route_encoder::compiler::model::{Action, ActionKind, PoolMeta, RouteContext, SwapStep};
use relayer_route_encoder::compiler::schedule::order_actions;
use relayer_route_encoder::{
    compile_route, CompileErrorKind, HopDraft, PoolDraft, RouteCompileRequest,
};

fn addr(tag: u8) -> Address {
    Address::with_last_byte(tag)
}

fn addr_hex(tag: u8) -> String {
    format!("{:#x}", addr(tag))
}

fn pool_id_for(tag: u8) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..20].copy_from_slice(&[tag; 20]);
    B256::from(bytes)
}

fn pool_id_hex(tag: u8) -> String {
    format!("{:#x}", pool_id_for(tag))
}

fn step(pool_id: B256, asset_in: usize, asset_out: usize, amount: U256) -> SwapStep {
    SwapStep {
        pool_id,
        asset_in_index: asset_in,
        asset_out_index: asset_out,
        amount,
        user_data: Vec::new(),
    }
}

fn context(assets: Vec<Address>, pools: Vec<PoolMeta>) -> RouteContext {
    let share_tokens: HashSet<Address> = pools.iter().map(|p| pool_address(p.id)).collect();
    let pools: HashMap<B256, PoolMeta> = pools.into_iter().map(|p| (p.id, p)).collect();
    RouteContext {
        token_in: assets[0],
        token_out: *assets.last().unwrap(),
        assets,
        swap_amount: U256::from(100u64),
        return_amount: U256::from(90u64),
        user: addr(0xEE),
        relayer: addr(0xFF),
        deadline: U256::from(1_700_000_000u64),
        pools,
        share_tokens,
    }
}

fn two_swap_request() -> RouteCompileRequest {
    RouteCompileRequest {
        token_in: addr_hex(1),
        token_out: addr_hex(2),
        swap_amount: "100".to_string(),
        return_amount: "90".to_string(),
        assets: vec![addr_hex(1), addr_hex(3), addr_hex(2)],
        hops: vec![
            HopDraft {
                pool_id: pool_id_hex(0xAA),
                asset_in_index: 0,
                asset_out_index: 1,
                amount: "100".to_string(),
            },
            HopDraft {
                pool_id: pool_id_hex(0xBB),
                asset_in_index: 1,
                asset_out_index: 2,
                amount: "0".to_string(),
            },
        ],
        pools: vec![
            PoolDraft {
                id: pool_id_hex(0xAA),
                tokens: vec![addr_hex(1), addr_hex(3)],
            },
            PoolDraft {
                id: pool_id_hex(0xBB),
                tokens: vec![addr_hex(3), addr_hex(2)],
            },
        ],
        user_address: addr_hex(0xEE),
        relayer_address: addr_hex(0xFF),
        authorisation: None,
        deadline: Some(1_700_000_000),
        request_id: Some("it-compile".to_string()),
    }
}

fn hop_multiset(actions: &[Action]) -> Vec<(B256, usize, usize, U256)> {
    let mut hops: Vec<_> = actions
        .iter()
        .flat_map(|action| action.swaps.iter())
        .map(|swap| (swap.pool_id, swap.asset_in_index, swap.asset_out_index, swap.amount))
        .collect();
    hops.sort();
    hops
}

#[test]
fn two_swap_route_compiles_to_single_batch_call() {
    let request = two_swap_request();
    let compiled = compile_route(&request).unwrap();
    assert_eq!(compiled.to, addr_hex(0xFF));
    // multicall selector
    assert!(compiled.data.starts_with("0xac9650d8"));

    // Stage-level: both swaps collapse into one batch action and one call.
    let ctx = context(
        vec![addr(1), addr(3), addr(2)],
        vec![
            PoolMeta { id: pool_id_for(0xAA), tokens: vec![addr(1), addr(3)] },
            PoolMeta { id: pool_id_for(0xBB), tokens: vec![addr(3), addr(2)] },
        ],
    );
    let hops = [
        step(pool_id_for(0xAA), 0, 1, U256::from(100u64)),
        step(pool_id_for(0xBB), 1, 2, U256::ZERO),
    ];
    let actions = build_actions(&ctx, &hops).unwrap();
    // Leg 1 literal, leg 2 reads leg 1's output key.
    assert_eq!(actions[0].swaps[0].amount, U256::from(100u64));
    assert_eq!(actions[1].swaps[0].amount, actions[0].output_refs[0].key);
    assert_eq!(actions[1].min_out, U256::from(90u64));

    let ordered = order_actions(actions, 0, 2);
    assert_eq!(ordered.len(), 1);
    assert_eq!(ordered[0].kind, ActionKind::BatchSwap);
    assert_eq!(ordered[0].swaps.len(), 2);

    let calls = encode_actions(&ctx, &ordered).unwrap();
    assert_eq!(calls.len(), 1);
}

#[test]
fn pure_swap_route_of_any_length_stays_one_batch() {
    let assets = vec![addr(1), addr(4), addr(5), addr(2)];
    let pools = vec![
        PoolMeta { id: pool_id_for(0xA1), tokens: vec![addr(1), addr(4)] },
        PoolMeta { id: pool_id_for(0xA2), tokens: vec![addr(4), addr(5)] },
        PoolMeta { id: pool_id_for(0xA3), tokens: vec![addr(5), addr(2)] },
    ];
    let ctx = context(assets, pools);
    let hops = [
        step(pool_id_for(0xA1), 0, 1, U256::from(100u64)),
        step(pool_id_for(0xA2), 1, 2, U256::ZERO),
        step(pool_id_for(0xA3), 2, 3, U256::ZERO),
    ];

    let actions = build_actions(&ctx, &hops).unwrap();
    let ordered = order_actions(actions, 0, 3);
    assert_eq!(ordered.len(), 1);
    assert_eq!(ordered[0].kind, ActionKind::BatchSwap);
    assert_eq!(encode_actions(&ctx, &ordered).unwrap().len(), 1);
}

#[test]
fn single_hop_route_allocates_no_reference_and_exits_externally() {
    let ctx = context(
        vec![addr(1), addr(2)],
        vec![PoolMeta { id: pool_id_for(0xAA), tokens: vec![addr(1), addr(2)] }],
    );
    let hops = [step(pool_id_for(0xAA), 0, 1, U256::from(100u64))];

    let actions = build_actions(&ctx, &hops).unwrap();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].output_refs.is_empty());
    assert!(!is_chained_reference(actions[0].swaps[0].amount));
    assert_eq!(actions[0].min_out, U256::from(90u64));

    let ordered = order_actions(actions, 0, 1);
    let calls = encode_actions(&ctx, &ordered).unwrap();
    assert_eq!(calls.len(), 1);
}

#[test]
fn join_then_swap_emits_deposit_call_before_batch() {
    // X joins pool A for its share token S, then S swaps to Y through pool B.
    let share = Address::from([0xAA; 20]);
    let assets = vec![addr(1), share, addr(2)];
    let pools = vec![
        PoolMeta { id: pool_id_for(0xAA), tokens: vec![addr(1), addr(9)] },
        PoolMeta { id: pool_id_for(0xBB), tokens: vec![share, addr(2)] },
    ];
    let ctx = context(assets, pools);
    let hops = [
        step(pool_id_for(0xAA), 0, 1, U256::from(100u64)),
        step(pool_id_for(0xBB), 1, 2, U256::ZERO),
    ];

    let actions = build_actions(&ctx, &hops).unwrap();
    assert_eq!(actions[0].kind, ActionKind::Join);
    // The swap reads the key the join wrote.
    assert_eq!(actions[1].swaps[0].amount, actions[0].output_refs[0].key);

    let ordered = order_actions(actions, 0, 2);
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered[0].kind, ActionKind::Join);
    assert_eq!(ordered[1].kind, ActionKind::BatchSwap);

    // Share-token-funded batch carries its ancillary vault approval.
    let calls = encode_actions(&ctx, &ordered).unwrap();
    assert_eq!(calls.len(), 3);
}

#[test]
fn scheduling_never_drops_or_duplicates_hops() {
    let share = Address::from([0xCC; 20]);
    let assets = vec![addr(1), addr(4), share, addr(2)];
    let pools = vec![
        PoolMeta { id: pool_id_for(0xA1), tokens: vec![addr(1), addr(4)] },
        PoolMeta { id: pool_id_for(0xCC), tokens: vec![addr(4), addr(9)] },
        PoolMeta { id: pool_id_for(0xA2), tokens: vec![share, addr(2)] },
    ];
    let ctx = context(assets, pools);
    let hops = [
        step(pool_id_for(0xA1), 0, 1, U256::from(100u64)),
        step(pool_id_for(0xCC), 1, 2, U256::ZERO),
        step(pool_id_for(0xA2), 2, 3, U256::ZERO),
    ];

    let actions = build_actions(&ctx, &hops).unwrap();
    let before = hop_multiset(&actions);
    let ordered = order_actions(actions, 0, 3);
    assert_eq!(hop_multiset(&ordered), before);
}

fn assert_writes_precede_reads(actions: &[Action]) {
    let mut written: Vec<U256> = Vec::new();
    for action in actions {
        for swap in &action.swaps {
            if is_chained_reference(swap.amount) {
                assert!(written.contains(&swap.amount), "dangling read of {}", swap.amount);
            }
        }
        written.extend(action.output_refs.iter().map(|r| r.key));
    }
}

#[test]
fn every_reference_read_follows_its_write_in_action_order() {
    let share = Address::from([0xCC; 20]);
    let assets = vec![addr(1), addr(4), share, addr(2)];
    let pools = vec![
        PoolMeta { id: pool_id_for(0xA1), tokens: vec![addr(1), addr(4)] },
        PoolMeta { id: pool_id_for(0xCC), tokens: vec![addr(4), addr(9)] },
        PoolMeta { id: pool_id_for(0xA2), tokens: vec![share, addr(2)] },
    ];
    let ctx = context(assets, pools);
    let hops = [
        step(pool_id_for(0xA1), 0, 1, U256::from(100u64)),
        step(pool_id_for(0xCC), 1, 2, U256::ZERO),
        step(pool_id_for(0xA2), 2, 3, U256::ZERO),
    ];

    let actions = build_actions(&ctx, &hops).unwrap();
    assert_writes_precede_reads(&actions);

    let ordered = order_actions(actions, 0, 3);
    assert_writes_precede_reads(&ordered);
}

#[test]
fn scheduling_restores_write_before_read_for_moved_anchors() {
    // Adversarial input order: the exit producing the route output comes
    // first, the join funding the route comes last. The scheduler must land
    // the join before the swap that reads its key, and the exit after the
    // swap that writes the key it reads.
    let deferred_from_join = chained_reference(U256::ZERO, true);
    let deferred_from_swap = chained_reference(U256::from(1u64), true);
    let exit = Action {
        kind: ActionKind::Exit,
        swaps: vec![step(pool_id_for(0xCC), 2, 3, deferred_from_swap)],
        output_refs: Vec::new(),
        min_out: U256::from(90u64),
    };
    let middle_swap = Action {
        kind: ActionKind::Swap,
        swaps: vec![step(pool_id_for(0xBB), 1, 2, deferred_from_join)],
        output_refs: vec![output_reference(1, 2)],
        min_out: U256::ZERO,
    };
    let enter_join = Action {
        kind: ActionKind::Join,
        swaps: vec![step(pool_id_for(0xAA), 0, 1, U256::from(100u64))],
        output_refs: vec![output_reference(0, 1)],
        min_out: U256::ZERO,
    };

    let ordered = order_actions(vec![exit, middle_swap, enter_join], 0, 3);
    let kinds: Vec<ActionKind> = ordered.iter().map(|action| action.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Join, ActionKind::BatchSwap, ActionKind::Exit]);
    assert_writes_precede_reads(&ordered);
}

#[test]
fn authorisation_prepends_an_approval_call() {
    let without = compile_route(&two_swap_request()).unwrap();

    let mut request = two_swap_request();
    request.authorisation = Some("0xdeadbeef".to_string());
    let with = compile_route(&request).unwrap();

    assert_eq!(with.to, without.to);
    assert!(with.data.len() > without.data.len());
}

#[test]
fn unknown_pool_fails_the_whole_compile() {
    let mut request = two_swap_request();
    request.pools.pop();
    let err = compile_route(&request).unwrap_err();
    assert_eq!(err.kind(), CompileErrorKind::UnknownPool);
}

#[test]
fn empty_route_fails_the_whole_compile() {
    let mut request = two_swap_request();
    request.hops.clear();
    let err = compile_route(&request).unwrap_err();
    assert_eq!(err.kind(), CompileErrorKind::EmptyRoute);
}

#[test]
fn share_token_on_both_hop_sides_is_rejected() {
    let share_hex = format!("{:#x}", Address::from([0xAA; 20]));
    let mut request = two_swap_request();
    request.token_in = share_hex.clone();
    request.token_out = share_hex.clone();
    request.assets = vec![share_hex.clone(), share_hex];
    request.hops = vec![HopDraft {
        pool_id: pool_id_hex(0xAA),
        asset_in_index: 0,
        asset_out_index: 1,
        amount: "100".to_string(),
    }];
    let err = compile_route(&request).unwrap_err();
    assert_eq!(err.kind(), CompileErrorKind::InvalidHopClassification);
}

#[test]
fn request_round_trips_through_camel_case_json() {
    let request = two_swap_request();
    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("tokenIn").is_some());
    assert!(json.get("swapAmount").is_some());
    assert!(json.get("relayerAddress").is_some());
    assert!(json["hops"][0].get("assetInIndex").is_some());

    let parsed: RouteCompileRequest = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.token_in, request.token_in);
    assert_eq!(parsed.hops.len(), request.hops.len());

    let compiled = compile_route(&parsed).unwrap();
    assert_eq!(compiled, compile_route(&request).unwrap());
}
