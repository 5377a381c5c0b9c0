use serde::{Deserialize, Serialize};

/// One leg of the route as supplied by the upstream optimizer. Asset indices
/// point into [`RouteCompileRequest::assets`].
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HopDraft {
    pub pool_id: String,
    pub asset_in_index: usize,
    pub asset_out_index: usize,
    /// Decimal amount. Exact on externally funded legs; `"0"` on legs whose
    /// amount is produced inside the same batch by the previous leg.
    pub amount: String,
}

/// Pool metadata from the registry collaborator: pool id plus the token list
/// in the pool's registered (unsorted) order.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PoolDraft {
    pub id: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RouteCompileRequest {
    pub token_in: String,
    pub token_out: String,
    /// Overall input amount for the route, decimal string.
    pub swap_amount: String,
    /// Externally computed minimum acceptable output for the route.
    pub return_amount: String,
    /// Every token address the hops index into.
    pub assets: Vec<String>,
    pub hops: Vec<HopDraft>,
    pub pools: Vec<PoolDraft>,
    pub user_address: String,
    pub relayer_address: String,
    /// Pre-signed relayer approval calldata, 0x-hex. When present a
    /// `setRelayerApproval` call is prepended to the multicall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorisation: Option<String>,
    /// Unix-seconds deadline for batch swaps. Defaults to one hour from now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// The sole compiler output: the relayer contract to call and the multicall
/// payload to send it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRoute {
    pub to: String,
    pub data: String,
}
