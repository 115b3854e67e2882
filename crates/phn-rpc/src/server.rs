//! The HTTP/JSON transport for the Node Facade (spec.md §6). Routes are
//! flat, POST-for-writes-and-lookups, matching the original node's wire
//! shape rather than a REST-ified layout.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use phn_core::error::PhnError;
use phn_core::types::Amount;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::facade::NodeHandle;
use crate::rate_limit::{self, RateLimiters};
use crate::wire::*;

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<NodeHandle>,
    pub limiters: Arc<RateLimiters>,
    pub min_fee: Amount,
    pub target_block_seconds: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/send_tx", post(send_tx))
        .route("/submit_block", post(submit_block))
        .route("/get_pending", post(get_pending))
        .route("/get_blockchain", post(get_blockchain))
        .route("/get_balance", post(get_balance))
        .route("/get_transaction", post(get_transaction))
        .route("/peers", post(peers))
        .route("/add_peer", post(add_peer))
        .route("/mining_info", get(mining_info))
        .route("/token_info", get(token_info))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(error: &PhnError) -> StatusCode {
    match error.status_category() {
        "not_found" => StatusCode::NOT_FOUND,
        "internal" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_response(error: PhnError) -> Response {
    let status = status_for(&error);
    (status, Json(ErrorResponse { error: error.to_string() })).into_response()
}

fn rate_limited() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, Json(ErrorResponse { error: "rate limit exceeded".to_string() }))
        .into_response()
}

async fn send_tx(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<SendTxRequest>,
) -> Response {
    if !rate_limit::allow(&state.limiters.send_tx, addr.ip()) {
        return rate_limited();
    }
    match state.node.submit_tx(req.tx).await {
        Ok(outcome) => Json(SendTxResponse {
            status: "success",
            txid: outcome.txid,
            mempool_position: outcome.mempool_position,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn submit_block(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<SubmitBlockRequest>,
) -> Response {
    if !rate_limit::allow(&state.limiters.submit_block, addr.ip()) {
        return rate_limited();
    }
    match state.node.submit_block(req.block).await {
        Ok(outcome) => Json(SubmitBlockResponse {
            status: "accepted",
            index: outcome.index,
            current_difficulty: outcome.applied_difficulty,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "submit_block rejected");
            error_response(e)
        }
    }
}

async fn get_pending(State(state): State<AppState>) -> Response {
    let pending = state.node.get_pending().await;
    Json(GetPendingResponse { count: pending.len(), pending_transactions: pending }).into_response()
}

async fn get_blockchain(State(state): State<AppState>) -> Response {
    let chain = state.node.get_chain().await;
    Json(GetBlockchainResponse { length: chain.len(), blockchain: chain }).into_response()
}

async fn get_balance(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<GetBalanceRequest>,
) -> Response {
    if !rate_limit::allow(&state.limiters.get_balance, addr.ip()) {
        return rate_limited();
    }
    match state.node.get_balance(&req.address).await {
        Ok(balance) => {
            Json(GetBalanceResponse { address: req.address, balance: balance.to_canonical() }).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_transaction(State(state): State<AppState>, Json(req): Json<GetTransactionRequest>) -> Response {
    match state.node.get_tx(&req.txid).await {
        Ok(lookup) => Json(GetTransactionResponse {
            tx: lookup.tx,
            block_index: lookup.block_index,
            confirmations: lookup.confirmations,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn peers(State(state): State<AppState>) -> Response {
    Json(PeersResponse { peers: state.node.list_peers().await }).into_response()
}

async fn add_peer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AddPeerRequest>,
) -> Response {
    if !rate_limit::allow(&state.limiters.default, addr.ip()) {
        return rate_limited();
    }
    match state.node.add_peer(req.peer).await {
        Ok(peers) => Json(PeersResponse { peers }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn mining_info(State(state): State<AppState>) -> Response {
    let info = state.node.mining_info(state.min_fee, state.target_block_seconds).await;
    Json(MiningInfoResponse {
        difficulty: info.difficulty,
        block_reward: info.block_reward.to_canonical(),
        min_fee: info.min_fee.to_canonical(),
        height: info.height,
        mempool_size: info.mempool_size,
        owner_address: info.owner_address.as_str().to_string(),
        target_block_seconds: info.target_block_seconds,
        average_block_seconds: info.block_time_stats.map(|s| s.average_secs),
    })
    .into_response()
}

async fn token_info(State(state): State<AppState>) -> Response {
    let info = state.node.token_info().await;
    Json(TokenInfoResponse {
        name: info.name,
        total_supply: info.total_supply.to_canonical(),
        company_holdings: info.company_holdings.to_canonical(),
        circulating_supply: info.circulating_supply.to_canonical(),
        supply_left: info.supply_left.to_canonical(),
    })
    .into_response()
}
