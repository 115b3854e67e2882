//! Request/response bodies for the HTTP transport (spec.md §6). Field names
//! are bit-exact with the original wire contract — renaming any of these is
//! a client-compatibility break, not a refactor.

use phn_core::block::Block;
use phn_core::transaction::Transaction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SendTxRequest {
    pub tx: Transaction,
}

#[derive(Debug, Serialize)]
pub struct SendTxResponse {
    pub status: &'static str,
    pub txid: String,
    pub mempool_position: usize,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBlockRequest {
    pub block: Block,
}

#[derive(Debug, Serialize)]
pub struct SubmitBlockResponse {
    pub status: &'static str,
    pub index: u64,
    pub current_difficulty: u8,
}

#[derive(Debug, Serialize)]
pub struct GetPendingResponse {
    pub pending_transactions: Vec<Transaction>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct GetBlockchainResponse {
    pub blockchain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Deserialize)]
pub struct GetBalanceRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct GetBalanceResponse {
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Deserialize)]
pub struct GetTransactionRequest {
    pub txid: String,
}

#[derive(Debug, Serialize)]
pub struct GetTransactionResponse {
    pub tx: Transaction,
    pub block_index: Option<u64>,
    pub confirmations: u64,
}

#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPeerRequest {
    pub peer: String,
}

#[derive(Debug, Serialize)]
pub struct MiningInfoResponse {
    pub difficulty: u8,
    pub block_reward: String,
    pub min_fee: String,
    pub height: u64,
    pub mempool_size: usize,
    pub owner_address: String,
    pub target_block_seconds: i64,
    pub average_block_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TokenInfoResponse {
    pub name: String,
    pub total_supply: String,
    pub company_holdings: String,
    pub circulating_supply: String,
    pub supply_left: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
