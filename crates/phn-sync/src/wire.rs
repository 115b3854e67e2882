use phn_core::block::Block;
use serde::{Deserialize, Serialize};

/// Body of a peer's `/get_blockchain` response (spec.md §6), as seen from
/// the sync client's side of the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub blockchain: Vec<Block>,
    pub length: usize,
}

/// Body this node POSTs to a peer's `/submit_block`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSubmission {
    pub block: Block,
}
