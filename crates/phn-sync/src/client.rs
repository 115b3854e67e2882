use std::time::Duration;

use phn_core::block::Block;
use phn_core::error::PhnError;
use reqwest::Client;

use crate::wire::{BlockSubmission, ChainResponse};

fn peer_unreachable(peer: &str, e: impl std::fmt::Display) -> PhnError {
    PhnError::PeerUnreachable(format!("{peer}: {e}"))
}

/// `GET chain()` (spec.md §4.8): fetch a peer's full chain.
pub async fn fetch_chain(client: &Client, peer: &str, timeout: Duration) -> Result<Vec<Block>, PhnError> {
    let url = format!("{}/get_blockchain", peer.trim_end_matches('/'));
    let resp = client
        .post(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| peer_unreachable(peer, e))?;
    if !resp.status().is_success() {
        return Err(PhnError::PeerUnreachable(format!("{peer}: HTTP {}", resp.status())));
    }
    let body: ChainResponse = resp.json().await.map_err(|e| peer_unreachable(peer, e))?;
    Ok(body.blockchain)
}

/// `POST block(block)` (spec.md §4.8): broadcast an accepted block to a peer.
pub async fn submit_block(client: &Client, peer: &str, block: &Block, timeout: Duration) -> Result<(), PhnError> {
    let url = format!("{}/submit_block", peer.trim_end_matches('/'));
    let resp = client
        .post(url)
        .timeout(timeout)
        .json(&BlockSubmission { block: block.clone() })
        .send()
        .await
        .map_err(|e| peer_unreachable(peer, e))?;
    if !resp.status().is_success() {
        return Err(PhnError::PeerUnreachable(format!("{peer}: HTTP {}", resp.status())));
    }
    Ok(())
}

/// Lightweight liveness probe used by recovery (`try_recover_peers`,
/// SPEC_FULL.md §11): a bare `GET /mining_info` with no body.
pub async fn probe(client: &Client, peer: &str, timeout: Duration) -> Result<(), PhnError> {
    let url = format!("{}/mining_info", peer.trim_end_matches('/'));
    let resp = client.get(url).timeout(timeout).send().await.map_err(|e| peer_unreachable(peer, e))?;
    if !resp.status().is_success() {
        return Err(PhnError::PeerUnreachable(format!("{peer}: HTTP {}", resp.status())));
    }
    Ok(())
}
