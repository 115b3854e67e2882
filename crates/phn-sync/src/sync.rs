use std::time::Duration;

use phn_chain::Chain;
use phn_consensus::Checkpointer;
use phn_core::block::Block;
use phn_core::error::PhnError;
use phn_core::types::{Amount, Timestamp};
use phn_store::Store;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::client;
use crate::config::SyncConfig;
use crate::health::PeerHealthMap;

/// Peer synchronization engine (spec.md §4.8, C8). Owns the peer set, their
/// health, and the HTTP client used to reach them. Does not own the chain —
/// callers hold the chain mutex described in spec.md §5 for the duration of
/// `sync_with`/`sync_best`.
pub struct PeerSync {
    peers: Vec<String>,
    health: PeerHealthMap,
    http: Client,
    config: SyncConfig,
    sync_failures: u32,
    last_recovery_probe_at: Option<Timestamp>,
}

impl PeerSync {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            peers: config.initial_peers.clone(),
            health: PeerHealthMap::new(),
            http: Client::new(),
            config,
            sync_failures: 0,
            last_recovery_probe_at: None,
        }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn add_peer(&mut self, url: String) {
        if !self.peers.contains(&url) {
            self.peers.push(url);
        }
    }

    pub fn health(&self) -> &PeerHealthMap {
        &self.health
    }

    pub fn sync_failures(&self) -> u32 {
        self.sync_failures
    }

    /// `sync_with(peer)` (spec.md §4.8): adopt the peer's chain if it is
    /// strictly longer and passes verification, checkpoint, and reorg-depth
    /// checks. Returns `Ok(true)` iff the local chain was replaced.
    pub async fn sync_with(
        &mut self,
        peer: &str,
        chain: &mut Chain,
        store: &Store,
        checkpointer: &mut Checkpointer,
        now: Timestamp,
        starting_reward: Amount,
    ) -> Result<bool, PhnError> {
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let candidate = match client::fetch_chain(&self.http, peer, timeout).await {
            Ok(c) => c,
            Err(e) => {
                self.health.mark_failure(peer, now);
                return Err(e);
            }
        };
        self.health.mark_success(peer, now);

        if candidate.len() <= chain.len() {
            return Ok(false);
        }

        if let Err(e) = checkpointer.verify_candidate(&candidate) {
            warn!(peer, "candidate chain disagrees with a pinned checkpoint");
            self.health.mark_failure(peer, now);
            return Err(e);
        }

        let common_ancestor = chain.common_ancestor_height(&candidate);
        if let Err(e) = checkpointer.check_reorg_depth(chain.len() as u64, common_ancestor) {
            warn!(peer, "candidate chain would reorganize too deep");
            self.health.mark_failure(peer, now);
            return Err(e);
        }

        if let Err(e) = Chain::verify_candidate(&candidate, store, starting_reward) {
            warn!(peer, error = %e, "candidate chain failed verification");
            self.health.mark_failure(peer, now);
            return Err(PhnError::PeerReturnedInvalid(e.to_string()));
        }

        chain.replace(candidate, store)?;
        info!(peer, height = chain.len(), "adopted longer peer chain");
        Ok(true)
    }

    /// `sync_best()` (spec.md §4.8): try each healthy peer once, stop at the
    /// first adoption.
    pub async fn sync_best(
        &mut self,
        chain: &mut Chain,
        store: &Store,
        checkpointer: &mut Checkpointer,
        now: Timestamp,
        starting_reward: Amount,
    ) -> bool {
        let candidates: Vec<String> =
            self.health.healthy_peers(&self.peers).into_iter().map(str::to_string).collect();

        for peer in candidates {
            match self.sync_with(&peer, chain, store, checkpointer, now, starting_reward).await {
                Ok(true) => {
                    self.sync_failures = 0;
                    return true;
                }
                Ok(false) | Err(_) => continue,
            }
        }
        self.sync_failures += 1;
        false
    }

    /// `broadcast_block(block)` (spec.md §4.8): fan out to every currently
    /// healthy peer concurrently, each with its own timeout.
    pub async fn broadcast_block(&mut self, block: &Block, now: Timestamp) {
        let timeout = Duration::from_secs(self.config.broadcast_timeout_secs);
        let healthy: Vec<String> =
            self.health.healthy_peers(&self.peers).into_iter().map(str::to_string).collect();

        let sends = healthy.iter().map(|peer| {
            let http = self.http.clone();
            let peer = peer.clone();
            let block = block.clone();
            async move {
                let result = client::submit_block(&http, &peer, &block, timeout).await;
                (peer, result)
            }
        });
        let results = futures::future::join_all(sends).await;

        for (peer, result) in results {
            match result {
                Ok(()) => self.health.mark_success(&peer, now),
                Err(e) => {
                    warn!(peer = %peer, error = %e, "block broadcast failed");
                    self.health.mark_failure(&peer, now);
                }
            }
        }
    }

    /// Recovery probing (SPEC_FULL.md §11 `try_recover_peers`): failed peers
    /// are periodically re-probed with a lightweight `GET /mining_info`.
    pub async fn try_recover_peers(&mut self, now: Timestamp) {
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let failed: Vec<String> = self.health.failed_peers(&self.peers).into_iter().map(str::to_string).collect();

        for peer in failed {
            if client::probe(&self.http, &peer, timeout).await.is_ok() {
                info!(peer = %peer, "failed peer recovered");
                self.health.mark_success(&peer, now);
            }
        }
    }

    /// One iteration of `periodic(interval)` (spec.md §4.8): a `sync_best`
    /// pass, an occasional recovery probe, and a logged (not propagated)
    /// partition warning once `sync_failures` crosses the threshold.
    pub async fn periodic_tick(
        &mut self,
        chain: &mut Chain,
        store: &Store,
        checkpointer: &mut Checkpointer,
        now: Timestamp,
        starting_reward: Amount,
    ) -> bool {
        let adopted = self.sync_best(chain, store, checkpointer, now, starting_reward).await;

        let probe_due = self
            .last_recovery_probe_at
            .map(|last| now - last >= self.config.recovery_probe_interval_secs as i64)
            .unwrap_or(true);
        if probe_due {
            self.try_recover_peers(now).await;
            self.last_recovery_probe_at = Some(now);
        }

        if self.sync_failures >= self.config.max_sync_failures {
            error!(
                cycles = self.sync_failures,
                "no peer chain adopted in {} cycles — possible network partition", self.sync_failures
            );
        }

        adopted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_peer_sync_starts_with_configured_peers() {
        let config = SyncConfig { initial_peers: vec!["http://a".to_string()], ..SyncConfig::default() };
        let sync = PeerSync::new(config);
        assert_eq!(sync.peers(), &["http://a".to_string()]);
        assert_eq!(sync.sync_failures(), 0);
    }

    #[test]
    fn add_peer_is_idempotent() {
        let mut sync = PeerSync::new(SyncConfig::default());
        sync.add_peer("http://a".to_string());
        sync.add_peer("http://a".to_string());
        assert_eq!(sync.peers().len(), 1);
    }
}
