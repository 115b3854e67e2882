use std::collections::HashMap;

use phn_core::constants::PEER_FAILURE_THRESHOLD;
use phn_core::types::Timestamp;

/// Derived health status of a peer (spec.md §3 "Peer health").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Healthy,
    Degraded,
    Failed,
}

/// Per-peer contact history.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerHealth {
    pub failures: u32,
    pub last_success: Option<Timestamp>,
    pub last_failure: Option<Timestamp>,
}

impl PeerHealth {
    pub fn status(&self) -> PeerStatus {
        if self.failures >= PEER_FAILURE_THRESHOLD {
            PeerStatus::Failed
        } else if self.failures > 0 {
            PeerStatus::Degraded
        } else {
            PeerStatus::Healthy
        }
    }

    fn mark_success(&mut self, now: Timestamp) {
        self.failures = 0;
        self.last_success = Some(now);
    }

    fn mark_failure(&mut self, now: Timestamp) {
        self.failures += 1;
        self.last_failure = Some(now);
    }
}

/// Tracks health for every peer the node has ever contacted.
#[derive(Debug, Default)]
pub struct PeerHealthMap {
    entries: HashMap<String, PeerHealth>,
}

impl PeerHealthMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_success(&mut self, peer: &str, now: Timestamp) {
        self.entries.entry(peer.to_string()).or_default().mark_success(now);
    }

    pub fn mark_failure(&mut self, peer: &str, now: Timestamp) {
        self.entries.entry(peer.to_string()).or_default().mark_failure(now);
    }

    pub fn status(&self, peer: &str) -> PeerStatus {
        self.entries.get(peer).map(PeerHealth::status).unwrap_or(PeerStatus::Healthy)
    }

    pub fn get(&self, peer: &str) -> Option<&PeerHealth> {
        self.entries.get(peer)
    }

    pub fn is_healthy(&self, peer: &str) -> bool {
        self.status(peer) == PeerStatus::Healthy
    }

    pub fn is_failed(&self, peer: &str) -> bool {
        self.status(peer) == PeerStatus::Failed
    }

    pub fn failed_peers<'a>(&self, peers: &'a [String]) -> Vec<&'a str> {
        peers.iter().filter(|p| self.is_failed(p)).map(String::as_str).collect()
    }

    pub fn healthy_peers<'a>(&self, peers: &'a [String]) -> Vec<&'a str> {
        peers.iter().filter(|p| !self.is_failed(p)).map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_healthy_before_any_contact() {
        let map = PeerHealthMap::new();
        assert_eq!(map.status("http://a"), PeerStatus::Healthy);
    }

    #[test]
    fn degrades_after_one_failure_and_fails_after_threshold() {
        let mut map = PeerHealthMap::new();
        map.mark_failure("http://a", 1);
        assert_eq!(map.status("http://a"), PeerStatus::Degraded);
        map.mark_failure("http://a", 2);
        map.mark_failure("http://a", 3);
        assert_eq!(map.status("http://a"), PeerStatus::Failed);
    }

    #[test]
    fn success_resets_failure_count() {
        let mut map = PeerHealthMap::new();
        map.mark_failure("http://a", 1);
        map.mark_failure("http://a", 2);
        map.mark_success("http://a", 3);
        assert_eq!(map.status("http://a"), PeerStatus::Healthy);
    }

    #[test]
    fn failed_peers_are_excluded_from_healthy_list() {
        let mut map = PeerHealthMap::new();
        let peers = vec!["http://a".to_string(), "http://b".to_string()];
        map.mark_failure("http://a", 1);
        map.mark_failure("http://a", 2);
        map.mark_failure("http://a", 3);
        assert_eq!(map.healthy_peers(&peers), vec!["http://b"]);
        assert_eq!(map.failed_peers(&peers), vec!["http://a"]);
    }
}
