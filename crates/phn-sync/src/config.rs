use phn_core::constants::{
    MAX_SYNC_FAILURES, PEER_BROADCAST_TIMEOUT_SECS, PEER_RECOVERY_PROBE_SECS, PEER_REQUEST_TIMEOUT_SECS,
};

/// Configuration for the peer synchronization engine (spec.md §4.8/§5).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub initial_peers: Vec<String>,
    pub request_timeout_secs: u64,
    pub broadcast_timeout_secs: u64,
    pub recovery_probe_interval_secs: u64,
    pub max_sync_failures: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_peers: Vec::new(),
            request_timeout_secs: PEER_REQUEST_TIMEOUT_SECS,
            broadcast_timeout_secs: PEER_BROADCAST_TIMEOUT_SECS,
            recovery_probe_interval_secs: PEER_RECOVERY_PROBE_SECS,
            max_sync_failures: MAX_SYNC_FAILURES,
        }
    }
}
