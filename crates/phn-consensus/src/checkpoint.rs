use std::collections::BTreeMap;

use phn_core::block::Block;
use phn_core::constants::{CHECKPOINT_INTERVAL, MAX_REORG_DEPTH};
use phn_core::error::PhnError;
use tracing::{info, warn};

/// Periodic immutable height→hash pins (spec.md §4.7). Once a height is
/// recorded it is never overwritten for the life of the process.
#[derive(Debug, Default)]
pub struct Checkpointer {
    checkpoints: BTreeMap<u64, String>,
    /// Rejected reorg attempts, kept for diagnostics.
    reorg_audit_log: Vec<String>,
}

impl Checkpointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a checkpoint for `block` if its height is on the interval
    /// boundary and no checkpoint is already pinned at that height.
    pub fn observe_appended_block(&mut self, block: &Block) {
        if block.index % CHECKPOINT_INTERVAL == 0 {
            self.checkpoints.entry(block.index).or_insert_with(|| {
                info!(height = block.index, hash = %block.hash, "checkpoint recorded");
                block.hash.clone()
            });
        }
    }

    pub fn get(&self, height: u64) -> Option<&str> {
        self.checkpoints.get(&height).map(String::as_str)
    }

    pub fn all(&self) -> &BTreeMap<u64, String> {
        &self.checkpoints
    }

    /// Reject `candidate` if it disagrees with any pinned checkpoint below
    /// its own length.
    pub fn verify_candidate(&self, candidate: &[Block]) -> Result<(), PhnError> {
        for (&height, expected_hash) in &self.checkpoints {
            if (height as usize) >= candidate.len() {
                continue;
            }
            if candidate[height as usize].hash != *expected_hash {
                warn!(height, "candidate chain disagrees with pinned checkpoint");
                return Err(PhnError::CheckpointViolation { height });
            }
        }
        Ok(())
    }

    /// Reject a reorganization that would rewrite more than
    /// [`MAX_REORG_DEPTH`] tip blocks of the current chain.
    pub fn check_reorg_depth(&mut self, current_len: u64, common_ancestor_height: u64) -> Result<(), PhnError> {
        let depth = current_len.saturating_sub(common_ancestor_height);
        if depth > MAX_REORG_DEPTH {
            self.reorg_audit_log.push(format!(
                "rejected reorg: current_len={current_len} common_ancestor={common_ancestor_height} depth={depth}"
            ));
            warn!(depth, max = MAX_REORG_DEPTH, "reorg exceeds maximum depth");
            return Err(PhnError::ReorgTooDeep { depth, max: MAX_REORG_DEPTH });
        }
        Ok(())
    }

    pub fn reorg_audit_log(&self) -> &[String] {
        &self.reorg_audit_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phn_core::transaction::Transaction;
    use phn_core::types::Amount;

    fn block(index: u64, hash: &str) -> Block {
        Block {
            index,
            timestamp: index as i64,
            transactions: vec![Transaction {
                sender: "coinbase".to_string(),
                recipient: "PHN".to_string() + &"a".repeat(40),
                amount: Amount::from_micro(1),
                fee: Amount::ZERO,
                timestamp: index as i64,
                nonce: 0,
                txid: "b".repeat(64),
                signature: "genesis".to_string(),
            }],
            prev_hash: "0".repeat(64),
            nonce: 0,
            hash: hash.to_string(),
        }
    }

    #[test]
    fn checkpoint_is_immutable_once_recorded() {
        let mut cp = Checkpointer::new();
        cp.observe_appended_block(&block(100, "hash-a"));
        cp.observe_appended_block(&block(100, "hash-b"));
        assert_eq!(cp.get(100), Some("hash-a"));
    }

    #[test]
    fn non_interval_heights_are_not_recorded() {
        let mut cp = Checkpointer::new();
        cp.observe_appended_block(&block(101, "hash-a"));
        assert_eq!(cp.get(101), None);
    }

    #[test]
    fn candidate_disagreeing_with_checkpoint_is_rejected() {
        let mut cp = Checkpointer::new();
        cp.observe_appended_block(&block(100, "pinned-hash"));
        let mut candidate: Vec<Block> = (0..200).map(|i| block(i, "filler")).collect();
        candidate[100].hash = "different-hash".to_string();
        let err = cp.verify_candidate(&candidate).unwrap_err();
        assert_eq!(err, PhnError::CheckpointViolation { height: 100 });
    }

    #[test]
    fn reorg_within_max_depth_accepted() {
        let mut cp = Checkpointer::new();
        assert!(cp.check_reorg_depth(110, 100).is_ok());
    }

    #[test]
    fn reorg_exceeding_max_depth_rejected() {
        let mut cp = Checkpointer::new();
        let err = cp.check_reorg_depth(111, 100).unwrap_err();
        assert_eq!(err, PhnError::ReorgTooDeep { depth: 11, max: MAX_REORG_DEPTH });
        assert_eq!(cp.reorg_audit_log().len(), 1);
    }
}
