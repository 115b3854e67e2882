use std::collections::HashMap;

use phn_core::constants::{MEMPOOL_CAPACITY, MEMPOOL_MAX_AGE_SECS};
use phn_core::error::PhnError;
use phn_core::transaction::Transaction;
use phn_core::types::Timestamp;
use tracing::{debug, warn};

/// Snapshot counters for `mining_info`/diagnostics (spec.md §4.5 `stats()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MempoolStats {
    pub size: usize,
    pub capacity: usize,
    pub oldest_timestamp: Option<Timestamp>,
    pub total_fees_micro: u64,
}

/// Fee-priority transaction pool (spec.md §4.5). Not internally
/// synchronized — callers serialize access behind the mempool mutex
/// described in spec.md §5 (see `phn_node`'s wiring).
pub struct Mempool {
    entries: HashMap<String, Transaction>,
    capacity: usize,
    max_age_secs: i64,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new(MEMPOOL_CAPACITY, MEMPOOL_MAX_AGE_SECS)
    }
}

impl Mempool {
    pub fn new(capacity: usize, max_age_secs: i64) -> Self {
        Self { entries: HashMap::new(), capacity, max_age_secs }
    }

    /// Transaction-level priority key: higher fee first, then earlier
    /// timestamp, then txid as a final deterministic tiebreak.
    fn priority_key(tx: &Transaction) -> (std::cmp::Reverse<u64>, i64, &str) {
        (std::cmp::Reverse(tx.fee.micro()), tx.timestamp, tx.txid.as_str())
    }

    /// `admit` (spec.md §4.5). Callers are expected to have already run the
    /// transaction through `phn_chain::validate_transaction` — this re-checks
    /// only the mempool-local invariants (schema presence, age, dedup,
    /// capacity/eviction).
    pub fn admit(&mut self, tx: Transaction, now: Timestamp) -> Result<(), PhnError> {
        if tx.sender.is_empty() || tx.recipient.is_empty() || tx.txid.is_empty() {
            return Err(PhnError::MissingField("sender/recipient/txid"));
        }
        if now - tx.timestamp > self.max_age_secs {
            return Err(PhnError::TimestampTooOld);
        }
        if self.entries.contains_key(&tx.txid) {
            return Err(PhnError::DuplicateInMempool(tx.txid.clone()));
        }

        if self.entries.len() >= self.capacity {
            let evictee = self
                .entries
                .values()
                .max_by(|a, b| Self::priority_key(a).cmp(&Self::priority_key(b)))
                .map(|e| e.txid.clone());

            match evictee {
                Some(txid) if self.entries[&txid].fee < tx.fee => {
                    debug!(evicted = %txid, incoming = %tx.txid, "mempool full, evicting lower-fee entry");
                    self.entries.remove(&txid);
                }
                _ => {
                    warn!(txid = %tx.txid, "mempool full and no lower-fee entry to evict");
                    return Err(PhnError::MempoolFull);
                }
            }
        }

        self.entries.insert(tx.txid.clone(), tx);
        Ok(())
    }

    /// Drop entries older than `max_age_secs`. Returns the purged txids.
    pub fn purge_expired(&mut self, now: Timestamp) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|tx| now - tx.timestamp > self.max_age_secs)
            .map(|tx| tx.txid.clone())
            .collect();
        for txid in &expired {
            self.entries.remove(txid);
        }
        expired
    }

    /// `select_for_mining(limit)` (spec.md §4.5): strictly descending fee
    /// order, ties broken by earliest timestamp, expired entries purged first.
    pub fn select_for_mining(&mut self, limit: usize, now: Timestamp) -> Vec<Transaction> {
        self.purge_expired(now);
        let mut candidates: Vec<&Transaction> = self.entries.values().collect();
        candidates.sort_by(|a, b| Self::priority_key(a).cmp(&Self::priority_key(b)));
        candidates.into_iter().take(limit).cloned().collect()
    }

    /// Snapshot ordered by fee descending (spec.md §4.9 `get_pending`).
    pub fn snapshot(&self) -> Vec<Transaction> {
        let mut all: Vec<&Transaction> = self.entries.values().collect();
        all.sort_by(|a, b| Self::priority_key(a).cmp(&Self::priority_key(b)));
        all.into_iter().cloned().collect()
    }

    /// `remove(txids)` (spec.md §4.5): bulk removal on block acceptance.
    pub fn remove(&mut self, txids: &[String]) {
        for txid in txids {
            self.entries.remove(txid);
        }
    }

    pub fn contains(&self, txid: &str) -> bool {
        self.entries.contains_key(txid)
    }

    pub fn get(&self, txid: &str) -> Option<&Transaction> {
        self.entries.get(txid)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            size: self.entries.len(),
            capacity: self.capacity,
            oldest_timestamp: self.entries.values().map(|tx| tx.timestamp).min(),
            total_fees_micro: self.entries.values().map(|tx| tx.fee.micro()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phn_core::types::Amount;

    fn tx(txid: &str, fee: u64, timestamp: i64) -> Transaction {
        Transaction {
            sender: "0".repeat(128),
            recipient: "PHN".to_string() + &"a".repeat(40),
            amount: Amount::from_micro(1_000_000),
            fee: Amount::from_micro(fee),
            timestamp,
            nonce: 1,
            txid: txid.to_string(),
            signature: "sig".to_string(),
        }
    }

    #[test]
    fn admits_well_formed_transaction() {
        let mut pool = Mempool::new(10, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn rejects_duplicate_txid() {
        let mut pool = Mempool::new(10, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        let err = pool.admit(tx(&"a".repeat(64), 2000, 100), 100).unwrap_err();
        assert_eq!(err, PhnError::DuplicateInMempool("a".repeat(64)));
    }

    #[test]
    fn rejects_stale_transaction() {
        let mut pool = Mempool::new(10, 100);
        let err = pool.admit(tx(&"a".repeat(64), 1000, 0), 1000).unwrap_err();
        assert_eq!(err, PhnError::TimestampTooOld);
    }

    #[test]
    fn evicts_lowest_fee_when_full_and_incoming_fee_is_higher() {
        let mut pool = Mempool::new(1, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        pool.admit(tx(&"b".repeat(64), 5000, 100), 100).unwrap();
        assert_eq!(pool.size(), 1);
        assert!(pool.contains(&"b".repeat(64)));
        assert!(!pool.contains(&"a".repeat(64)));
    }

    #[test]
    fn rejects_when_full_and_incoming_fee_not_higher() {
        let mut pool = Mempool::new(1, 3600);
        pool.admit(tx(&"a".repeat(64), 5000, 100), 100).unwrap();
        let err = pool.admit(tx(&"b".repeat(64), 1000, 100), 100).unwrap_err();
        assert_eq!(err, PhnError::MempoolFull);
    }

    #[test]
    fn select_for_mining_orders_by_fee_desc_then_timestamp_asc() {
        let mut pool = Mempool::new(10, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        pool.admit(tx(&"b".repeat(64), 5000, 200), 200).unwrap();
        pool.admit(tx(&"c".repeat(64), 5000, 50), 200).unwrap();
        let selected = pool.select_for_mining(10, 200);
        assert_eq!(selected[0].txid, "c".repeat(64));
        assert_eq!(selected[1].txid, "b".repeat(64));
        assert_eq!(selected[2].txid, "a".repeat(64));
    }

    #[test]
    fn select_for_mining_purges_expired_entries_first() {
        let mut pool = Mempool::new(10, 100);
        pool.admit(tx(&"a".repeat(64), 1000, 0), 0).unwrap();
        let selected = pool.select_for_mining(10, 1000);
        assert!(selected.is_empty());
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn remove_purges_mined_transactions() {
        let mut pool = Mempool::new(10, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        pool.remove(&["a".repeat(64)]);
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn stats_reports_size_and_fee_sum() {
        let mut pool = Mempool::new(10, 3600);
        pool.admit(tx(&"a".repeat(64), 1000, 100), 100).unwrap();
        pool.admit(tx(&"b".repeat(64), 2000, 100), 100).unwrap();
        let stats = pool.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.total_fees_micro, 3000);
        assert_eq!(stats.oldest_timestamp, Some(100));
    }
}
