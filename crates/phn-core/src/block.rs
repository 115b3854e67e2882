use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;
use crate::types::{Height, Timestamp};

/// A block in the append-only chain.
///
/// Field names are bit-exact with the wire protocol (SPEC_FULL.md §13): they
/// enter the hash preimage verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub index: Height,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
    pub prev_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// The block's coinbase transaction, if exactly-one invariant already held.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.is_system() && tx.sender == crate::constants::COINBASE_SENDER)
    }

    pub fn coinbase_count(&self) -> usize {
        self.transactions
            .iter()
            .filter(|tx| tx.sender == crate::constants::COINBASE_SENDER)
            .count()
    }

    pub fn miners_pool_payouts(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.sender == crate::constants::MINERS_POOL_SENDER)
    }

    pub fn non_system_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| !tx.is_system())
    }
}
