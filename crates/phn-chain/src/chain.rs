use std::collections::HashSet;

use phn_core::block::Block;
use phn_core::constants::ZERO_HASH;
use phn_core::error::PhnError;
use phn_core::transaction::{Sender, Transaction};
use phn_core::types::{Address, Amount, Timestamp};
use phn_crypto::hash::hash_block;
use phn_crypto::pow::meets_difficulty;
use phn_consensus::checkpoint::Checkpointer;
use phn_consensus::difficulty::difficulty_at;
use phn_store::Store;
use tracing::{info, warn};

use crate::reward::block_reward;
use crate::validation::{sender_address, validate_transaction};

/// The in-memory canonical chain (spec.md §4.4 "Chain"). Owns no storage
/// handle of its own — callers pass a [`Store`] reference at the points the
/// spec actually requires durability (append, full-chain replacement).
#[derive(Clone, Debug, Default)]
pub struct Chain {
    blocks: Vec<Block>,
    txid_index: HashSet<String>,
    /// Confirmed-chain balances, in micro-PHN, keyed by address string.
    /// A derived cache: always recomputable from `blocks` via
    /// [`Chain::recompute_caches`].
    balances: std::collections::HashMap<String, i128>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut chain = Self { blocks, txid_index: HashSet::new(), balances: std::collections::HashMap::new() };
        chain.recompute_caches();
        chain
    }

    fn recompute_caches(&mut self) {
        self.txid_index.clear();
        self.balances.clear();
        for block in &self.blocks {
            for tx in &block.transactions {
                self.txid_index.insert(tx.txid.clone());
                apply_to_balances(&mut self.balances, tx);
            }
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn contains_txid(&self, txid: &str) -> bool {
        self.txid_index.contains(txid)
    }

    /// `difficulty_for_next` — the PoW target a candidate block appended
    /// right now must satisfy (spec.md §4.6).
    pub fn difficulty_for_next(&self) -> u8 {
        difficulty_at(&self.blocks)
    }

    /// `balance_of` (spec.md §4.4): confirmed-chain balance plus whatever
    /// mempool/in-block overlay transactions the caller supplies.
    pub fn balance_of(&self, address: &Address, overlay: &[Transaction]) -> Amount {
        let mut total = *self.balances.get(address.as_str()).unwrap_or(&0);
        let mut overlay_map = std::collections::HashMap::new();
        for tx in overlay {
            apply_to_balances(&mut overlay_map, tx);
        }
        total += *overlay_map.get(address.as_str()).unwrap_or(&0);
        Amount::from_micro(total.max(0) as u64)
    }

    /// POUV (spec.md §4.4) for a single non-system transaction, evaluated
    /// against this chain's confirmed balances plus `overlay` (pending
    /// mempool entries, or already-accepted transactions earlier in the
    /// same candidate block).
    pub fn validate_transaction(
        &self,
        tx: &Transaction,
        now: Timestamp,
        overlay: &[Transaction],
        store: &Store,
    ) -> Result<(), PhnError> {
        let balance = match sender_address(tx) {
            Some(addr) => self.balance_of(&addr, overlay),
            None => Amount::ZERO,
        };
        validate_transaction(tx, now, balance, self.contains_txid(&tx.txid), store)
    }

    /// Block validation (spec.md §4.4). Does not mutate `self`.
    pub fn validate_block(&self, block: &Block, store: &Store, starting_reward: Amount) -> Result<(), PhnError> {
        // Linkage.
        if self.blocks.is_empty() {
            if block.index != 0 {
                return Err(PhnError::WrongIndex { expected: 0, got: block.index });
            }
            if block.prev_hash != ZERO_HASH {
                return Err(PhnError::WrongPrevHash);
            }
        } else {
            let last = self.tip().expect("chain non-empty");
            if block.index != last.index + 1 {
                return Err(PhnError::WrongIndex { expected: last.index + 1, got: block.index });
            }
            if block.prev_hash != last.hash {
                return Err(PhnError::WrongPrevHash);
            }
        }

        // Hash integrity and PoW.
        let computed = hash_block(block)?;
        if computed != block.hash {
            return Err(PhnError::HashMismatch);
        }
        let required = difficulty_at(&self.blocks);
        if !meets_difficulty(&block.hash, required) {
            return Err(PhnError::InsufficientPoW { required });
        }

        // Coinbase.
        let coinbase_txs: Vec<&Transaction> = block
            .transactions
            .iter()
            .filter(|t| matches!(t.sender_kind(), Sender::Coinbase))
            .collect();
        if coinbase_txs.len() != 1 {
            return Err(PhnError::CoinbaseCount(coinbase_txs.len()));
        }
        let coinbase = coinbase_txs[0];
        if !coinbase.has_system_signature() {
            return Err(PhnError::InvalidSignature);
        }
        let expected_reward = block_reward(block.index, starting_reward);
        if coinbase.amount != expected_reward {
            return Err(PhnError::CoinbaseAmountMismatch {
                expected: expected_reward.micro(),
                got: coinbase.amount.micro(),
            });
        }

        // Txid uniqueness within the block.
        let mut seen = HashSet::new();
        for tx in &block.transactions {
            if !seen.insert(tx.txid.as_str()) {
                return Err(PhnError::DuplicateTxId(tx.txid.clone()));
            }
        }

        // Embedded non-system transactions, each validated in sequence so a
        // later transaction in the block sees the balance effect of earlier
        // ones (closes the intra-block double-spend gap the spec is silent
        // on — see DESIGN.md).
        let mut overlay: Vec<Transaction> = Vec::new();
        for tx in block.non_system_transactions() {
            self.validate_transaction(tx, block.timestamp, &overlay, store)
                .map_err(|e| PhnError::EmbeddedTransactionInvalid { txid: tx.txid.clone(), reason: e.to_string() })?;
            overlay.push(tx.clone());
        }

        // Fee conservation.
        let fee_sum: u64 = block.non_system_transactions().map(|t| t.fee.micro()).sum();
        let payouts: Vec<&Transaction> = block.miners_pool_payouts().collect();
        if fee_sum > 0 {
            if payouts.len() != 1 {
                return Err(PhnError::FeePayoutCount { expected: 1, got: payouts.len() });
            }
            let payout = payouts[0];
            if !payout.has_system_signature() {
                return Err(PhnError::InvalidSignature);
            }
            if payout.amount.micro() != fee_sum {
                return Err(PhnError::FeePayoutMismatch { expected: fee_sum, got: payout.amount.micro() });
            }
            if payout.recipient != coinbase.recipient {
                return Err(PhnError::FeePayoutWrongRecipient);
            }
        } else if !payouts.is_empty() {
            return Err(PhnError::FeePayoutCount { expected: 0, got: payouts.len() });
        }

        Ok(())
    }

    /// Append an already-validated block: update caches, persist, and record
    /// a checkpoint if this height lands on the interval. Returns the txids
    /// of non-system transactions included, for mempool purge.
    pub fn append(&mut self, block: Block, store: &Store, checkpointer: &mut Checkpointer) -> Result<Vec<String>, PhnError> {
        let included: Vec<String> = block.non_system_transactions().map(|t| t.txid.clone()).collect();
        for tx in &block.transactions {
            self.txid_index.insert(tx.txid.clone());
            apply_to_balances(&mut self.balances, tx);
        }
        self.blocks.push(block.clone());
        checkpointer.observe_appended_block(&block);
        store.save_chain(&self.blocks)?;
        info!(height = block.index, hash = %block.hash, "block appended");
        Ok(included)
    }

    /// Replace the local chain wholesale (peer sync adoption). Caller is
    /// responsible for validating `candidate` first via
    /// [`Chain::verify_candidate`].
    pub fn replace(&mut self, candidate: Vec<Block>, store: &Store) -> Result<(), PhnError> {
        self.blocks = candidate;
        self.recompute_caches();
        store.save_chain(&self.blocks)?;
        warn!(height = self.blocks.len(), "chain replaced via peer sync");
        Ok(())
    }

    /// Validate an entire candidate chain from scratch (spec.md §4.8
    /// `sync_with`: "passes chain verification (§4.4 append rules applied
    /// sequentially)"). Structural genesis checks only — the owner-address
    /// and total-supply match is a node-local invariant, not an inter-node
    /// consensus rule.
    pub fn verify_candidate(candidate: &[Block], store: &Store, starting_reward: Amount) -> Result<(), PhnError> {
        let mut running = Chain::new();
        for block in candidate {
            running.validate_block(block, store, starting_reward)?;
            for tx in &block.transactions {
                running.txid_index.insert(tx.txid.clone());
                apply_to_balances(&mut running.balances, tx);
            }
            running.blocks.push(block.clone());
        }
        Ok(())
    }

    pub fn common_ancestor_height(&self, other: &[Block]) -> u64 {
        let mut height = 0u64;
        for (a, b) in self.blocks.iter().zip(other.iter()) {
            if a.hash != b.hash {
                break;
            }
            height = a.index + 1;
        }
        height
    }

    /// Inter-block timing over the trailing `window` blocks, for the mining
    /// diagnostics surface. `None` when there are fewer than two blocks to
    /// compare.
    pub fn block_time_stats(&self, window: usize) -> Option<BlockTimeStats> {
        if self.blocks.len() < 2 {
            return None;
        }
        let start = self.blocks.len().saturating_sub(window + 1);
        let diffs: Vec<i64> =
            self.blocks[start..].windows(2).map(|pair| pair[1].timestamp - pair[0].timestamp).collect();
        if diffs.is_empty() {
            return None;
        }
        let sum: i64 = diffs.iter().sum();
        Some(BlockTimeStats {
            average_secs: sum as f64 / diffs.len() as f64,
            min_secs: *diffs.iter().min().unwrap(),
            max_secs: *diffs.iter().max().unwrap(),
            sample_count: diffs.len(),
        })
    }
}

/// Summary of recent block timing, surfaced by the mining-info endpoint
/// (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTimeStats {
    pub average_secs: f64,
    pub min_secs: i64,
    pub max_secs: i64,
    pub sample_count: usize,
}

fn apply_to_balances(balances: &mut std::collections::HashMap<String, i128>, tx: &Transaction) {
    *balances.entry(tx.recipient.clone()).or_insert(0) += tx.amount.micro() as i128;
    if let Some(addr) = sender_address(tx) {
        *balances.entry(addr.as_str().to_string()).or_insert(0) -= (tx.amount.micro() + tx.fee.micro()) as i128;
    }
}
