use std::path::Path;

use phn_core::block::Block;
use phn_core::error::PhnError;
use phn_core::transaction::Transaction;
use phn_core::validation::ValidationRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Persistent node state backed by sled (pure-Rust, embedded, memory-mapped —
/// no external database required, per spec.md §4.3/§6).
///
/// Named trees:
///   blocks     — zero-padded 10-digit index  → canonical JSON of the block
///   pending    — zero-padded insertion index → canonical JSON of the transaction
///   peers      — zero-padded insertion index → UTF-8 peer URL bytes
///   metadata   — `"blockchain_meta"`         → `{block_count, last_updated}`
///   validation — `"tx:" + txid`              → JSON [`ValidationRecord`]
pub struct Store {
    db: sled::Db,
    blocks: sled::Tree,
    pending: sled::Tree,
    peers: sled::Tree,
    metadata: sled::Tree,
    validation: sled::Tree,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockchainMeta {
    block_count: u64,
    last_updated: i64,
}

const META_KEY: &[u8] = b"blockchain_meta";

fn padded_key(index: u64) -> Vec<u8> {
    format!("{index:010}").into_bytes()
}

fn storage_error(e: impl std::fmt::Display) -> PhnError {
    PhnError::Storage(e.to_string())
}

impl Store {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PhnError> {
        let db = sled::open(path).map_err(storage_error)?;
        let blocks = db.open_tree("blocks").map_err(storage_error)?;
        let pending = db.open_tree("pending").map_err(storage_error)?;
        let peers = db.open_tree("peers").map_err(storage_error)?;
        let metadata = db.open_tree("metadata").map_err(storage_error)?;
        let validation = db.open_tree("validation").map_err(storage_error)?;
        Ok(Self { db, blocks, pending, peers, metadata, validation })
    }

    // ── Chain ────────────────────────────────────────────────────────────────

    /// Atomically replace the persisted chain: clear `blocks` and rewrite the
    /// metadata record in a single sled transaction, so a reader observes
    /// either the old chain or the new one, never a mixture (spec.md §4.3's
    /// crash-safety requirement).
    pub fn save_chain(&self, chain: &[Block]) -> Result<(), PhnError> {
        let encoded: Vec<(Vec<u8>, Vec<u8>)> = chain
            .iter()
            .map(|b| {
                serde_json::to_vec(b)
                    .map(|bytes| (padded_key(b.index), bytes))
                    .map_err(|e| PhnError::Serialization(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let meta = BlockchainMeta {
            block_count: chain.len() as u64,
            last_updated: phn_core::time::now_unix(),
        };
        let meta_bytes = serde_json::to_vec(&meta).map_err(|e| PhnError::Serialization(e.to_string()))?;

        (&self.blocks, &self.metadata)
            .transaction(|(blocks_tx, meta_tx)| {
                let existing_keys: Vec<_> = blocks_tx.iter().filter_map(|r| r.ok()).map(|(k, _)| k).collect();
                for key in existing_keys {
                    blocks_tx.remove(key)?;
                }
                for (key, value) in &encoded {
                    blocks_tx.insert(key.as_slice(), value.as_slice())?;
                }
                meta_tx.insert(META_KEY, meta_bytes.as_slice())?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| storage_error(e))?;

        self.db.flush().map_err(storage_error)?;
        debug!(blocks = chain.len(), "chain persisted");
        Ok(())
    }

    /// Load the full persisted chain, ordered by ascending block index.
    /// Returns `Ok(None)` if no chain has ever been saved.
    pub fn load_chain(&self) -> Result<Option<Vec<Block>>, PhnError> {
        if !self.metadata.contains_key(META_KEY).map_err(storage_error)? {
            return Ok(None);
        }
        let mut blocks = Vec::new();
        for item in self.blocks.iter() {
            let (_, value) = item.map_err(storage_error)?;
            let block: Block = serde_json::from_slice(&value).map_err(|e| PhnError::Serialization(e.to_string()))?;
            blocks.push(block);
        }
        blocks.sort_by_key(|b| b.index);
        Ok(Some(blocks))
    }

    // ── Mempool snapshot ─────────────────────────────────────────────────────

    pub fn save_mempool(&self, txs: &[Transaction]) -> Result<(), PhnError> {
        self.pending.clear().map_err(storage_error)?;
        for (i, tx) in txs.iter().enumerate() {
            let bytes = serde_json::to_vec(tx).map_err(|e| PhnError::Serialization(e.to_string()))?;
            self.pending.insert(padded_key(i as u64), bytes).map_err(storage_error)?;
        }
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }

    pub fn load_mempool(&self) -> Result<Vec<Transaction>, PhnError> {
        let mut txs = Vec::new();
        for item in self.pending.iter() {
            let (_, value) = item.map_err(storage_error)?;
            let tx: Transaction = serde_json::from_slice(&value).map_err(|e| PhnError::Serialization(e.to_string()))?;
            txs.push(tx);
        }
        Ok(txs)
    }

    // ── Peers ────────────────────────────────────────────────────────────────

    pub fn save_peers(&self, urls: &[String]) -> Result<(), PhnError> {
        self.peers.clear().map_err(storage_error)?;
        for (i, url) in urls.iter().enumerate() {
            self.peers.insert(padded_key(i as u64), url.as_bytes()).map_err(storage_error)?;
        }
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }

    pub fn load_peers(&self) -> Result<Vec<String>, PhnError> {
        let mut urls = Vec::new();
        for item in self.peers.iter() {
            let (_, value) = item.map_err(storage_error)?;
            let url = String::from_utf8(value.to_vec()).map_err(|e| PhnError::Serialization(e.to_string()))?;
            urls.push(url);
        }
        Ok(urls)
    }

    // ── Validation ledger ────────────────────────────────────────────────────

    pub fn put_validation(&self, record: &ValidationRecord) -> Result<(), PhnError> {
        let key = format!("tx:{}", record.txid);
        let bytes = serde_json::to_vec(record).map_err(|e| PhnError::Serialization(e.to_string()))?;
        self.validation.insert(key.as_bytes(), bytes).map_err(storage_error)?;
        Ok(())
    }

    pub fn get_validation(&self, txid: &str) -> Result<Option<ValidationRecord>, PhnError> {
        let key = format!("tx:{txid}");
        match self.validation.get(key.as_bytes()).map_err(storage_error)? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(|e| PhnError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Flush pending writes to disk without consuming the store — used on
    /// graceful shutdown, where callers only hold a shared reference.
    pub fn flush(&self) -> Result<(), PhnError> {
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }

    /// Flush and drop the underlying sled handle.
    pub fn close(self) -> Result<(), PhnError> {
        self.db.flush().map_err(storage_error)?;
        info!("store closed");
        Ok(())
    }
}
