//! The Node Facade (spec.md §4.9, C9): binds the chain, mempool, checkpointer,
//! and peer-sync engine behind the mutex discipline spec.md §5 describes, and
//! exposes the operation set the HTTP transport ([`crate::server`]) surfaces.
//!
//! `NodeHandle` owns no transport concerns of its own — it is plain async
//! Rust, callable from the axum handlers or directly from tests.

use std::sync::Arc;

use phn_chain::Chain;
use phn_consensus::Checkpointer;
use phn_core::block::Block;
use phn_core::error::PhnError;
use phn_core::time::now_unix;
use phn_core::transaction::Transaction;
use phn_core::types::{Address, Amount};
use phn_crypto::keypair::address_of;
use phn_mempool::Mempool;
use phn_store::Store;
use phn_sync::PeerSync;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Result of a successful `submit_tx` (spec.md §4.9).
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTxOutcome {
    pub txid: String,
    pub mempool_position: usize,
}

/// Result of a successful `submit_block`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmitBlockOutcome {
    pub index: u64,
    pub applied_difficulty: u8,
}

/// Result of `get_tx`.
#[derive(Debug, Clone, PartialEq)]
pub struct TxLookup {
    pub tx: Transaction,
    pub block_index: Option<u64>,
    pub confirmations: u64,
}

/// Result of `mining_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningInfo {
    pub difficulty: u8,
    pub block_reward: Amount,
    pub min_fee: Amount,
    pub height: u64,
    pub mempool_size: usize,
    pub owner_address: Address,
    pub target_block_seconds: i64,
    pub block_time_stats: Option<phn_chain::BlockTimeStats>,
}

/// Result of `token_info` (read-only, SPEC_FULL.md §6 auxiliary endpoint).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub name: String,
    pub total_supply: Amount,
    pub company_holdings: Amount,
    pub circulating_supply: Amount,
    pub supply_left: Amount,
}

/// Static, node-local parameters that are not themselves consensus state
/// (they seed genesis / inform diagnostics) but are not safe for an
/// individual node to diverge on once the network is live — see DESIGN.md's
/// "config vs. consensus constants" note.
pub struct NodeParams {
    pub owner_address: Address,
    pub starting_reward: Amount,
    pub total_supply: Amount,
    pub token_name: String,
}

pub struct NodeHandle {
    chain: RwLock<Chain>,
    mempool: Mutex<Mempool>,
    checkpointer: Mutex<Checkpointer>,
    sync: Mutex<PeerSync>,
    store: Store,
    params: NodeParams,
}

impl NodeHandle {
    pub fn new(
        chain: Chain,
        mempool: Mempool,
        checkpointer: Checkpointer,
        sync: PeerSync,
        store: Store,
        params: NodeParams,
    ) -> Self {
        Self {
            chain: RwLock::new(chain),
            mempool: Mutex::new(mempool),
            checkpointer: Mutex::new(checkpointer),
            sync: Mutex::new(sync),
            store,
            params,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn owner_address(&self) -> &Address {
        &self.params.owner_address
    }

    /// Resolve a `get_balance`/`submit_tx` sender-ish input to the [`Address`]
    /// balances are keyed by: pass through if it already has address shape,
    /// otherwise treat it as a hex public key.
    fn resolve_address(&self, input: &str) -> Result<Address, PhnError> {
        if Address::looks_like_address(input) {
            Ok(Address(input.to_string()))
        } else {
            address_of(input)
        }
    }

    /// `submit_tx` (spec.md §4.9). Holds the mempool lock across the
    /// balance-check-then-admit pair (spec.md §5 point 2) by computing the
    /// balance overlay and admitting under the same guard.
    pub async fn submit_tx(&self, tx: Transaction) -> Result<SubmitTxOutcome, PhnError> {
        let now = now_unix();
        let mut mempool = self.mempool.lock().await;

        let chain = self.chain.read().await;
        let overlay = mempool.snapshot();
        chain.validate_transaction(&tx, now, &overlay, &self.store)?;
        drop(chain);

        mempool.admit(tx.clone(), now)?;
        let position = mempool
            .snapshot()
            .iter()
            .position(|t| t.txid == tx.txid)
            .map(|i| i + 1)
            .unwrap_or(mempool.size());
        self.store.save_mempool(&mempool.snapshot())?;

        info!(txid = %tx.txid, position, "transaction admitted to mempool");
        Ok(SubmitTxOutcome { txid: tx.txid, mempool_position: position })
    }

    /// `submit_block` (spec.md §4.9). On success, schedules an asynchronous
    /// broadcast to peers — the caller (an `Arc<NodeHandle>`) keeps this
    /// handle alive for the duration of the spawned task.
    pub async fn submit_block(self: &Arc<Self>, block: Block) -> Result<SubmitBlockOutcome, PhnError> {
        let mut chain = self.chain.write().await;
        let applied_difficulty = chain.difficulty_for_next();
        chain.validate_block(&block, &self.store, self.params.starting_reward)?;

        let mut checkpointer = self.checkpointer.lock().await;
        let included = chain.append(block.clone(), &self.store, &mut checkpointer)?;
        drop(checkpointer);
        let index = block.index;
        drop(chain);

        let mut mempool = self.mempool.lock().await;
        mempool.remove(&included);
        self.store.save_mempool(&mempool.snapshot())?;
        drop(mempool);

        let handle = Arc::clone(self);
        tokio::spawn(async move {
            let now = now_unix();
            let mut sync = handle.sync.lock().await;
            sync.broadcast_block(&block, now).await;
        });

        Ok(SubmitBlockOutcome { index, applied_difficulty })
    }

    /// `get_pending` (spec.md §4.9): mempool snapshot ordered by fee desc.
    pub async fn get_pending(&self) -> Vec<Transaction> {
        self.mempool.lock().await.snapshot()
    }

    /// `get_chain` (spec.md §4.9): full chain.
    pub async fn get_chain(&self) -> Vec<Block> {
        self.chain.read().await.blocks().to_vec()
    }

    /// `get_tx` (spec.md §4.9): confirmed chain takes precedence over the
    /// mempool, matching the original's search order.
    pub async fn get_tx(&self, txid: &str) -> Result<TxLookup, PhnError> {
        let chain = self.chain.read().await;
        for block in chain.blocks() {
            if let Some(tx) = block.transactions.iter().find(|t| t.txid == txid) {
                let confirmations = chain.len() as u64 - block.index;
                return Ok(TxLookup { tx: tx.clone(), block_index: Some(block.index), confirmations });
            }
        }
        drop(chain);

        let mempool = self.mempool.lock().await;
        if let Some(tx) = mempool.get(txid) {
            return Ok(TxLookup { tx: tx.clone(), block_index: None, confirmations: 0 });
        }

        Err(PhnError::NotFound(txid.to_string()))
    }

    /// `get_balance` (spec.md §4.9): confirmed chain plus current mempool,
    /// per spec.md §4.4's `balance_of`.
    pub async fn get_balance(&self, address_or_pubkey: &str) -> Result<Amount, PhnError> {
        let address = self.resolve_address(address_or_pubkey)?;
        let chain = self.chain.read().await;
        let overlay = self.mempool.lock().await.snapshot();
        Ok(chain.balance_of(&address, &overlay))
    }

    /// `add_peer` (spec.md §4.9): records the peer, persists the peer set,
    /// and schedules a one-shot `sync_with(peer)`.
    pub async fn add_peer(self: &Arc<Self>, url: String) -> Result<Vec<String>, PhnError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PhnError::Other("peer URL must start with http:// or https://".to_string()));
        }

        let mut sync = self.sync.lock().await;
        sync.add_peer(url.clone());
        let peers = sync.peers().to_vec();
        drop(sync);
        self.store.save_peers(&peers)?;

        let handle = Arc::clone(self);
        tokio::spawn(async move {
            let now = now_unix();
            let mut chain = handle.chain.write().await;
            let mut checkpointer = handle.checkpointer.lock().await;
            let mut sync = handle.sync.lock().await;
            match sync
                .sync_with(&url, &mut chain, &handle.store, &mut checkpointer, now, handle.params.starting_reward)
                .await
            {
                Ok(true) => info!(peer = %url, "adopted peer's chain after add_peer"),
                Ok(false) => {}
                Err(e) => warn!(peer = %url, error = %e, "post-add_peer sync failed"),
            }
        });

        Ok(peers)
    }

    pub async fn list_peers(&self) -> Vec<String> {
        self.sync.lock().await.peers().to_vec()
    }

    /// `mining_info` (spec.md §4.9).
    pub async fn mining_info(&self, min_fee: Amount, target_block_seconds: i64) -> MiningInfo {
        let chain = self.chain.read().await;
        let difficulty = chain.difficulty_for_next();
        let height = chain.len() as u64;
        let block_reward = phn_chain::block_reward(height, self.params.starting_reward);
        let block_time_stats = chain.block_time_stats(10);
        drop(chain);

        let mempool_size = self.mempool.lock().await.size();

        MiningInfo {
            difficulty,
            block_reward,
            min_fee,
            height,
            mempool_size,
            owner_address: self.params.owner_address.clone(),
            target_block_seconds,
            block_time_stats,
        }
    }

    /// `token_info` (SPEC_FULL.md §6): static-ish totals derived from the
    /// sum of every coinbase transaction ever mined.
    pub async fn token_info(&self) -> TokenInfo {
        let chain = self.chain.read().await;
        let circulating: u64 = chain
            .blocks()
            .iter()
            .filter_map(|b| b.coinbase())
            .map(|tx| tx.amount.micro())
            .sum();
        let circulating_supply = Amount::from_micro(circulating);
        let company_holdings = chain.balance_of(&self.params.owner_address, &[]);
        let supply_left = self.params.total_supply.checked_sub(circulating_supply).unwrap_or(Amount::ZERO);

        TokenInfo {
            name: self.params.token_name.clone(),
            total_supply: self.params.total_supply,
            company_holdings,
            circulating_supply,
            supply_left,
        }
    }

    /// One iteration of the background sync task (spec.md §4.8 `periodic`).
    pub async fn run_sync_tick(&self) {
        let now = now_unix();
        let mut chain = self.chain.write().await;
        let mut checkpointer = self.checkpointer.lock().await;
        let mut sync = self.sync.lock().await;
        sync.periodic_tick(&mut chain, &self.store, &mut checkpointer, now, self.params.starting_reward).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phn_chain::Chain;
    use phn_consensus::Checkpointer;
    use phn_core::constants::{MIN_TX_FEE_MICRO, ZERO_HASH};
    use phn_core::encoding::transaction_signing_bytes;
    use phn_crypto::hash::{compute_txid, hash_block, sha256_hex};
    use phn_crypto::keypair::KeyPair;
    use phn_crypto::pow::meets_difficulty;
    use phn_mempool::Mempool;
    use phn_sync::{PeerSync, SyncConfig};
    use phn_store::Store;

    const STARTING_REWARD: Amount = Amount(50 * 100_000_000);
    const TOTAL_SUPPLY: Amount = Amount(1_000_000_000 * 100_000_000);

    fn owner_keypair() -> KeyPair {
        KeyPair::generate()
    }

    fn genesis_block(owner: &Address, timestamp: i64) -> Block {
        let amount = Amount::from_micro(TOTAL_SUPPLY.micro() / 10);
        let txid = sha256_hex(format!("genesis_{}_{timestamp}", owner.as_str()).as_bytes());
        let coinbase = Transaction {
            sender: "coinbase".to_string(),
            recipient: owner.as_str().to_string(),
            amount,
            fee: Amount::ZERO,
            timestamp,
            nonce: 0,
            txid,
            signature: "genesis".to_string(),
        };
        let mut block =
            Block { index: 0, timestamp, transactions: vec![coinbase], prev_hash: ZERO_HASH.to_string(), nonce: 0, hash: String::new() };
        block.hash = hash_block(&block).unwrap();
        block
    }

    fn mine(mut block: Block, difficulty: u8) -> Block {
        loop {
            block.hash = hash_block(&block).unwrap();
            if meets_difficulty(&block.hash, difficulty) {
                return block;
            }
            block.nonce += 1;
        }
    }

    fn test_node() -> (Arc<NodeHandle>, KeyPair, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let owner = owner_keypair();
        let genesis = genesis_block(owner.address(), 1_700_000_000);
        let chain = Chain::from_blocks(vec![genesis]);

        let node = NodeHandle::new(
            chain,
            Mempool::default(),
            Checkpointer::new(),
            PeerSync::new(SyncConfig::default()),
            store,
            NodeParams {
                owner_address: owner.address().clone(),
                starting_reward: STARTING_REWARD,
                total_supply: TOTAL_SUPPLY,
                token_name: "PHN".to_string(),
            },
        );
        (Arc::new(node), owner, dir)
    }

    fn signed_transfer(sender: &KeyPair, recipient: &Address, amount: u64, fee: u64, timestamp: i64, nonce: u64) -> Transaction {
        let txid = compute_txid(
            sender.public_hex(),
            recipient.as_str(),
            Amount::from_micro(amount),
            Amount::from_micro(fee),
            timestamp,
            nonce,
        );
        let mut tx = Transaction {
            sender: sender.public_hex().to_string(),
            recipient: recipient.as_str().to_string(),
            amount: Amount::from_micro(amount),
            fee: Amount::from_micro(fee),
            timestamp,
            nonce,
            txid,
            signature: String::new(),
        };
        let preimage = transaction_signing_bytes(&tx).unwrap();
        tx.signature = sender.sign(&preimage).unwrap();
        tx
    }

    #[tokio::test]
    async fn submit_tx_admits_a_well_formed_transfer() {
        let (node, owner, _dir) = test_node();
        let recipient = KeyPair::generate();
        let now = now_unix();
        let tx = signed_transfer(&owner, recipient.address(), 1_000_000, MIN_TX_FEE_MICRO, now, 1);

        let outcome = node.submit_tx(tx.clone()).await.unwrap();
        assert_eq!(outcome.txid, tx.txid);
        assert_eq!(outcome.mempool_position, 1);
        assert_eq!(node.get_pending().await.len(), 1);
    }

    #[tokio::test]
    async fn submit_tx_rejects_a_double_spend_pair() {
        let (node, owner, _dir) = test_node();
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let now = now_unix();
        let whole_balance = TOTAL_SUPPLY.micro() / 10;

        let tx1 = signed_transfer(&owner, a.address(), whole_balance - MIN_TX_FEE_MICRO, MIN_TX_FEE_MICRO, now, 1);
        node.submit_tx(tx1).await.unwrap();

        let tx2 = signed_transfer(&owner, b.address(), whole_balance - MIN_TX_FEE_MICRO, MIN_TX_FEE_MICRO, now, 2);
        let err = node.submit_tx(tx2).await.unwrap_err();
        assert!(matches!(err, PhnError::InsufficientBalance { .. }));
    }

    #[tokio::test]
    async fn get_balance_reflects_mempool_overlay() {
        let (node, owner, _dir) = test_node();
        let recipient = KeyPair::generate();
        let now = now_unix();
        let tx = signed_transfer(&owner, recipient.address(), 2_000_000, MIN_TX_FEE_MICRO, now, 1);
        node.submit_tx(tx).await.unwrap();

        let balance = node.get_balance(recipient.address().as_str()).await.unwrap();
        assert_eq!(balance, Amount::from_micro(2_000_000));
    }

    #[tokio::test]
    async fn get_balance_accepts_a_raw_public_key() {
        let (node, owner, _dir) = test_node();
        let balance = node.get_balance(owner.public_hex()).await.unwrap();
        assert_eq!(balance, Amount::from_micro(TOTAL_SUPPLY.micro() / 10));
    }

    #[tokio::test]
    async fn submit_block_applies_reward_and_clears_mined_transactions() {
        let (node, owner, _dir) = test_node();
        let recipient = KeyPair::generate();
        let now = now_unix();
        let tx = signed_transfer(&owner, recipient.address(), 1_000_000, MIN_TX_FEE_MICRO, now, 1);
        node.submit_tx(tx.clone()).await.unwrap();

        let tip = node.get_chain().await.into_iter().last().unwrap();
        let reward = phn_chain::block_reward(1, STARTING_REWARD);
        let coinbase = Transaction {
            sender: "coinbase".to_string(),
            recipient: owner.address().as_str().to_string(),
            amount: reward,
            fee: Amount::ZERO,
            timestamp: now,
            nonce: 0,
            txid: sha256_hex(format!("coinbase-{now}-1").as_bytes()),
            signature: "genesis".to_string(),
        };
        let fee_payout = Transaction {
            sender: "miners_pool".to_string(),
            recipient: owner.address().as_str().to_string(),
            amount: tx.fee,
            fee: Amount::ZERO,
            timestamp: now,
            nonce: 0,
            txid: sha256_hex(format!("feepayout-{now}-1").as_bytes()),
            signature: "genesis".to_string(),
        };
        let candidate = Block {
            index: 1,
            timestamp: now,
            transactions: vec![coinbase, tx.clone(), fee_payout],
            prev_hash: tip.hash.clone(),
            nonce: 0,
            hash: String::new(),
        };
        let mined = mine(candidate, 3);

        let outcome = node.submit_block(mined).await.unwrap();
        assert_eq!(outcome.index, 1);
        assert!(node.get_pending().await.is_empty());

        let lookup = node.get_tx(&tx.txid).await.unwrap();
        assert_eq!(lookup.block_index, Some(1));
    }

    #[tokio::test]
    async fn add_peer_rejects_a_non_http_url() {
        let (node, _owner, _dir) = test_node();
        let err = node.add_peer("ftp://example.com".to_string()).await.unwrap_err();
        assert!(matches!(err, PhnError::Other(_)));
    }

    #[tokio::test]
    async fn token_info_reports_genesis_circulating_supply() {
        let (node, _owner, _dir) = test_node();
        let info = node.token_info().await;
        assert_eq!(info.circulating_supply, Amount::from_micro(TOTAL_SUPPLY.micro() / 10));
        assert_eq!(info.total_supply, TOTAL_SUPPLY);
    }

    #[tokio::test]
    async fn mining_info_reports_default_difficulty_at_genesis() {
        let (node, _owner, _dir) = test_node();
        let info = node.mining_info(Amount::from_micro(MIN_TX_FEE_MICRO), 60).await;
        assert_eq!(info.difficulty, 3);
        assert_eq!(info.height, 1);
    }
}
