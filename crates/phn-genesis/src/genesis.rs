use phn_core::block::Block;
use phn_core::constants::{COINBASE_SENDER, GENESIS_OWNER_SHARE_DEN, GENESIS_OWNER_SHARE_NUM, SYSTEM_SIGNATURE, ZERO_HASH};
use phn_core::error::PhnError;
use phn_core::transaction::Transaction;
use phn_core::types::{Address, Amount, Timestamp};
use phn_core::validation::ValidationRecord;
use phn_crypto::{hash_block, sha256_hex};
use tracing::info;

/// Build the single coinbase-to-owner genesis block (spec.md §3: `chain[0]`
/// has index 0, `prev_hash` of all zeros, and exactly one coinbase
/// transaction paying `TOTAL_SUPPLY * 10%` to the owner address).
///
/// Unlike every later block, genesis is never run through
/// [`phn_chain::Chain::validate_block`] — it is the founding document, not a
/// mined submission, so it carries no proof of work and is injected
/// directly into an empty chain.
pub fn build_genesis_block(owner: &Address, total_supply: Amount, timestamp: Timestamp) -> Result<Block, PhnError> {
    let owner_share_micro = total_supply
        .micro()
        .checked_mul(GENESIS_OWNER_SHARE_NUM)
        .map(|v| v / GENESIS_OWNER_SHARE_DEN)
        .ok_or_else(|| PhnError::Other("total supply overflow computing genesis owner share".to_string()))?;
    let owner_share = Amount::from_micro(owner_share_micro);

    let txid = sha256_hex(format!("genesis_{}_{}", owner.as_str(), timestamp).as_bytes());

    let coinbase = Transaction {
        sender: COINBASE_SENDER.to_string(),
        recipient: owner.as_str().to_string(),
        amount: owner_share,
        fee: Amount::ZERO,
        timestamp,
        nonce: 0,
        txid,
        signature: SYSTEM_SIGNATURE.to_string(),
    };

    let mut block = Block {
        index: 0,
        timestamp,
        transactions: vec![coinbase],
        prev_hash: ZERO_HASH.to_string(),
        nonce: 0,
        hash: String::new(),
    };
    block.hash = hash_block(&block)?;

    info!(owner = %owner, amount = %owner_share, "built genesis block");
    Ok(block)
}

/// The validation-ledger record genesis's coinbase transaction should be
/// persisted under, so a later replay check finds it already settled.
pub fn genesis_validation_record(block: &Block, timestamp: Timestamp) -> ValidationRecord {
    let txid = block.coinbase().map(|tx| tx.txid.clone()).unwrap_or_default();
    ValidationRecord::valid(txid, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address("PHN".to_string() + &"a".repeat(40))
    }

    #[test]
    fn genesis_block_has_expected_shape() {
        let block = build_genesis_block(&owner(), Amount::from_micro(1_000_000_000 * 100_000_000), 1_000_000).unwrap();
        assert_eq!(block.index, 0);
        assert_eq!(block.prev_hash, ZERO_HASH);
        assert_eq!(block.coinbase_count(), 1);
        assert_eq!(hash_block(&block).unwrap(), block.hash);
    }

    #[test]
    fn owner_receives_exactly_ten_percent_of_supply() {
        let total_supply = Amount::from_micro(1_000_000_000 * 100_000_000); // 1,000,000,000 PHN
        let block = build_genesis_block(&owner(), total_supply, 1_000_000).unwrap();
        let coinbase = block.coinbase().unwrap();
        assert_eq!(coinbase.amount, Amount::from_micro(100_000_000 * 100_000_000)); // 100,000,000 PHN
    }

    #[test]
    fn genesis_validation_record_is_valid_for_the_coinbase_txid() {
        let block = build_genesis_block(&owner(), Amount::from_micro(100_000_000_000), 1_000_000).unwrap();
        let record = genesis_validation_record(&block, 1_000_000);
        assert!(record.is_valid());
        assert_eq!(record.txid, block.coinbase().unwrap().txid);
    }
}
