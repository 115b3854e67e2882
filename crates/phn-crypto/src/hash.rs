use sha2::{Digest, Sha256};

use phn_core::block::Block;
use phn_core::encoding::block_hashing_bytes;
use phn_core::error::PhnError;
use phn_core::types::{Amount, Timestamp};

/// SHA-256 over arbitrary bytes, returned as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(digest)
}

/// SHA-256 digest over arbitrary bytes, as raw bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// `hash_block` (SPEC_FULL.md §1, spec.md §4.1): SHA-256 of the block's
/// canonical encoding with its `hash` field removed.
pub fn hash_block(block: &Block) -> Result<String, PhnError> {
    let bytes = block_hashing_bytes(block)?;
    Ok(sha256_hex(&bytes))
}

/// `txid` (spec.md §3): SHA-256 over the canonical-decimal concatenation of
/// `sender ‖ recipient ‖ amount ‖ fee ‖ timestamp ‖ nonce`. Only ever
/// re-derived by transaction producers (genesis, external miners); the
/// chain itself checks txid shape, not recomputation (spec.md §4.4 step 5).
pub fn compute_txid(sender: &str, recipient: &str, amount: Amount, fee: Amount, timestamp: Timestamp, nonce: u64) -> String {
    let preimage = format!(
        "{sender}{recipient}{}{}{timestamp}{nonce}",
        amount.to_canonical(),
        fee.to_canonical(),
    );
    sha256_hex(preimage.as_bytes())
}
