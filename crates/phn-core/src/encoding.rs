//! Canonical byte encoding (SPEC_FULL.md §12).
//!
//! `serde_json`'s `Map` is a `BTreeMap` unless the `preserve_order` feature
//! is enabled (it isn't, on purpose — see the root `Cargo.toml`), so
//! serializing a `Value::Object` already yields lexicographically sorted
//! keys. Combined with `Amount`'s fixed-precision string serialization,
//! `to_vec` on a `Value` built this way is the canonical encoding used for
//! both hashing and signing.

use serde::Serialize;
use serde_json::Value;

use crate::block::Block;
use crate::error::PhnError;
use crate::transaction::Transaction;

fn to_canonical_value<T: Serialize>(value: &T) -> Result<Value, PhnError> {
    serde_json::to_value(value).map_err(|e| PhnError::Serialization(e.to_string()))
}

fn without_field(mut value: Value, field: &str) -> Value {
    if let Value::Object(map) = &mut value {
        map.remove(field);
    }
    value
}

/// Canonical bytes of a JSON value: compact, sorted keys, no extra whitespace.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    // `serde_json::to_vec` never fails on a `Value`.
    serde_json::to_vec(value).expect("Value serialization is infallible")
}

/// The byte preimage signed and verified for a transaction: the transaction
/// encoded canonically with its `signature` field entirely absent.
pub fn transaction_signing_bytes(tx: &Transaction) -> Result<Vec<u8>, PhnError> {
    let value = to_canonical_value(tx)?;
    Ok(canonical_bytes(&without_field(value, "signature")))
}

/// The byte preimage hashed for a block: the block encoded canonically with
/// its `hash` field entirely absent.
pub fn block_hashing_bytes(block: &Block) -> Result<Vec<u8>, PhnError> {
    let value = to_canonical_value(block)?;
    Ok(canonical_bytes(&without_field(value, "hash")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Amount;

    fn sample_tx() -> Transaction {
        Transaction {
            sender: "coinbase".to_string(),
            recipient: "PHN".to_string() + &"a".repeat(40),
            amount: Amount::from_micro(100_000_000),
            fee: Amount::ZERO,
            timestamp: 1_000_000,
            nonce: 0,
            txid: "b".repeat(64),
            signature: "genesis".to_string(),
        }
    }

    #[test]
    fn signing_bytes_omit_signature_field() {
        let bytes = transaction_signing_bytes(&sample_tx()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("signature"));
        assert!(text.contains("\"amount\":\"100.00000000\""));
    }

    #[test]
    fn signing_bytes_are_deterministic_regardless_of_struct_field_order() {
        let a = transaction_signing_bytes(&sample_tx()).unwrap();
        let b = transaction_signing_bytes(&sample_tx()).unwrap();
        assert_eq!(a, b);
        // Keys must come out lexicographically sorted.
        let text = String::from_utf8(a).unwrap();
        let amount_pos = text.find("amount").unwrap();
        let sender_pos = text.find("sender").unwrap();
        let txid_pos = text.find("txid").unwrap();
        assert!(amount_pos < sender_pos);
        assert!(sender_pos < txid_pos);
    }
}
