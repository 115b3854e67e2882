use serde::{Deserialize, Serialize};

use crate::constants::{COINBASE_SENDER, MINERS_POOL_SENDER, SYSTEM_SIGNATURE};
use crate::types::{Address, Amount, Timestamp, TxId};

/// A signed value-transfer transaction.
///
/// Field names are bit-exact with the wire protocol (SPEC_FULL.md §13):
/// they enter the hash/signature preimage verbatim, so renaming any of them
/// is a consensus break, not a refactor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Either the system sentinel [`COINBASE_SENDER`]/[`MINERS_POOL_SENDER`],
    /// or the 128-hex-character secp256k1 public key of a user sender.
    pub sender: String,
    /// The canonical [`Address`] of the recipient.
    pub recipient: String,
    pub amount: Amount,
    pub fee: Amount,
    pub timestamp: Timestamp,
    pub nonce: u64,
    pub txid: String,
    /// Hex-encoded signature, or the literal `"genesis"` for system senders.
    pub signature: String,
}

/// The parsed identity of a transaction's `sender` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sender {
    Coinbase,
    MinersPool,
    User(String),
}

impl Transaction {
    pub fn sender_kind(&self) -> Sender {
        match self.sender.as_str() {
            COINBASE_SENDER => Sender::Coinbase,
            MINERS_POOL_SENDER => Sender::MinersPool,
            other => Sender::User(other.to_string()),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.sender_kind(), Sender::Coinbase | Sender::MinersPool)
    }

    /// True iff the signature is the literal system sentinel.
    pub fn has_system_signature(&self) -> bool {
        self.signature == SYSTEM_SIGNATURE
    }

    pub fn recipient_address(&self) -> Address {
        Address(self.recipient.clone())
    }

    pub fn txid_typed(&self) -> TxId {
        TxId(self.txid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sender: &str) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            recipient: "PHN".to_string() + &"a".repeat(40),
            amount: Amount::from_micro(100_000_000),
            fee: Amount::from_micro(2_000_000),
            timestamp: 1_000_000,
            nonce: 1,
            txid: "a".repeat(64),
            signature: "genesis".to_string(),
        }
    }

    #[test]
    fn recognizes_system_senders() {
        assert_eq!(sample(COINBASE_SENDER).sender_kind(), Sender::Coinbase);
        assert_eq!(sample(MINERS_POOL_SENDER).sender_kind(), Sender::MinersPool);
        assert!(sample(COINBASE_SENDER).is_system());
    }

    #[test]
    fn recognizes_user_sender() {
        let tx = sample(&"0".repeat(128));
        assert!(!tx.is_system());
        assert_eq!(tx.sender_kind(), Sender::User("0".repeat(128)));
    }
}
