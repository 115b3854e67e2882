use phn_core::constants::{MAX_FUTURE_SKEW_SECS, MAX_PAST_AGE_SECS, MIN_TX_FEE_MICRO};
use phn_core::encoding::transaction_signing_bytes;
use phn_core::error::PhnError;
use phn_core::transaction::{Sender, Transaction};
use phn_core::types::{Address, Amount, Timestamp, TxId};
use phn_core::validation::ValidationRecord;
use phn_crypto::keypair::{address_of, verify};
use phn_store::Store;
use tracing::debug;

/// Proof of Universal Validation (spec.md §4.4): the fixed ordered checklist
/// every non-system transaction passes before admission. `now` is the
/// validation instant (wall-clock for mempool admission, the containing
/// block's timestamp when validating an embedded transaction).
///
/// `balance` is the sender's balance already evaluated over the confirmed
/// chain plus whatever mempool/in-block overlay the caller wants reflected
/// (see `phn_chain::chain::Chain::balance_of`).
pub fn validate_transaction(
    tx: &Transaction,
    now: Timestamp,
    balance: Amount,
    already_in_chain: bool,
    store: &Store,
) -> Result<(), PhnError> {
    match validate_transaction_inner(tx, now, balance, already_in_chain, store) {
        Ok(()) => {
            store.put_validation(&ValidationRecord::valid(tx.txid.clone(), now))?;
            Ok(())
        }
        Err(PhnError::Replay(_)) => {
            // Replay is a property of chain membership, not of the tx body —
            // it is not re-recorded as a fresh invalid verdict.
            Err(PhnError::Replay(tx.txid.clone()))
        }
        Err(e) => {
            store.put_validation(&ValidationRecord::invalid(tx.txid.clone(), e.to_string(), now))?;
            Err(e)
        }
    }
}

fn validate_transaction_inner(
    tx: &Transaction,
    now: Timestamp,
    balance: Amount,
    already_in_chain: bool,
    store: &Store,
) -> Result<(), PhnError> {
    // 1. Replay ledger.
    if let Some(record) = store.get_validation(&tx.txid)? {
        if record.is_valid() {
            if already_in_chain {
                return Err(PhnError::Replay(tx.txid.clone()));
            }
            // Previously validated but not yet mined — fall through and
            // re-check normally (cheap, and covers a changed balance).
        } else {
            return Err(PhnError::PreviouslyInvalid(record.reason.unwrap_or_default()));
        }
    }

    // 2. Schema.
    if tx.sender.is_empty() {
        return Err(PhnError::MissingField("sender"));
    }
    if tx.recipient.is_empty() {
        return Err(PhnError::MissingField("recipient"));
    }
    if tx.txid.is_empty() {
        return Err(PhnError::MissingField("txid"));
    }

    // 3. Timestamp window.
    if tx.timestamp > now + MAX_FUTURE_SKEW_SECS {
        return Err(PhnError::TimestampInFuture);
    }
    if now - tx.timestamp > MAX_PAST_AGE_SECS {
        return Err(PhnError::TimestampTooOld);
    }

    // 4. Signature.
    match tx.sender_kind() {
        Sender::User(pubkey) => {
            if tx.signature.is_empty() || tx.signature == phn_core::constants::SYSTEM_SIGNATURE {
                return Err(PhnError::InvalidSignature);
            }
            let preimage = transaction_signing_bytes(tx)?;
            if !verify(&pubkey, &tx.signature, &preimage) {
                return Err(PhnError::InvalidSignature);
            }
        }
        Sender::Coinbase | Sender::MinersPool => {
            if !tx.has_system_signature() {
                return Err(PhnError::InvalidSignature);
            }
        }
    }

    // 5. Txid shape.
    if !TxId::is_well_formed(&tx.txid) {
        return Err(PhnError::MalformedTxId);
    }

    // 6. Amount.
    if tx.amount.micro() == 0 {
        return Err(PhnError::ZeroAmount);
    }

    // 7. Fee (user senders only).
    let is_user = matches!(tx.sender_kind(), Sender::User(_));
    if is_user && tx.fee.micro() < MIN_TX_FEE_MICRO {
        return Err(PhnError::FeeTooLow { min: MIN_TX_FEE_MICRO, got: tx.fee.micro() });
    }

    // 8. Solvency (user senders only — system senders have no backing address).
    if is_user {
        let need = tx
            .amount
            .checked_add(tx.fee)
            .ok_or_else(|| PhnError::Other("amount + fee overflow".to_string()))?;
        if balance < need {
            return Err(PhnError::InsufficientBalance { need: need.micro(), have: balance.micro() });
        }
    }

    debug!(txid = %tx.txid, "transaction passed POUV");
    Ok(())
}

/// Coerce a transaction's sender to the [`Address`] balances are keyed by.
/// System senders have no derivable address and return `None`.
pub fn sender_address(tx: &Transaction) -> Option<Address> {
    match tx.sender_kind() {
        Sender::User(pubkey) => address_of(&pubkey).ok(),
        Sender::Coinbase | Sender::MinersPool => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phn_core::constants::MIN_TX_FEE_MICRO;
    use phn_crypto::keypair::KeyPair;

    fn store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    fn signed_tx(kp: &KeyPair, recipient: &str, amount: u64, fee: u64, timestamp: i64, nonce: u64) -> Transaction {
        let mut tx = Transaction {
            sender: kp.public_hex().to_string(),
            recipient: recipient.to_string(),
            amount: Amount::from_micro(amount),
            fee: Amount::from_micro(fee),
            timestamp,
            nonce,
            txid: String::new(),
            signature: String::new(),
        };
        let txid_bytes = format!(
            "{}{}{}{}{}{}",
            tx.sender, tx.recipient, tx.amount.to_canonical(), tx.fee.to_canonical(), tx.timestamp, tx.nonce
        );
        tx.txid = phn_crypto::hash::sha256_hex(txid_bytes.as_bytes());
        let preimage = transaction_signing_bytes(&tx).unwrap();
        tx.signature = kp.sign(&preimage).unwrap();
        tx
    }

    #[test]
    fn well_formed_transaction_is_admitted() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100_000_000, MIN_TX_FEE_MICRO, 1_000_000, 1);
        let balance = Amount::from_micro(200_000_000);
        assert!(validate_transaction(&tx, 1_000_000, balance, false, &store).is_ok());
    }

    #[test]
    fn rejects_tampered_signature() {
        let store = store();
        let kp = KeyPair::generate();
        let mut tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100_000_000, MIN_TX_FEE_MICRO, 1_000_000, 1);
        tx.amount = Amount::from_micro(999_000_000);
        let balance = Amount::from_micro(999_999_999_999);
        let err = validate_transaction(&tx, 1_000_000, balance, false, &store).unwrap_err();
        assert_eq!(err, PhnError::InvalidSignature);
    }

    #[test]
    fn rejects_future_timestamp() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 1, MIN_TX_FEE_MICRO, 10_000_000, 1);
        let err = validate_transaction(&tx, 1_000, Amount::from_micro(1_000_000), false, &store).unwrap_err();
        assert_eq!(err, PhnError::TimestampInFuture);
    }

    #[test]
    fn rejects_low_fee() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100, MIN_TX_FEE_MICRO - 1, 1_000, 1);
        let err = validate_transaction(&tx, 1_000, Amount::from_micro(1_000_000), false, &store).unwrap_err();
        assert_eq!(err, PhnError::FeeTooLow { min: MIN_TX_FEE_MICRO, got: MIN_TX_FEE_MICRO - 1 });
    }

    #[test]
    fn rejects_insufficient_balance() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100, MIN_TX_FEE_MICRO, 1_000, 1);
        let err = validate_transaction(&tx, 1_000, Amount::ZERO, false, &store).unwrap_err();
        assert!(matches!(err, PhnError::InsufficientBalance { .. }));
    }

    #[test]
    fn replay_is_rejected_once_mined() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100, MIN_TX_FEE_MICRO, 1_000, 1);
        let balance = Amount::from_micro(1_000_000);
        validate_transaction(&tx, 1_000, balance, false, &store).unwrap();
        let err = validate_transaction(&tx, 1_000, balance, true, &store).unwrap_err();
        assert_eq!(err, PhnError::Replay(tx.txid.clone()));
    }

    #[test]
    fn previously_invalid_short_circuits() {
        let store = store();
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, &("PHN".to_string() + &"a".repeat(40)), 100, MIN_TX_FEE_MICRO - 1, 1_000, 1);
        let _ = validate_transaction(&tx, 1_000, Amount::from_micro(1_000_000), false, &store);
        let err = validate_transaction(&tx, 1_000, Amount::from_micro(1_000_000), false, &store).unwrap_err();
        assert!(matches!(err, PhnError::PreviouslyInvalid(_)));
    }
}
