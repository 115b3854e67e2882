use rand::rngs::OsRng;
use secp256k1::{Message, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use phn_core::error::PhnError;
use phn_core::types::Address;

use crate::hash::sha256;

/// A PHN keypair: a secp256k1 private key, its public key, and the derived
/// address. The private key is held in a [`Zeroizing`] buffer so it is wiped
/// on drop.
pub struct KeyPair {
    secret: Zeroizing<[u8; 32]>,
    public_hex: String,
    address: Address,
}

impl KeyPair {
    /// `generate_keypair` (spec.md §4.2): a fresh secp256k1 keypair and its
    /// derived address.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut rng = OsRng;
        let (secret_key, public_key) = secp.generate_keypair(&mut rng);
        let public_hex = public_key_hex(&public_key);
        let address = address_of(&public_hex).expect("freshly derived public key hex is well-formed");
        Self {
            secret: Zeroizing::new(secret_key.secret_bytes()),
            public_hex,
            address,
        }
    }

    /// Restore a keypair from a raw 32-byte secret key.
    pub fn from_secret_bytes(secret: [u8; 32]) -> Result<Self, PhnError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&secret)
            .map_err(|e| PhnError::Other(format!("invalid secret key: {e}")))?;
        let public_key = secret_key.public_key(&secp);
        let public_hex = public_key_hex(&public_key);
        let address = address_of(&public_hex)?;
        Ok(Self {
            secret: Zeroizing::new(secret),
            public_hex,
            address,
        })
    }

    pub fn public_hex(&self) -> &str {
        &self.public_hex
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(&*self.secret)
    }

    /// `sign` (spec.md §4.2): sign the canonical signing-bytes preimage of a
    /// transaction (`phn_core::encoding::transaction_signing_bytes`).
    pub fn sign(&self, message_bytes: &[u8]) -> Result<String, PhnError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&*self.secret)
            .map_err(|e| PhnError::Other(format!("invalid secret key: {e}")))?;
        let digest = sha256(message_bytes);
        let message = Message::from_digest(digest);
        let sig = secp.sign_ecdsa(&message, &secret_key);
        Ok(hex::encode(sig.serialize_compact()))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address).finish()
    }
}

fn public_key_hex(public_key: &secp256k1::PublicKey) -> String {
    // Uncompressed point minus the leading 0x04 tag byte: 64 bytes → 128 hex
    // chars, matching spec.md §3's "128 hex chars" sender shape.
    hex::encode(&public_key.serialize_uncompressed()[1..])
}

/// `address_of` (spec.md §4.2): `"PHN" ‖ hex(SHA-256(public_bytes))[:40]`.
pub fn address_of(public_hex: &str) -> Result<Address, PhnError> {
    let public_bytes = hex::decode(public_hex)
        .map_err(|e| PhnError::Other(format!("invalid public key hex: {e}")))?;
    let digest_hex = hex::encode(sha256(&public_bytes));
    Ok(Address(format!(
        "{}{}",
        phn_core::constants::ADDRESS_PREFIX,
        &digest_hex[..40]
    )))
}

/// `verify` (spec.md §4.2): verify an ECDSA signature over `message_bytes`
/// against a hex-encoded secp256k1 public key.
pub fn verify(public_hex: &str, signature_hex: &str, message_bytes: &[u8]) -> bool {
    let Ok(public_bytes) = hex::decode(public_hex) else {
        return false;
    };
    // Re-attach the uncompressed-point tag byte that `public_key_hex` strips.
    let mut uncompressed = Vec::with_capacity(65);
    uncompressed.push(0x04);
    uncompressed.extend_from_slice(&public_bytes);
    let Ok(public_key) = secp256k1::PublicKey::from_slice(&uncompressed) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig) = secp256k1::ecdsa::Signature::from_compact(&sig_bytes) else {
        return false;
    };
    let digest = sha256(message_bytes);
    let Ok(message) = Message::from_digest_slice(&digest) else {
        return false;
    };
    let secp = Secp256k1::new();
    secp.verify_ecdsa(&message, &sig, &public_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = KeyPair::generate();
        let msg = b"transfer 100 PHN";
        let sig = kp.sign(msg).unwrap();
        assert!(verify(kp.public_hex(), &sig, msg));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"original").unwrap();
        assert!(!verify(kp.public_hex(), &sig, b"tampered"));
    }

    #[test]
    fn address_has_expected_shape() {
        let kp = KeyPair::generate();
        assert!(Address::looks_like_address(kp.address().as_str()));
    }
}
