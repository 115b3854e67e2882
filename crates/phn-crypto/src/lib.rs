pub mod hash;
pub mod keypair;
pub mod pow;

pub use hash::{compute_txid, hash_block, sha256, sha256_hex};
pub use keypair::{address_of, verify, KeyPair};
pub use pow::{leading_zero_hex_chars, meets_difficulty};
