use std::fs;
use std::io::Write;
use std::path::Path;

use phn_core::error::PhnError;
use phn_core::types::Address;
use phn_crypto::KeyPair;
use tracing::info;

fn storage_error(e: impl std::fmt::Display) -> PhnError {
    PhnError::Storage(e.to_string())
}

/// The node's owner identity (SPEC_FULL.md §11): the account genesis mints
/// 10% of `TOTAL_SUPPLY` to.
pub struct OwnerWallet {
    pub address: Address,
    pub keypair: KeyPair,
}

/// `load_owner_address`/`generate_owner_wallet` (SPEC_FULL.md §11): load the
/// owner wallet from `OWNER_FILE`, generating and persisting a fresh one on
/// first run. File format is three newline-separated lines: address,
/// private key hex, public key hex.
pub fn load_or_generate_owner_wallet(path: &Path) -> Result<OwnerWallet, PhnError> {
    if path.exists() {
        load_owner_wallet(path)
    } else {
        generate_owner_wallet(path)
    }
}

pub fn load_owner_wallet(path: &Path) -> Result<OwnerWallet, PhnError> {
    let contents = fs::read_to_string(path).map_err(storage_error)?;
    let mut lines = contents.lines();
    let address =
        lines.next().ok_or_else(|| PhnError::Other("owner file missing address line".to_string()))?;
    let secret_hex = lines
        .next()
        .ok_or_else(|| PhnError::Other("owner file missing private key line".to_string()))?;

    let secret_bytes = hex::decode(secret_hex.trim())
        .map_err(|e| PhnError::Other(format!("invalid owner private key hex: {e}")))?;
    let secret: [u8; 32] = secret_bytes
        .try_into()
        .map_err(|_| PhnError::Other("owner private key must be 32 bytes".to_string()))?;
    let keypair = KeyPair::from_secret_bytes(secret)?;

    if keypair.address().as_str() != address.trim() {
        return Err(PhnError::Other("owner file address does not match its private key".to_string()));
    }

    info!(address = %keypair.address(), "loaded existing owner wallet");
    Ok(OwnerWallet { address: keypair.address().clone(), keypair })
}

pub fn generate_owner_wallet(path: &Path) -> Result<OwnerWallet, PhnError> {
    let keypair = KeyPair::generate();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }
    }
    let contents = format!("{}\n{}\n{}\n", keypair.address(), keypair.secret_hex(), keypair.public_hex());
    let mut file = fs::File::create(path).map_err(storage_error)?;
    file.write_all(contents.as_bytes()).map_err(storage_error)?;

    info!(address = %keypair.address(), path = %path.display(), "generated new owner wallet");
    Ok(OwnerWallet { address: keypair.address().clone(), keypair })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_and_reloads_the_same_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owner.txt");

        let generated = generate_owner_wallet(&path).unwrap();
        let reloaded = load_owner_wallet(&path).unwrap();

        assert_eq!(generated.address, reloaded.address);
        assert_eq!(generated.keypair.secret_hex(), reloaded.keypair.secret_hex());
    }

    #[test]
    fn load_or_generate_creates_file_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owner.txt");
        assert!(!path.exists());

        let first = load_or_generate_owner_wallet(&path).unwrap();
        assert!(path.exists());

        let second = load_or_generate_owner_wallet(&path).unwrap();
        assert_eq!(first.address, second.address);
    }

    #[test]
    fn rejects_a_tampered_address_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owner.txt");
        generate_owner_wallet(&path).unwrap();

        let mut contents = fs::read_to_string(&path).unwrap();
        contents.replace_range(0..3, "XXX");
        fs::write(&path, contents).unwrap();

        assert!(load_owner_wallet(&path).is_err());
    }
}
