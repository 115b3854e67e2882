//! Genesis state construction (spec.md §3 "chain[0]", SPEC_FULL.md §11): the
//! owner wallet bootstrap and the single coinbase-to-owner genesis block.

pub mod genesis;
pub mod owner;

pub use genesis::{build_genesis_block, genesis_validation_record};
pub use owner::{generate_owner_wallet, load_or_generate_owner_wallet, load_owner_wallet, OwnerWallet};
