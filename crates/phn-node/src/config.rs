use std::path::PathBuf;

use clap::Parser;
use phn_core::types::Amount;

/// Node configuration (spec.md §6's "Configuration" table), accepted as both
/// CLI flags and environment variables, mirroring the teacher's
/// `#[derive(Parser)] struct Args` idiom.
///
/// `difficulty`, `halving_interval`, and `min_tx_fee` are accepted for
/// operational visibility but are not threaded into the validation/reward
/// engine as runtime parameters — see DESIGN.md's "config vs. consensus
/// constants" note. `starting_block_reward` and `total_supply` ARE live
/// parameters: they shape the genesis coinbase and every subsequent reward.
#[derive(Parser, Debug)]
#[command(name = "phn-node", version, about = "PHN proof-of-work node")]
pub struct Args {
    /// Bind address for the HTTP/JSON transport.
    #[arg(long, env = "NODE_HOST", default_value = "0.0.0.0")]
    pub node_host: String,

    /// Bind port for the HTTP/JSON transport.
    #[arg(long, env = "NODE_PORT", default_value_t = 5000)]
    pub node_port: u16,

    /// Comma-separated initial peer URLs.
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Default/seed PoW difficulty (clamped to [1,10]); informational —
    /// actual difficulty always derives from `phn_consensus::difficulty_at`.
    #[arg(long, env = "DIFFICULTY", default_value_t = 3)]
    pub difficulty: u8,

    /// Initial block reward, in whole PHN.
    #[arg(long, env = "STARTING_BLOCK_REWARD", default_value_t = 50)]
    pub starting_block_reward: u64,

    /// Height delta between halvings; informational, see crate constant.
    #[arg(long, env = "HALVING_INTERVAL", default_value_t = 1_800_000)]
    pub halving_interval: u64,

    /// Floor on user-transaction fee, in whole PHN; informational, see
    /// crate constant.
    #[arg(long, env = "MIN_TX_FEE", default_value_t = 0)]
    pub min_tx_fee: u64,

    /// Total issuance, in whole PHN; 10% goes to the owner in genesis.
    #[arg(long, env = "TOTAL_SUPPLY", default_value_t = 1_000_000_000)]
    pub total_supply: u64,

    /// Path to the owner keypair+address file.
    #[arg(long, env = "OWNER_FILE", default_value = "owner.txt")]
    pub owner_file: PathBuf,

    /// Store directory (an embedded sled database, not LMDB — see
    /// DESIGN.md; the name is kept for operator familiarity with the
    /// original deployment).
    #[arg(long, env = "LMDB_DIR", default_value = "phn_data")]
    pub lmdb_dir: PathBuf,
}

impl Args {
    pub fn total_supply_amount(&self) -> Amount {
        Amount::from_micro(self.total_supply * phn_core::constants::MICRO_PER_PHN)
    }

    pub fn starting_reward_amount(&self) -> Amount {
        Amount::from_micro(self.starting_block_reward * phn_core::constants::MICRO_PER_PHN)
    }

    pub fn min_fee_amount(&self) -> Amount {
        if self.min_tx_fee == 0 {
            Amount::from_micro(phn_core::constants::MIN_TX_FEE_MICRO)
        } else {
            Amount::from_micro(self.min_tx_fee * phn_core::constants::MICRO_PER_PHN)
        }
    }
}

/// Expand a leading `~` to the user's home directory, matching the
/// teacher's `expand_tilde` helper.
pub fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
