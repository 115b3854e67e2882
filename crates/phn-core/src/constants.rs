//! ─── PHN Protocol Constants ──────────────────────────────────────────────────
//!
//! "One hash, one history."
//!
//! Base unit:  micro-PHN (1 PHN = 100_000_000 micro-PHN, 8 fractional digits)
//! Ticker:     PHN

// ── Supply ───────────────────────────────────────────────────────────────────

/// Fractional precision used by the canonical decimal encoding (§12 of the
/// full spec): amounts and fees are hashed/signed as strings with exactly
/// this many digits after the decimal point.
pub const AMOUNT_DECIMALS: u32 = 8;

/// Micro-PHN per whole PHN (10 ^ AMOUNT_DECIMALS).
pub const MICRO_PER_PHN: u64 = 100_000_000;

/// Fraction of total supply minted to the owner address in the genesis block.
pub const GENESIS_OWNER_SHARE_NUM: u64 = 10;
pub const GENESIS_OWNER_SHARE_DEN: u64 = 100;

// ── Proof-of-Work ─────────────────────────────────────────────────────────────

/// Default/seed difficulty: required count of leading ASCII '0' characters
/// in a block's hex-encoded hash.
pub const DEFAULT_DIFFICULTY: u8 = 3;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

// ── Reward schedule ───────────────────────────────────────────────────────────

/// Default starting block reward (50 PHN), overridable via `STARTING_BLOCK_REWARD`.
pub const DEFAULT_STARTING_BLOCK_REWARD_MICRO: u64 = 50 * MICRO_PER_PHN;

/// Height delta between halvings.
pub const HALVING_INTERVAL: u64 = 1_800_000;

/// Reward floor in micro-PHN (0.0001 PHN). See SPEC_FULL.md §9 resolution 2.
pub const MIN_BLOCK_REWARD_MICRO: u64 = 10_000;

// ── Transaction admission ─────────────────────────────────────────────────────

/// Minimum fee (micro-PHN) a user transaction must carry.
pub const MIN_TX_FEE_MICRO: u64 = 1_000; // 0.00001000 PHN

/// Transactions with a timestamp this far in the future are rejected.
pub const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Transactions older than this (relative to "now") are rejected.
pub const MAX_PAST_AGE_SECS: i64 = 3_600;

// ── Mempool ───────────────────────────────────────────────────────────────────

/// Maximum resident transaction count.
pub const MEMPOOL_CAPACITY: usize = 10_000;

/// Entries older than this are purged before `select_for_mining`.
pub const MEMPOOL_MAX_AGE_SECS: i64 = 3_600;

// ── Difficulty adjustment ─────────────────────────────────────────────────────

pub const TARGET_BLOCK_SECONDS: i64 = 60;
pub const DIFFICULTY_WINDOW_BLOCKS: u64 = 10;

/// Ratio thresholds that trigger a difficulty step (hysteresis band).
pub const DIFFICULTY_RATIO_DECREASE_ABOVE: f64 = 1.5;
pub const DIFFICULTY_RATIO_INCREASE_BELOW: f64 = 0.67;

// ── Checkpointing / reorg guard ───────────────────────────────────────────────

/// Height interval at which an immutable height→hash pin is recorded.
pub const CHECKPOINT_INTERVAL: u64 = 100;

/// A candidate chain cannot rewrite more tip blocks than this.
pub const MAX_REORG_DEPTH: u64 = 10;

// ── Peer health ────────────────────────────────────────────────────────────────

/// Consecutive failures before a peer transitions to `failed`.
pub const PEER_FAILURE_THRESHOLD: u32 = 3;

/// Consecutive no-adoption sync cycles before a partition warning is logged.
pub const MAX_SYNC_FAILURES: u32 = 5;

/// Interval between failed-peer recovery probes (seconds).
pub const PEER_RECOVERY_PROBE_SECS: u64 = 300;

/// Per-request timeout for peer chain fetches and block broadcasts (seconds).
pub const PEER_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const PEER_BROADCAST_TIMEOUT_SECS: u64 = 5;

// ── Sentinel identities ───────────────────────────────────────────────────────

pub const COINBASE_SENDER: &str = "coinbase";
pub const MINERS_POOL_SENDER: &str = "miners_pool";
pub const SYSTEM_SIGNATURE: &str = "genesis";

/// Prefix for every derived address.
pub const ADDRESS_PREFIX: &str = "PHN";

/// `"0"*64` — the `prev_hash` of the genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";
