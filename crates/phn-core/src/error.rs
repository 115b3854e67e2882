use thiserror::Error;

/// Errors raised by the chain state machine, organized the way the rest of
/// the POUV checklist is organized: one variant per rejection reason, each
/// carrying whatever context a caller needs to report it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhnError {
    // ── Transaction validation (POUV) ────────────────────────────────────────
    #[error("transaction already validated and present in the chain: {0}")]
    Replay(String),

    #[error("transaction previously marked invalid: {0}")]
    PreviouslyInvalid(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("timestamp is too far in the future")]
    TimestampInFuture,

    #[error("timestamp is too old")]
    TimestampTooOld,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("txid must be 64 lowercase hex characters")]
    MalformedTxId,

    #[error("amount must be strictly positive")]
    ZeroAmount,

    #[error("fee {got} below minimum {min}")]
    FeeTooLow { min: u64, got: u64 },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u64, have: u64 },

    // ── Block validation ──────────────────────────────────────────────────────
    #[error("block index {got} does not follow chain tip {expected}")]
    WrongIndex { expected: u64, got: u64 },

    #[error("block prev_hash does not match chain tip")]
    WrongPrevHash,

    #[error("block hash does not match its canonical encoding")]
    HashMismatch,

    #[error("block hash does not meet difficulty {required}")]
    InsufficientPoW { required: u8 },

    #[error("block must contain exactly one coinbase transaction, found {0}")]
    CoinbaseCount(usize),

    #[error("coinbase amount {got} does not match expected reward {expected}")]
    CoinbaseAmountMismatch { expected: u64, got: u64 },

    #[error("duplicate txid within block: {0}")]
    DuplicateTxId(String),

    #[error("transaction {txid} rejected: {reason}")]
    EmbeddedTransactionInvalid { txid: String, reason: String },

    #[error("block carries {got} miners_pool payouts, expected exactly {expected}")]
    FeePayoutCount { expected: usize, got: usize },

    #[error("miners_pool payout {got} does not match collected fees {expected}")]
    FeePayoutMismatch { expected: u64, got: u64 },

    #[error("miners_pool payout recipient must be the block's coinbase recipient")]
    FeePayoutWrongRecipient,

    // ── Chain-level ───────────────────────────────────────────────────────────
    #[error("candidate chain disagrees with checkpoint at height {height}")]
    CheckpointViolation { height: u64 },

    #[error("candidate chain would reorganize {depth} blocks, exceeding the maximum of {max}")]
    ReorgTooDeep { depth: u64, max: u64 },

    // ── Mempool ───────────────────────────────────────────────────────────────
    #[error("mempool full and no lower-fee entry to evict")]
    MempoolFull,

    #[error("transaction already present in mempool: {0}")]
    DuplicateInMempool(String),

    // ── Lookup ────────────────────────────────────────────────────────────────
    #[error("not found: {0}")]
    NotFound(String),

    // ── Peer sync ─────────────────────────────────────────────────────────────
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    #[error("peer returned an invalid chain: {0}")]
    PeerReturnedInvalid(String),

    // ── Storage ───────────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl PhnError {
    /// HTTP status category per SPEC_FULL.md §7 / spec.md §7.
    pub fn status_category(&self) -> &'static str {
        match self {
            PhnError::NotFound(_) => "not_found",
            PhnError::Storage(_) => "internal",
            _ => "invalid",
        }
    }
}
