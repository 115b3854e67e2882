//! The Node Facade and its HTTP/JSON transport (spec.md §4.9, §6).

pub mod facade;
pub mod rate_limit;
pub mod server;
pub mod wire;

pub use facade::{MiningInfo, NodeHandle, NodeParams, SubmitBlockOutcome, SubmitTxOutcome, TokenInfo, TxLookup};
pub use rate_limit::RateLimiters;
pub use server::{router, AppState};
