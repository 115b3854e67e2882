//! Fee-priority transaction pool (spec.md §4.5, C5).

pub mod mempool;

pub use mempool::{Mempool, MempoolStats};
