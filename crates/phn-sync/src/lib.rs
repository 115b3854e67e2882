//! Peer chain synchronization (spec.md §4.8, C8): fetching and adopting
//! longer valid chains, broadcasting newly mined blocks, and tracking peer
//! health with recovery probing.

pub mod client;
pub mod config;
pub mod health;
pub mod sync;
pub mod wire;

pub use config::SyncConfig;
pub use health::{PeerHealth, PeerHealthMap, PeerStatus};
pub use sync::PeerSync;
