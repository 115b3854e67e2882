pub mod block;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod time;
pub mod transaction;
pub mod types;
pub mod validation;

pub use block::Block;
pub use constants::*;
pub use error::PhnError;
pub use time::now_unix;
pub use transaction::{Sender, Transaction};
pub use types::{Address, Amount, Height, Timestamp, TxId};
pub use validation::{ValidationRecord, ValidationStatus};
