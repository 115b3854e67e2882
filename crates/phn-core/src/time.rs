use crate::types::Timestamp;

/// Wall-clock seconds since the Unix epoch, as the fixed [`Timestamp`] type
/// used throughout transaction/block validation (spec.md §3).
pub fn now_unix() -> Timestamp {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_unix_is_plausible() {
        // Any time after this crate was written.
        assert!(now_unix() > 1_700_000_000);
    }
}
