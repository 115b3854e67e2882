//! Per-client-IP token-bucket limiting for write endpoints and hot reads
//! (spec.md §4.9's "advisory, non-consensus-critical" policy). Quotas mirror
//! the original per-route allowances: `send_tx` 10/min, `submit_block`
//! 20/min, `get_balance` 50/min, everything else 100/min.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

fn per_minute(n: u32) -> Arc<IpRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(n).expect("quota is non-zero"));
    Arc::new(RateLimiter::keyed(quota))
}

/// The fixed set of per-route limiters a node starts up with.
pub struct RateLimiters {
    pub send_tx: Arc<IpRateLimiter>,
    pub submit_block: Arc<IpRateLimiter>,
    pub get_balance: Arc<IpRateLimiter>,
    pub default: Arc<IpRateLimiter>,
}

impl RateLimiters {
    pub fn new() -> Self {
        Self {
            send_tx: per_minute(10),
            submit_block: per_minute(20),
            get_balance: per_minute(50),
            default: per_minute(100),
        }
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` if `ip` is still within `limiter`'s quota.
pub fn allow(limiter: &IpRateLimiter, ip: IpAddr) -> bool {
    limiter.check_key(&ip).is_ok()
}
