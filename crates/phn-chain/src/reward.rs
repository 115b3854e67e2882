use phn_core::constants::{HALVING_INTERVAL, MIN_BLOCK_REWARD_MICRO};
use phn_core::types::{Amount, Height};

/// `block_reward(height)` (spec.md §4.4): `STARTING_REWARD / 2^halvings`,
/// floored at [`MIN_BLOCK_REWARD_MICRO`], where
/// `halvings = height / HALVING_INTERVAL`.
///
/// This is the height-based variant pinned by SPEC_FULL.md §9 resolution 1 —
/// the source's alternate cumulative-mined-amount variant is not implemented.
pub fn block_reward(height: Height, starting_reward: Amount) -> Amount {
    let halvings = (height / HALVING_INTERVAL).min(63) as u32;
    let halved = starting_reward.micro() >> halvings;
    Amount::from_micro(halved.max(MIN_BLOCK_REWARD_MICRO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starting() -> Amount {
        Amount::from_micro(50 * phn_core::constants::MICRO_PER_PHN)
    }

    #[test]
    fn no_halvings_below_interval() {
        assert_eq!(block_reward(0, starting()), starting());
        assert_eq!(block_reward(HALVING_INTERVAL - 1, starting()), starting());
    }

    #[test]
    fn halves_at_interval_boundary() {
        let reward = block_reward(HALVING_INTERVAL, starting());
        assert_eq!(reward.micro(), starting().micro() / 2);
    }

    #[test]
    fn floors_at_minimum_reward() {
        let reward = block_reward(HALVING_INTERVAL * 40, starting());
        assert_eq!(reward.micro(), MIN_BLOCK_REWARD_MICRO);
    }
}
