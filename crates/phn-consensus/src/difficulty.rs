use phn_core::block::Block;
use phn_core::constants::{
    DEFAULT_DIFFICULTY, DIFFICULTY_RATIO_DECREASE_ABOVE, DIFFICULTY_RATIO_INCREASE_BELOW,
    DIFFICULTY_WINDOW_BLOCKS, MAX_DIFFICULTY, MIN_DIFFICULTY, TARGET_BLOCK_SECONDS,
};
use phn_crypto::pow::leading_zero_hex_chars;

/// The PoW difficulty applicable to a candidate block appended after `chain`
/// (spec.md §4.6). `chain` is the chain state *without* the candidate — the
/// candidate's height is `chain.len()`.
pub fn difficulty_at(chain: &[Block]) -> u8 {
    let height = chain.len() as u64;

    if height <= 1 {
        return DEFAULT_DIFFICULTY;
    }

    if height < DIFFICULTY_WINDOW_BLOCKS || height % DIFFICULTY_WINDOW_BLOCKS != 0 {
        let last = &chain[chain.len() - 1];
        return leading_zero_hex_chars(&last.hash).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    }

    let last_ts = chain[chain.len() - 1].timestamp;
    let window_start_ts = chain[chain.len() - DIFFICULTY_WINDOW_BLOCKS as usize].timestamp;
    let elapsed = (last_ts - window_start_ts).max(1);
    let expected = TARGET_BLOCK_SECONDS * DIFFICULTY_WINDOW_BLOCKS as i64;
    let ratio = expected as f64 / elapsed as f64;

    // The difficulty that produced the current tip — the adjustment step is
    // relative to it, not an independently tracked register.
    let prev_d = difficulty_at(&chain[..chain.len() - 1]);

    let new_d = if ratio > DIFFICULTY_RATIO_DECREASE_ABOVE {
        prev_d.saturating_sub(1)
    } else if ratio < DIFFICULTY_RATIO_INCREASE_BELOW {
        prev_d.saturating_add(1)
    } else {
        prev_d
    };

    new_d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
