//! Proof-of-work predicate (spec.md §3 "PoW invariant" / §4.4 block validation).
//!
//! A block's hash is a lowercase hex SHA-256 digest; PoW is satisfied when the
//! hash begins with at least `difficulty` ASCII `'0'` characters — a count of
//! leading zero hex *characters*, not zero bits.

/// Count of leading ASCII `'0'` characters in a hex hash string.
pub fn leading_zero_hex_chars(hash_hex: &str) -> u8 {
    hash_hex.chars().take_while(|&c| c == '0').count() as u8
}

/// True iff `hash_hex` begins with at least `difficulty` `'0'` characters.
pub fn meets_difficulty(hash_hex: &str, difficulty: u8) -> bool {
    leading_zero_hex_chars(hash_hex) >= difficulty
}
