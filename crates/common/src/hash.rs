//! Deterministic integer hashing used to key per-position randomness.

/// One splitmix64 step: a fast, well-distributed 64-bit mixer.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Stable 64-bit hash of an integer world position and a session seed.
///
/// Pure function of its inputs on every platform, unlike `std`'s randomly
/// keyed `DefaultHasher`.
pub fn mix_position(x: i64, seed: i64) -> u64 {
    splitmix64(splitmix64(x as u64) ^ (seed as u64).rotate_left(32))
}
