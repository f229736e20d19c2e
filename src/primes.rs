//! Bucket-count growth sequence.
//!
//! Bucket counts are always drawn from a fixed ascending list of primes so
//! that `hash % bucket_count` spreads keys better than a power-of-two mask.

/// Ascending prime bucket counts, each roughly double the previous one.
pub const PRIME_LIST: [usize; 28] = [
    53,
    97,
    193,
    389,
    769,
    1_543,
    3_079,
    6_151,
    12_289,
    24_593,
    49_157,
    98_317,
    196_613,
    393_241,
    786_433,
    1_572_869,
    3_145_739,
    6_291_469,
    12_582_917,
    25_165_843,
    50_331_653,
    100_663_319,
    201_326_611,
    402_653_189,
    805_306_457,
    1_610_612_741,
    3_221_225_473,
    4_294_967_291,
];

/// Smallest bucket count a table ever has.
pub const MIN_BUCKETS: usize = PRIME_LIST[0];

/// Practical ceiling on the bucket count.
pub const MAX_BUCKETS: usize = PRIME_LIST[PRIME_LIST.len() - 1];

/// Smallest prime in [`PRIME_LIST`] not less than `hint`, clamped to
/// [`MAX_BUCKETS`].
pub fn next_prime(hint: usize) -> usize {
    let i = PRIME_LIST.partition_point(|&p| p < hint);
    match PRIME_LIST.get(i) {
        Some(&p) => p,
        None => {
            log::warn!(
                "bucket hint {} exceeds largest prime, clamping to {}",
                hint,
                MAX_BUCKETS
            );
            MAX_BUCKETS
        }
    }
}

/// True if `n` is one of the configured bucket counts.
pub fn is_bucket_count(n: usize) -> bool {
    PRIME_LIST.binary_search(&n).is_ok()
}
