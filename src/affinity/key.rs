use crate::cmd::CmdMerge;

/// Largest power of two less than or equal to `n`, minimum 1.
///
/// Smears the highest set bit into every lower position, then keeps only that bit.
#[must_use]
pub fn round_down_pow2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut n = n;
    n |= n >> 1;
    n |= n >> 2;
    n |= n >> 4;
    n |= n >> 8;
    n |= n >> 16;
    #[cfg(target_pointer_width = "64")]
    {
        n |= n >> 32;
    }
    n - (n >> 1)
}

/// Hardware parallelism rounded down to a power of two.
///
/// Falls back to 1 when the parallelism cannot be queried.
#[must_use]
pub fn available_processors_2n() -> usize {
    let processors = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    round_down_pow2(processors)
}

/// Stable 32-bit hash of a transport channel id.
///
/// Polynomial hash with multiplier 31 over the UTF-16 code units of the id, so
/// the value does not change between processes or releases and matches the
/// hash used by gateway servers that share channel ids with this process.
#[must_use]
pub fn channel_hash(channel_id: &str) -> i32 {
    channel_id
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Affinity key for one request.
///
/// Preference order: `actor_id` when non-zero, then the absolute channel hash,
/// then the route key. Anonymous requests without a channel therefore land on
/// the same executor for a given route.
#[must_use]
pub fn affinity_key(actor_id: i64, channel_id: Option<&str>, cmd_merge: CmdMerge) -> i64 {
    if actor_id != 0 {
        return actor_id;
    }
    match channel_id {
        Some(channel_id) => i64::from(channel_hash(channel_id).wrapping_abs()),
        None => i64::from(cmd_merge.value()),
    }
}
