//! Retry delays for transient transport failures.

use std::time::Duration;

/// Upper bound on any single retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (zero-based).
///
/// Formula: min(30s, base * 2^attempt) + random(0..=base)
///
/// The jitter keeps many clients that failed together from retrying in
/// lockstep.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(16));
    let exp = base.saturating_mul(factor).min(MAX_RETRY_DELAY);
    exp + jitter(base)
}

fn jitter(base: Duration) -> Duration {
    let span = base.as_millis() as u64;
    if span == 0 {
        return Duration::ZERO;
    }
    let mut bytes = [0u8; 8];
    // No entropy means no jitter, never a failed retry.
    if getrandom::getrandom(&mut bytes).is_err() {
        return Duration::ZERO;
    }
    Duration::from_millis(u64::from_le_bytes(bytes) % (span + 1))
}
