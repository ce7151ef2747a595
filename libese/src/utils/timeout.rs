//! Block waiting time helpers.

use std::time::Duration;

/// Default block waiting time in milliseconds. Matches the worst-case BWT of
/// common NXP secure elements (BWI 4 at 13.56 MHz plus margin).
pub const DEFAULT_BWT_MS: u64 = 1624;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default BWT as Duration.
pub fn default_bwt() -> Duration {
    ms(DEFAULT_BWT_MS)
}

/// Receive timeout for one leg: BWT scaled by the pending WTX multiplier.
/// A multiplier of zero is treated as one.
pub fn scaled_bwt(bwt: Duration, multiplier: u8) -> Duration {
    bwt.saturating_mul(u32::from(multiplier.max(1)))
}
