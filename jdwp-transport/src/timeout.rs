// Timeout conventions shared by attach, accept and the handshake
//
// Duration::ZERO means wait indefinitely.

use std::time::Duration;

/// Longest wait honoured, about 25 days
pub const MAX_WAIT: Duration = Duration::from_millis(i32::MAX as u64);

/// Convert signed milliseconds, where zero or negative means no limit
pub fn from_millis(ms: i64) -> Duration {
    if ms <= 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(ms as u64)
    }
}

/// The bounded wait to apply, or `None` to wait indefinitely
pub fn effective(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() {
        None
    } else {
        Some(timeout.min(MAX_WAIT))
    }
}
