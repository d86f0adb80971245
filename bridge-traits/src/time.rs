//! Time Abstraction
//!
//! Provides an injectable time source for deterministic testing.

use chrono::{DateTime, Utc};

/// Time source trait
///
/// Abstracts system time so expiry arithmetic can be tested with a
/// controlled clock.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn seconds_left(clock: &dyn Clock, expires_at: i64) -> i64 {
///     expires_at - clock.unix_timestamp()
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now = clock.now();
        let timestamp = clock.unix_timestamp();

        assert!(timestamp > 0);
        assert!(now.timestamp() == timestamp);
    }
}
