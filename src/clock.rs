// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::prelude::*;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

/// Default epoch: 2021-01-01T00:00:00Z, in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH: i64 = 1_609_459_200_000;

/// A source of wall-clock time.
///
/// Implementations return milliseconds since the Unix epoch and must be cheap
/// to call repeatedly, since the generator polls the clock while waiting for
/// the next millisecond.
///
/// Any `Fn() -> i64 + Send + Sync` closure is a `Clock`:
///
/// ```
/// use snow_uuid::Clock;
///
/// let fixed = || 1_609_459_200_123_i64;
/// assert_eq!(fixed.now_millis(), 1_609_459_200_123);
/// ```
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now_millis(&self) -> i64 {
        self()
    }
}

/// The system wall clock, read through `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and hand the
/// other to a generator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self(Arc::new(AtomicI64::new(millis)))
    }

    /// Set the current reading.
    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    /// Move the reading by `delta` milliseconds, which may be negative.
    pub fn advance(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_default_epoch() {
        let now = SystemClock.now_millis();
        assert!(now > DEFAULT_EPOCH);
        // 2100-01-01
        assert!(now < 4_102_444_800_000);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1000);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now_millis(), 1005);
        handle.set(999);
        assert_eq!(clock.now_millis(), 999);
        handle.advance(-9);
        assert_eq!(clock.now_millis(), 990);
    }

    #[test]
    fn default_epoch_is_2021() {
        let epoch = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(epoch.timestamp_millis(), DEFAULT_EPOCH);
    }
}
