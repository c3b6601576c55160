// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::Builder;
use crate::clock::Clock;
use crate::error::*;
use crate::layout::BitLayout;
use chrono::prelude::*;
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

/// Internals of SnowUuid.
/// This struct is not exposed to the public.
#[derive(Debug)]
pub(crate) struct Internals {
    /// Unix milliseconds of the last issued id, `None` until the first one.
    pub(crate) last_timestamp: Option<i64>,
    pub(crate) sequence: u64,
}

/// SharedSnowUuid is shared between SnowUuid instances.
/// This struct is not exposed to the public.
pub(crate) struct SharedSnowUuid {
    pub(crate) epoch: i64,
    pub(crate) worker_id: u64,
    pub(crate) datacenter_id: u64,
    pub(crate) layout: BitLayout,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) internals: Mutex<Internals>,
}

/// SnowUuid is a 64-bit unique ID generator.
/// It is thread-safe and can be cloned to be used in multiple threads.
pub struct SnowUuid(pub(crate) Arc<SharedSnowUuid>);

impl SnowUuid {
    /// Create a new SnowUuid with the default configuration.
    /// For custom configuration see [`builder`].
    ///
    /// [`builder`]: struct.SnowUuid.html#method.builder
    pub fn new() -> Result<Self, Error> {
        Builder::new().finalize()
    }

    /// Create a new [`Builder`] to construct a SnowUuid.
    ///
    /// [`Builder`]: struct.Builder.html
    pub fn builder<'a>() -> Builder<'a> {
        Builder::new()
    }

    pub(crate) fn new_inner(shared: Arc<SharedSnowUuid>) -> Self {
        Self(shared)
    }

    /// Generate the next unique id.
    ///
    /// Fails with [`Error::ClockMovedBackwards`] when the clock reads earlier
    /// than the last issued id; the generator state is left as it was, so a
    /// later call with a recovered clock carries on normally. When the
    /// sequence is exhausted within one millisecond the call spins until the
    /// clock moves on.
    pub fn next_id(&self) -> Result<u64, Error> {
        let shared = &self.0;
        let mut internals = shared.internals.lock().map_err(|_| Error::MutexPoisoned)?;

        let mut timestamp = shared.clock.now_millis();
        match internals.last_timestamp {
            Some(last) if timestamp < last => {
                let millis = last.abs_diff(timestamp);
                warn!(last, timestamp, millis, "clock moved backwards");
                return Err(Error::ClockMovedBackwards { millis });
            }
            Some(last) if timestamp == last => {
                internals.sequence = (internals.sequence + 1) & shared.layout.sequence_mask();
                if internals.sequence == 0 {
                    trace!(last, "sequence exhausted, waiting for next millisecond");
                    timestamp = spin_until_next_millis(shared.clock.as_ref(), last);
                }
            }
            _ => internals.sequence = 0,
        }
        internals.last_timestamp = Some(timestamp);

        let elapsed = timestamp.wrapping_sub(shared.epoch) as u64;
        Ok(shared.layout.compose(
            elapsed,
            shared.datacenter_id,
            shared.worker_id,
            internals.sequence,
        ))
    }

    /// Break an id produced by this generator up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        DecomposedId::decompose(id, &self.0.layout)
    }

    /// The epoch in milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.epoch
    }

    pub fn worker_id(&self) -> u64 {
        self.0.worker_id
    }

    pub fn datacenter_id(&self) -> u64 {
        self.0.datacenter_id
    }

    pub fn layout(&self) -> BitLayout {
        self.0.layout
    }
}

/// Returns a new `SnowUuid` referencing the same state as `self`.
/// This is used for concurrent use.
impl Clone for SnowUuid {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Poll `clock` without sleeping until it reads past `last`.
fn spin_until_next_millis(clock: &dyn Clock, last: i64) -> i64 {
    loop {
        let now = clock.now_millis();
        if now > last {
            trace!(now, "clock advanced");
            return now;
        }
        std::hint::spin_loop();
    }
}

/// DecomposedId is the parts of an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposedId {
    pub id: u64,
    pub msb: u64,
    /// Milliseconds since the generator's epoch.
    pub time: u64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl DecomposedId {
    /// Break an id up into its parts according to `layout`.
    pub fn decompose(id: u64, layout: &BitLayout) -> Self {
        Self {
            id,
            msb: id >> 63,
            time: (id >> layout.time_shift()) & layout.time_mask(),
            datacenter_id: (id >> layout.datacenter_shift()) & layout.max_datacenter_id(),
            worker_id: (id >> layout.worker_shift()) & layout.max_worker_id(),
            sequence: id & layout.sequence_mask(),
        }
    }

    /// Milliseconds since the Unix epoch, given the generator's epoch.
    /// `None` if the sum does not fit in an `i64`.
    pub fn unix_millis(&self, epoch: i64) -> Option<i64> {
        i64::try_from(self.time)
            .ok()
            .and_then(|time| epoch.checked_add(time))
    }

    /// The creation time, given the generator's epoch.
    pub fn datetime(&self, epoch: i64) -> Option<DateTime<Utc>> {
        self.unix_millis(epoch)
            .and_then(DateTime::from_timestamp_millis)
    }
}
