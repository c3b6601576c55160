// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::Error;

/// bit length of time
pub const BIT_LEN_TIME: u8 = 41;
/// bit length of datacenter id
pub const BIT_LEN_DATACENTER_ID: u8 = 5;
/// bit length of worker id
pub const BIT_LEN_WORKER_ID: u8 = 5;
/// bit length of sequence number
pub const BIT_LEN_SEQUENCE: u8 = 12;

/// Widest id field a layout may declare.
const MAX_BIT_LEN_ID: u8 = 16;

/// Bit widths of the four fields of an id, most significant first:
///
/// ```text
/// [1 sign][time][datacenter][worker][sequence]
/// ```
///
/// The widths always add up to 63 once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    pub time: u8,
    pub datacenter: u8,
    pub worker: u8,
    pub sequence: u8,
}

impl Default for BitLayout {
    fn default() -> Self {
        Self {
            time: BIT_LEN_TIME,
            datacenter: BIT_LEN_DATACENTER_ID,
            worker: BIT_LEN_WORKER_ID,
            sequence: BIT_LEN_SEQUENCE,
        }
    }
}

impl BitLayout {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let total = u16::from(self.time)
            + u16::from(self.sequence)
            + u16::from(self.datacenter)
            + u16::from(self.worker);
        if total != 63 || self.worker > MAX_BIT_LEN_ID || self.datacenter > MAX_BIT_LEN_ID {
            return Err(Error::InvalidBitLength(
                self.time,
                self.sequence,
                self.datacenter,
                self.worker,
            ));
        }
        Ok(())
    }

    /// Largest worker id this layout can hold.
    pub fn max_worker_id(&self) -> u64 {
        mask(self.worker)
    }

    /// Largest datacenter id this layout can hold.
    pub fn max_datacenter_id(&self) -> u64 {
        mask(self.datacenter)
    }

    pub fn sequence_mask(&self) -> u64 {
        mask(self.sequence)
    }

    pub fn time_mask(&self) -> u64 {
        mask(self.time)
    }

    pub fn worker_shift(&self) -> u8 {
        self.sequence
    }

    pub fn datacenter_shift(&self) -> u8 {
        self.sequence + self.worker
    }

    pub fn time_shift(&self) -> u8 {
        self.sequence + self.worker + self.datacenter
    }

    /// Pack the four fields into an id.
    ///
    /// `elapsed` is not masked: a delta wider than the time field spills into
    /// the sign bit rather than being truncated.
    pub fn compose(&self, elapsed: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> u64 {
        (elapsed << self.time_shift())
            | (datacenter_id << self.datacenter_shift())
            | (worker_id << self.worker_shift())
            | sequence
    }
}

/// All-ones mask `bits` wide.
fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let layout = BitLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.max_worker_id(), 31);
        assert_eq!(layout.max_datacenter_id(), 31);
        assert_eq!(layout.sequence_mask(), 4095);
        assert_eq!(layout.worker_shift(), 12);
        assert_eq!(layout.datacenter_shift(), 17);
        assert_eq!(layout.time_shift(), 22);
    }

    #[test]
    fn compose_places_fields() {
        let layout = BitLayout::default();
        assert_eq!(layout.compose(123, 0, 0, 0), 515_899_392);
        assert_eq!(layout.compose(0, 1, 0, 0), 1 << 17);
        assert_eq!(layout.compose(0, 0, 1, 0), 1 << 12);
        assert_eq!(layout.compose(0, 0, 0, 4095), 4095);
    }

    #[test]
    fn compose_does_not_truncate_time() {
        let layout = BitLayout::default();
        let id = layout.compose(1 << 41, 0, 0, 0);
        assert_eq!(id, 1 << 63);
    }

    #[test]
    fn invalid_layouts() {
        let short = BitLayout {
            time: 40,
            ..BitLayout::default()
        };
        assert!(matches!(
            short.validate(),
            Err(Error::InvalidBitLength(40, 12, 5, 5))
        ));

        let wide_worker = BitLayout {
            time: 20,
            datacenter: 5,
            worker: 26,
            sequence: 12,
        };
        assert!(wide_worker.validate().is_err());
    }
}
