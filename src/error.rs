// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error as StdError;
use thiserror::Error;

/// Convenience type alias for usage within snow_uuid.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// The error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("worker_id {value} is out of range, must be between 0 and {max}")]
    WorkerIdOutOfRange { value: i64, max: u64 },
    #[error("datacenter_id {value} is out of range, must be between 0 and {max}")]
    DatacenterIdOutOfRange { value: i64, max: u64 },
    #[error("check_worker_id returned false")]
    CheckWorkerIdFailed,
    #[error("check_datacenter_id returned false")]
    CheckDatacenterIdFailed,
    #[error(
        "invalid bit length configuration: time({0}) + sequence({1}) + datacenter({2}) + worker({3}) must be 63, ids at most 16 bits"
    )]
    InvalidBitLength(u8, u8, u8, u8),
    #[error("{elapsed} ms since the epoch does not fit in a {bits}-bit time field")]
    OverTimeLimit { elapsed: u64, bits: u8 },
    #[cfg(feature = "ip-fallback")]
    #[error("could not find any private ipv4 address")]
    NoPrivateIPv4,
    #[error("clock moved backwards, refusing to generate id for {millis} milliseconds")]
    ClockMovedBackwards { millis: u64 },
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
}

impl Error {
    /// Returns `true` for errors raised while building a generator.
    ///
    /// These are not retryable: the configuration has to be fixed.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::WorkerIdOutOfRange { .. }
            | Error::DatacenterIdOutOfRange { .. }
            | Error::CheckWorkerIdFailed
            | Error::CheckDatacenterIdFailed
            | Error::InvalidBitLength(..)
            | Error::OverTimeLimit { .. } => true,
            #[cfg(feature = "ip-fallback")]
            Error::NoPrivateIPv4 => true,
            Error::ClockMovedBackwards { .. } | Error::MutexPoisoned => false,
        }
    }
}
