// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::clock::{Clock, DEFAULT_EPOCH, SystemClock};
use crate::error::Error;
use crate::generator::{Internals, SharedSnowUuid, SnowUuid};
use crate::layout::BitLayout;
use chrono::prelude::*;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[cfg(feature = "ip-fallback")]
use std::net::{IpAddr, Ipv4Addr};

/// A builder for building the [`SnowUuid`] generator.
///
/// Every call to [`SnowUuid::builder`] starts from a fresh default
/// configuration: epoch 2021-01-01, worker 0, datacenter 0, a 41/5/5/12 bit
/// layout and the system clock.
pub struct Builder<'a> {
    epoch: Option<i64>,
    worker_id: Option<i64>,
    datacenter_id: Option<i64>,
    check_worker_id: Option<&'a dyn Fn(u64) -> bool>,
    check_datacenter_id: Option<&'a dyn Fn(u64) -> bool>,
    layout: BitLayout,
    clock: Option<Arc<dyn Clock>>,
    #[cfg(feature = "ip-fallback")]
    ids_from_private_ip: bool,
}

impl<'a> Default for Builder<'a> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<'a> Builder<'a> {
    /// Construct a new builder for the build of [`SnowUuid`].
    pub fn new() -> Self {
        Self {
            epoch: None,
            worker_id: None,
            datacenter_id: None,
            check_worker_id: None,
            check_datacenter_id: None,
            layout: BitLayout::default(),
            clock: None,
            #[cfg(feature = "ip-fallback")]
            ids_from_private_ip: false,
        }
    }

    /// Set the epoch that is subtracted from every timestamp.
    ///
    /// It is not checked against the clock; an epoch later than the clock
    /// yields meaningless ids.
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch.timestamp_millis());
        self
    }

    /// Set the epoch in milliseconds since the Unix epoch.
    pub fn epoch_millis(mut self, epoch: i64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Set the worker ID. Out of range values make `finalize` fail.
    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Set the datacenter ID. Out of range values make `finalize` fail.
    pub fn datacenter_id(mut self, datacenter_id: i64) -> Self {
        self.datacenter_id = Some(datacenter_id);
        self
    }

    /// Set up a function to check the worker ID.
    /// If the function returns 'false', 'finalize' will fail.
    pub fn check_worker_id(mut self, check_worker_id: &'a dyn Fn(u64) -> bool) -> Self {
        self.check_worker_id = Some(check_worker_id);
        self
    }

    /// Set up a function to check the datacenter ID.
    /// If the function returns 'false', 'finalize' will fail.
    pub fn check_datacenter_id(mut self, check_datacenter_id: &'a dyn Fn(u64) -> bool) -> Self {
        self.check_datacenter_id = Some(check_datacenter_id);
        self
    }

    /// Set the bit length of the timestamp section.
    pub fn bit_len_time(mut self, bit_len_time: u8) -> Self {
        self.layout.time = bit_len_time;
        self
    }

    /// Set the bit length of the sequence section.
    pub fn bit_len_sequence(mut self, bit_len_sequence: u8) -> Self {
        self.layout.sequence = bit_len_sequence;
        self
    }

    /// Set the bit length of the datacenter ID section.
    pub fn bit_len_datacenter_id(mut self, bit_len_datacenter_id: u8) -> Self {
        self.layout.datacenter = bit_len_datacenter_id;
        self
    }

    /// Set the bit length of the worker ID section.
    pub fn bit_len_worker_id(mut self, bit_len_worker_id: u8) -> Self {
        self.layout.worker = bit_len_worker_id;
        self
    }

    /// Use `clock` instead of the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        self.clock = Some(clock);
        self
    }

    /// Take the datacenter and worker IDs from the third and fourth octets of
    /// the first private IPv4 address, masked to their bit lengths.
    /// An ID set explicitly with `worker_id` or `datacenter_id` wins over the
    /// derived one.
    /// If an ID is still missing and no private address is found, 'finalize'
    /// will fail.
    #[cfg(feature = "ip-fallback")]
    pub fn ids_from_private_ip(mut self) -> Self {
        self.ids_from_private_ip = true;
        self
    }

    /// Finish building and create a SnowUuid instance.
    /// This method will return an error if the bit lengths do not add up, if
    /// an ID is out of range, if a check function rejects it or if the time
    /// already elapsed since the epoch does not fit in the time section.
    pub fn finalize(self) -> Result<SnowUuid, Error> {
        let layout = self.layout;
        layout.validate()?;

        let (datacenter_id, worker_id) = self.resolve_ids(&layout)?;

        let max_worker_id = layout.max_worker_id();
        let worker_id = u64::try_from(worker_id)
            .ok()
            .filter(|id| *id <= max_worker_id)
            .ok_or(Error::WorkerIdOutOfRange {
                value: worker_id,
                max: max_worker_id,
            })?;

        if let Some(check_worker_id) = self.check_worker_id
            && !check_worker_id(worker_id)
        {
            return Err(Error::CheckWorkerIdFailed);
        }

        let max_datacenter_id = layout.max_datacenter_id();
        let datacenter_id = u64::try_from(datacenter_id)
            .ok()
            .filter(|id| *id <= max_datacenter_id)
            .ok_or(Error::DatacenterIdOutOfRange {
                value: datacenter_id,
                max: max_datacenter_id,
            })?;

        if let Some(check_datacenter_id) = self.check_datacenter_id
            && !check_datacenter_id(datacenter_id)
        {
            return Err(Error::CheckDatacenterIdFailed);
        }

        let epoch = self.epoch.unwrap_or(DEFAULT_EPOCH);
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        // An epoch ahead of the clock is not checked; only a delta already
        // wider than the time section is.
        if let Ok(elapsed) = u64::try_from(clock.now_millis().saturating_sub(epoch))
            && elapsed > layout.time_mask()
        {
            return Err(Error::OverTimeLimit {
                elapsed,
                bits: layout.time,
            });
        }

        debug!(
            epoch,
            worker_id,
            datacenter_id,
            bit_len_time = layout.time,
            bit_len_sequence = layout.sequence,
            "snow_uuid generator ready"
        );

        let shared = Arc::new(SharedSnowUuid {
            epoch,
            worker_id,
            datacenter_id,
            layout,
            clock,
            internals: Mutex::new(Internals {
                last_timestamp: None,
                sequence: 0,
            }),
        });
        Ok(SnowUuid::new_inner(shared))
    }

    /// Returns the (datacenter, worker) pair, defaulting unset IDs to 0.
    #[cfg(not(feature = "ip-fallback"))]
    fn resolve_ids(&self, _layout: &BitLayout) -> Result<(i64, i64), Error> {
        Ok((self.datacenter_id.unwrap_or(0), self.worker_id.unwrap_or(0)))
    }

    /// Returns the (datacenter, worker) pair, filling unset IDs from the
    /// private IPv4 address when asked to.
    #[cfg(feature = "ip-fallback")]
    fn resolve_ids(&self, layout: &BitLayout) -> Result<(i64, i64), Error> {
        if !self.ids_from_private_ip {
            return Ok((self.datacenter_id.unwrap_or(0), self.worker_id.unwrap_or(0)));
        }
        fill_from_private_ip(
            (self.datacenter_id, self.worker_id),
            layout,
            private_ipv4,
        )
    }
}

/// Fill whichever of (datacenter, worker) is unset from the third and fourth
/// octets of the address `private_ip` finds. The address is only looked up
/// when something is missing.
#[cfg(feature = "ip-fallback")]
fn fill_from_private_ip(
    ids: (Option<i64>, Option<i64>),
    layout: &BitLayout,
    private_ip: impl FnOnce() -> Option<Ipv4Addr>,
) -> Result<(i64, i64), Error> {
    if let (Some(datacenter_id), Some(worker_id)) = ids {
        return Ok((datacenter_id, worker_id));
    }
    let octets = private_ip().ok_or(Error::NoPrivateIPv4)?.octets();
    let datacenter_id = ids
        .0
        .unwrap_or((u64::from(octets[2]) & layout.max_datacenter_id()) as i64);
    let worker_id = ids
        .1
        .unwrap_or((u64::from(octets[3]) & layout.max_worker_id()) as i64);
    Ok((datacenter_id, worker_id))
}

#[cfg(feature = "ip-fallback")]
fn private_ipv4() -> Option<Ipv4Addr> {
    pnet_datalink::interfaces()
        .iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty())
        .flat_map(|iface| iface.ips.iter())
        .find_map(|network| match network.ip() {
            IpAddr::V4(ipv4) if is_private_ipv4(&ipv4) => Some(ipv4),
            _ => None,
        })
}

#[cfg(feature = "ip-fallback")]
fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    matches!(octets[0], 10)
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
}

#[cfg(all(test, feature = "ip-fallback"))]
mod tests {
    use super::*;

    #[test]
    fn private_ranges() {
        assert!(is_private_ipv4(&Ipv4Addr::new(10, 1, 2, 3)));
        assert!(is_private_ipv4(&Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_private_ipv4(&Ipv4Addr::new(172, 31, 255, 1)));
        assert!(is_private_ipv4(&Ipv4Addr::new(192, 168, 1, 20)));
        assert!(!is_private_ipv4(&Ipv4Addr::new(172, 32, 0, 1)));
        assert!(!is_private_ipv4(&Ipv4Addr::new(8, 8, 8, 8)));
        assert!(!is_private_ipv4(&Ipv4Addr::new(127, 0, 0, 1)));
    }

    #[test]
    fn ids_come_from_last_octets_masked() -> Result<(), Error> {
        let layout = BitLayout::default();
        let ids = fill_from_private_ip((None, None), &layout, || {
            Some(Ipv4Addr::new(192, 168, 33, 7))
        })?;
        // 33 & 31 == 1
        assert_eq!(ids, (1, 7));
        Ok(())
    }

    #[test]
    fn explicit_ids_win() -> Result<(), Error> {
        let layout = BitLayout::default();
        let ip = || Some(Ipv4Addr::new(10, 0, 4, 9));
        assert_eq!(fill_from_private_ip((Some(2), None), &layout, ip)?, (2, 9));
        assert_eq!(fill_from_private_ip((None, Some(30)), &layout, ip)?, (4, 30));

        let never = || -> Option<Ipv4Addr> { panic!("address looked up") };
        assert_eq!(fill_from_private_ip((Some(1), Some(3)), &layout, never)?, (1, 3));
        Ok(())
    }

    #[test]
    fn missing_address() {
        assert!(matches!(
            fill_from_private_ip((Some(1), None), &BitLayout::default(), || None),
            Err(Error::NoPrivateIPv4)
        ));
    }
}
