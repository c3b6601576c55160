//! A 64-bit unique ID generator in the style of [Twitter's Snowflake].
//!
//! Every id packs, most significant first, a millisecond timestamp relative
//! to an epoch, a datacenter id, a worker id and a per-millisecond sequence:
//!
//! ```text
//! [1 sign][41 time][5 datacenter][5 worker][12 sequence]
//! ```
//!
//! Ids from one generator are strictly increasing as long as the clock does
//! not go backwards. When it does, [`SnowUuid::next_id`] refuses to generate
//! an id and reports how far it went back.
//!
//! ## Quickstart
//!
//! ```
//! use snow_uuid::SnowUuid;
//!
//! let sf = SnowUuid::builder()
//!     .worker_id(3)
//!     .datacenter_id(1)
//!     .finalize()
//!     .unwrap();
//! let next_id = sf.next_id().unwrap();
//! assert_eq!(sf.decompose(next_id).worker_id, 3);
//! ```
//!
//! ## Deterministic clocks
//!
//! The clock is injected, so tests can pin it:
//!
//! ```
//! use snow_uuid::{ManualClock, SnowUuid};
//!
//! let clock = ManualClock::new(1_609_459_200_123);
//! let sf = SnowUuid::builder()
//!     .epoch_millis(1_609_459_200_000)
//!     .clock(clock.clone())
//!     .finalize()
//!     .unwrap();
//! assert_eq!(sf.next_id().unwrap(), 515_899_392);
//! assert_eq!(sf.next_id().unwrap(), 515_899_393);
//! ```
//!
//! ## Concurrent use
//!
//! SnowUuid is thread safe. `clone` it before moving to another thread:
//! ```
//! use snow_uuid::SnowUuid;
//! use std::thread;
//!
//! let sf = SnowUuid::new().unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_sf = sf.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_sf.next_id().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```
//!
//! [Twitter's Snowflake]: https://blog.twitter.com/2010/announcing-snowflake

mod builder;
mod clock;
mod error;
mod generator;
mod layout;

pub use builder::*;
pub use clock::*;
pub use error::*;
pub use generator::*;
pub use layout::*;
