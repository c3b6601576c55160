// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{Criterion, criterion_group, criterion_main};
use snow_uuid::{ManualClock, SnowUuid};
use std::hint::black_box;

fn bench_new(c: &mut Criterion) {
    c.bench_function("bench_new", |b| {
        b.iter(SnowUuid::new);
    });
}

fn bench_next_id(c: &mut Criterion) {
    let sf = SnowUuid::new().expect("Could not create SnowUuid");
    c.bench_function("bench_next_id", |b| {
        b.iter(|| black_box(sf.next_id()));
    });
}

fn bench_decompose(c: &mut Criterion) {
    let clock = ManualClock::new(1_700_000_000_000);
    let sf = SnowUuid::builder()
        .worker_id(7)
        .datacenter_id(3)
        .clock(clock)
        .finalize()
        .expect("Could not create SnowUuid");
    let id = sf.next_id().expect("Could not generate id");
    c.bench_function("bench_decompose", |b| {
        b.iter(|| sf.decompose(black_box(id)));
    });
}

criterion_group!(snow_uuid_perf, bench_new, bench_next_id, bench_decompose);
criterion_main!(snow_uuid_perf);
