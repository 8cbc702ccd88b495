// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use googletest::assert_that;
use googletest::prelude::near;
use streamsketch::error::ErrorKind;
use streamsketch::hll::CurMode;
use streamsketch::hll::HllSketch;
use streamsketch::hll::HllType;

#[test]
fn test_union_requires_identical_lg_k() {
    let mut a = HllSketch::new(12, HllType::Hll8);
    let b = HllSketch::new(11, HllType::Hll8);
    let err = a.union(&b).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);

    // The receiver is untouched by the failed union.
    assert!(a.is_empty());
}

#[test]
fn test_sparse_self_union_is_exact() {
    let mut a = HllSketch::new(12, HllType::Hll8);
    for i in 0..200u64 {
        a.update(&i);
    }

    let before = a.estimate();
    let other = a.clone();
    a.union(&other).unwrap();
    assert_eq!(a.estimate(), before);
}

#[test]
fn test_dense_self_union_estimates_same_cardinality() {
    let mut a = HllSketch::new(12, HllType::Hll8);
    for i in 0..50_000u64 {
        a.update(&i);
    }
    assert_eq!(a.cur_mode(), CurMode::Hll);

    let before = a.estimate();
    let other = a.clone();
    a.union(&other).unwrap();

    // The estimator switches to the composite form, so allow its error.
    let tolerance = 3.0 * 1.04 / 64.0 * before;
    assert_that!(a.estimate(), near(before, tolerance));
}

#[test]
fn test_union_of_disjoint_sparse_sketches() {
    let mut a = HllSketch::new(12, HllType::Hll8);
    let mut b = HllSketch::new(12, HllType::Hll8);
    for i in 0..100u64 {
        a.update(&i);
        b.update(&(i + 100));
    }

    a.union(&b).unwrap();
    assert_eq!(a.estimate().round() as u64, 200);
}

#[test]
fn test_union_of_overlapping_dense_sketches() {
    const N: u64 = 30_000;

    let mut a = HllSketch::new(12, HllType::Hll8);
    let mut b = HllSketch::new(12, HllType::Hll8);
    for i in 0..N {
        a.update(&i);
        b.update(&(i + N / 2));
    }

    a.union(&b).unwrap();

    let expected = 1.5 * N as f64;
    let tolerance = 3.0 * 1.04 / 64.0 * expected;
    assert_that!(a.estimate(), near(expected, tolerance));
}

#[test]
fn test_dense_source_forces_receiver_dense() {
    let mut receiver = HllSketch::new(11, HllType::Hll6);
    receiver.update(&0u64);
    assert_eq!(receiver.cur_mode(), CurMode::List);

    let mut dense = HllSketch::new(11, HllType::Hll8);
    for i in 0..20_000u64 {
        dense.update(&i);
    }
    assert_eq!(dense.cur_mode(), CurMode::Hll);

    receiver.union(&dense).unwrap();
    assert_eq!(receiver.cur_mode(), CurMode::Hll);
    // The receiver keeps its own target width.
    assert_eq!(receiver.target_type(), HllType::Hll6);
}

#[test]
fn test_sparse_source_into_dense_receiver() {
    let mut receiver = HllSketch::new(11, HllType::Hll8);
    for i in 0..20_000u64 {
        receiver.update(&i);
    }
    assert_eq!(receiver.cur_mode(), CurMode::Hll);
    let before = receiver.estimate();

    let mut sparse = HllSketch::new(11, HllType::Hll8);
    for i in 0..50u64 {
        sparse.update(&(i + 1_000_000));
    }
    assert_eq!(sparse.cur_mode(), CurMode::Set);

    receiver.union(&sparse).unwrap();
    assert_eq!(receiver.cur_mode(), CurMode::Hll);
    assert!(receiver.estimate() > before);
}

#[test]
fn test_union_never_reverts_mode() {
    let mut receiver = HllSketch::new(10, HllType::Hll8);
    let mut dense = HllSketch::new(10, HllType::Hll8);
    for i in 0..5_000u64 {
        dense.update(&i);
    }

    receiver.union(&dense).unwrap();
    assert_eq!(receiver.cur_mode(), CurMode::Hll);

    // A later sparse union must not pull the receiver back out of HLL mode.
    let mut sparse = HllSketch::new(10, HllType::Hll8);
    sparse.update(&123_456u64);
    receiver.union(&sparse).unwrap();
    assert_eq!(receiver.cur_mode(), CurMode::Hll);
}

#[test]
fn test_union_across_dense_widths() {
    const N: u64 = 25_000;

    for (src_type, dst_type) in [
        (HllType::Hll4, HllType::Hll8),
        (HllType::Hll6, HllType::Hll8),
        (HllType::Hll8, HllType::Hll4),
        (HllType::Hll8, HllType::Hll6),
    ] {
        let mut src = HllSketch::new(12, src_type);
        let mut dst = HllSketch::new(12, dst_type);
        for i in 0..N {
            src.update(&i);
            dst.update(&(i + N));
        }

        dst.union(&src).unwrap();

        let expected = 2.0 * N as f64;
        let tolerance = 3.0 * 1.04 / 64.0 * expected;
        assert_that!(dst.estimate(), near(expected, tolerance));
    }
}

#[test]
fn test_sharded_updates_match_single_sketch() {
    const N: u64 = 40_000;
    const SHARDS: u64 = 4;

    let mut shards: Vec<HllSketch> = (0..SHARDS)
        .map(|_| HllSketch::new(12, HllType::Hll8))
        .collect();
    for i in 0..N {
        shards[(i % SHARDS) as usize].update(&i);
    }

    let mut combined = HllSketch::new(12, HllType::Hll8);
    for shard in &shards {
        combined.union(shard).unwrap();
    }

    let tolerance = 3.0 * 1.04 / 64.0 * N as f64;
    assert_that!(combined.estimate(), near(N as f64, tolerance));
}
