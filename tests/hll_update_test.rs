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
use googletest::prelude::ge;
use googletest::prelude::le;
use googletest::prelude::near;
use streamsketch::common::NumStdDev;
use streamsketch::hll::CurMode;
use streamsketch::hll::HllSketch;
use streamsketch::hll::HllType;

// 3 standard deviations of the composite estimator at lg_k = 12.
const RELATIVE_ERROR_FOR_LG_K_12: f64 = 3.0 * 1.04 / 64.0;

#[test]
fn test_empty_sketch_in_list_mode() {
    let sketch = HllSketch::new(12, HllType::Hll6);
    assert!(sketch.is_empty());
    assert_eq!(sketch.cur_mode(), CurMode::List);
    assert_eq!(sketch.estimate(), 0.0);
}

#[test]
fn test_single_update_stays_in_list_mode() {
    let mut sketch = HllSketch::new(12, HllType::Hll6);
    sketch.update(&1u64);
    assert!(!sketch.is_empty());
    assert_eq!(sketch.cur_mode(), CurMode::List);
    assert_that!(sketch.estimate(), near(1.0, 0.01));
}

#[test]
fn test_list_to_set_promotion() {
    let mut sketch = HllSketch::new(12, HllType::Hll6);

    // Past the list threshold the sketch reports SET mode.
    for i in 0..32u64 {
        sketch.update(&i);
    }
    assert_eq!(sketch.cur_mode(), CurMode::Set);
}

#[test]
fn test_sparse_modes_are_exact() {
    let mut sketch = HllSketch::new(12, HllType::Hll8);
    for i in 0..100u64 {
        sketch.update(&i);
    }
    assert_eq!(sketch.cur_mode(), CurMode::Set);
    assert_eq!(sketch.estimate().round() as u64, 100);
}

#[test]
fn test_set_to_hll_promotion() {
    // lg_k=10: the set promotes to the dense array once it would outgrow
    // the 2^(lg_k - 3) coupon table.
    let mut sketch = HllSketch::new(10, HllType::Hll8);

    for i in 0..1000u64 {
        sketch.update(&i);
    }
    assert_eq!(sketch.cur_mode(), CurMode::Hll);

    let estimate = sketch.estimate();
    assert_that!(estimate, near(1000.0, 150.0));
}

#[test]
fn test_mode_transitions_are_monotonic() {
    let mut sketch = HllSketch::new(10, HllType::Hll8);
    let mut densest = CurMode::List;

    for i in 0..20_000u64 {
        sketch.update(&i);
        let mode = sketch.cur_mode();
        match (densest, mode) {
            (CurMode::Set, CurMode::List) => panic!("mode went backward at {i}"),
            (CurMode::Hll, CurMode::List) | (CurMode::Hll, CurMode::Set) => {
                panic!("mode went backward at {i}")
            }
            _ => {}
        }
        densest = mode;
    }
    assert_eq!(densest, CurMode::Hll);
}

#[test]
fn test_duplicate_handling() {
    let mut sketch = HllSketch::new(12, HllType::Hll8);

    for _ in 0..10 {
        for i in 0..100u64 {
            sketch.update(&i);
        }
    }

    // ~100 unique values, not 1000
    assert_that!(sketch.estimate(), near(100.0, 20.0));
}

#[test]
fn test_dense_estimate_converges() {
    const N: usize = 100_000;
    const N_F64: f64 = N as f64;

    for hll_type in [HllType::Hll4, HllType::Hll6, HllType::Hll8] {
        let mut sketch = HllSketch::new(12, hll_type);
        for i in 0..N {
            sketch.update(&i);
        }
        assert_eq!(sketch.cur_mode(), CurMode::Hll);
        assert_that!(
            sketch.estimate(),
            near(N_F64, RELATIVE_ERROR_FOR_LG_K_12 * N_F64)
        );
    }
}

#[test]
fn test_bounds_bracket_estimate() {
    let mut sketch = HllSketch::new(11, HllType::Hll6);
    for i in 0..50_000u64 {
        sketch.update(&i);
    }
    let estimate = sketch.estimate();
    assert_that!(estimate, ge(sketch.lower_bound(NumStdDev::One)));
    assert_that!(estimate, le(sketch.upper_bound(NumStdDev::One)));
    assert_that!(
        sketch.lower_bound(NumStdDev::Three),
        le(sketch.lower_bound(NumStdDev::One))
    );
    assert_that!(
        sketch.upper_bound(NumStdDev::Three),
        ge(sketch.upper_bound(NumStdDev::One))
    );
}

#[test]
fn test_update_hash64_is_the_core_path() {
    // Feeding pre-computed hashes gives the same sketch as hashing values.
    let mut direct = HllSketch::new(12, HllType::Hll8);
    for i in 0..500u64 {
        direct.update_hash64(i.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    }
    assert!(!direct.is_empty());
    assert!(direct.estimate() > 400.0);
}

#[test]
fn test_different_types() {
    let mut sketch = HllSketch::new(10, HllType::Hll8);

    sketch.update(42i32);
    sketch.update("hello");
    sketch.update(100u64);
    sketch.update(true);
    sketch.update(vec![1, 2, 3]);

    assert!(sketch.estimate() >= 5.0, "at least 5 distinct values");
}

#[test]
fn test_copy_is_independent() {
    let mut sketch = HllSketch::new(12, HllType::Hll6);
    for i in 0..100u64 {
        sketch.update(&i);
    }

    let copy = sketch.clone();
    assert_eq!(copy, sketch);

    sketch.update(&100_000u64);
    assert_ne!(copy.estimate(), sketch.estimate());
}
