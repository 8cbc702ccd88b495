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

use streamsketch::error::ErrorKind;
use streamsketch::kll::DEFAULT_K;
use streamsketch::kll::KllSketch;

fn round_trip(sketch: &KllSketch<f32>) -> KllSketch<f32> {
    let bytes = sketch.serialize();
    KllSketch::<f32>::deserialize(&bytes).expect("deserialize should succeed")
}

fn assert_same_state(a: &KllSketch<f32>, b: &KllSketch<f32>) {
    assert_eq!(a.k(), b.k());
    assert_eq!(a.n(), b.n());
    assert_eq!(a.num_levels(), b.num_levels());
    assert_eq!(a.level_sizes(), b.level_sizes());
    assert_eq!(a.retained_items(), b.retained_items());
    assert_eq!(a.min_item(), b.min_item());
    assert_eq!(a.max_item(), b.max_item());
}

#[test]
fn test_empty_round_trip() {
    let sketch = KllSketch::<f32>::new(DEFAULT_K);
    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 8);

    let restored = round_trip(&sketch);
    assert!(restored.is_empty());
    assert_same_state(&sketch, &restored);
}

#[test]
fn test_single_item_round_trip() {
    let mut sketch = KllSketch::<f32>::new(DEFAULT_K);
    sketch.update(42.5);

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 12); // short preamble + one f32

    let restored = round_trip(&sketch);
    assert_same_state(&sketch, &restored);
    assert_eq!(restored.quantile(0.5, true).unwrap(), 42.5);
}

#[test]
fn test_exact_mode_round_trip() {
    let mut sketch = KllSketch::<f32>::new(DEFAULT_K);
    for i in 0..100 {
        sketch.update(i as f32);
    }

    let restored = round_trip(&sketch);
    assert_same_state(&sketch, &restored);
    for step in 0..=10 {
        let rank = step as f64 / 10.0;
        assert_eq!(
            sketch.quantile(rank, true).unwrap(),
            restored.quantile(rank, true).unwrap()
        );
    }
}

#[test]
fn test_estimation_mode_round_trip() {
    let mut sketch = KllSketch::<f32>::with_initial_offset(DEFAULT_K, 0);
    for i in 0..100_000 {
        sketch.update(i as f32);
    }
    assert!(sketch.is_estimation_mode());

    let restored = round_trip(&sketch);
    assert_same_state(&sketch, &restored);
    for step in 0..=10 {
        let rank = step as f64 / 10.0;
        assert_eq!(
            sketch.quantile(rank, true).unwrap(),
            restored.quantile(rank, true).unwrap()
        );
    }
    for value in [0.0f32, 1_000.0, 50_000.0, 99_999.0] {
        assert_eq!(
            sketch.rank(&value, true).unwrap(),
            restored.rank(&value, true).unwrap()
        );
    }
}

#[test]
fn test_round_trip_accepts_further_updates() {
    let mut sketch = KllSketch::<f32>::with_initial_offset(DEFAULT_K, 0);
    for i in 0..10_000 {
        sketch.update(i as f32);
    }

    let mut restored = round_trip(&sketch);
    for i in 10_000..20_000 {
        sketch.update(i as f32);
        restored.update(i as f32);
    }

    // The restored sketch seeds a fresh offset sequence, so layouts may
    // differ, but the summary stays consistent and within error bounds.
    assert_eq!(restored.n(), sketch.n());
    assert_eq!(restored.min_item(), sketch.min_item());
    assert_eq!(restored.max_item(), sketch.max_item());
    let eps = sketch.normalized_rank_error(false);
    let median_a = sketch.quantile(0.5, true).unwrap() as f64;
    let median_b = restored.quantile(0.5, true).unwrap() as f64;
    assert!(
        (median_a - median_b).abs() <= 2.0 * eps * 20_000.0,
        "medians diverged: {median_a} vs {median_b}"
    );
}

#[test]
fn test_merged_sketch_round_trips() {
    let mut a = KllSketch::<f32>::with_initial_offset(DEFAULT_K, 0);
    let mut b = KllSketch::<f32>::with_initial_offset(DEFAULT_K, 1);
    for i in 0..20_000 {
        a.update(i as f32);
        b.update((i + 20_000) as f32);
    }
    a.merge(&b).unwrap();

    let restored = round_trip(&a);
    assert_same_state(&a, &restored);
}

#[test]
fn test_deserialize_rejects_truncated_input() {
    let mut sketch = KllSketch::<f32>::new(DEFAULT_K);
    for i in 0..1000 {
        sketch.update(i as f32);
    }
    let bytes = sketch.serialize();

    for len in [0, 3, 7, 10, 19, bytes.len() - 1] {
        let err = KllSketch::<f32>::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData, "prefix of {len} bytes");
    }
}

#[test]
fn test_deserialize_rejects_wrong_family() {
    let mut bytes = KllSketch::<f32>::new(DEFAULT_K).serialize();
    bytes[2] = 7; // HLL family id
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_deserialize_rejects_unknown_version() {
    let mut bytes = KllSketch::<f32>::new(DEFAULT_K).serialize();
    bytes[1] = 3;
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_deserialize_rejects_wrong_m() {
    let mut bytes = KllSketch::<f32>::new(DEFAULT_K).serialize();
    bytes[6] = 4;
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_deserialize_rejects_bad_preamble_ints() {
    let mut bytes = KllSketch::<f32>::new(DEFAULT_K).serialize();
    bytes[0] = 5; // full preamble declared on an empty sketch
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_deserialize_rejects_offsets_beyond_capacity() {
    let mut sketch = KllSketch::<f32>::new(DEFAULT_K);
    for i in 0..1000 {
        sketch.update(i as f32);
    }
    let mut bytes = sketch.serialize();
    // First level offset lives at byte 20; point it past the buffer.
    bytes[20..24].copy_from_slice(&u32::MAX.to_le_bytes());
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_deserialize_rejects_inconsistent_weight() {
    let mut sketch = KllSketch::<f32>::new(DEFAULT_K);
    for i in 0..1000 {
        sketch.update(i as f32);
    }
    let mut bytes = sketch.serialize();
    // Corrupt n (bytes 8..16) so it no longer matches the retained weight.
    bytes[8..16].copy_from_slice(&12345u64.to_le_bytes());
    let err = KllSketch::<f32>::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}
