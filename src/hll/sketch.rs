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

//! The cardinality-estimation engine
//!
//! This module provides the main [`HllSketch`] struct, which is the primary
//! interface for creating and using HLL sketches for cardinality estimation.

use std::hash::Hash;

use crate::codec::SketchSlice;
use crate::codec::family::Family;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::hll::HllType;
use crate::hll::RESIZE_DENOMINATOR;
use crate::hll::RESIZE_NUMERATOR;
use crate::hll::array4::Array4;
use crate::hll::array6::Array6;
use crate::hll::array8::Array8;
use crate::hll::container::Container;
use crate::hll::coupon_from_hash;
use crate::hll::hash64;
use crate::hll::hash_set::HashSet;
use crate::hll::list::List;
use crate::hll::mode::Mode;
use crate::hll::pack_coupon;
use crate::hll::serialization::*;

/// Current storage mode of an [`HllSketch`]
///
/// The mode is monotonically non-decreasing over the life of a sketch:
/// `List` -> `Set` -> `Hll`, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurMode {
    /// Sparse coupon list
    List,
    /// Sparse coupon hash set
    Set,
    /// Dense bit-packed register array
    Hll,
}

/// A cardinality sketch with list/set/dense representations.
///
/// See the [hll module level documentation](crate::hll) for more.
#[derive(Debug, Clone, PartialEq)]
pub struct HllSketch {
    lg_config_k: u8,
    mode: Mode,
}

impl HllSketch {
    /// Create a new HLL sketch
    ///
    /// # Arguments
    ///
    /// * `lg_config_k` - Log2 of the number of registers (K). Must be in [4, 21].
    ///   - lg_k=4: 16 registers, ~26% relative error
    ///   - lg_k=12: 4096 registers, ~1.6% relative error (common choice)
    ///   - lg_k=21: 2M registers, ~0.06% relative error
    /// * `hll_type` - Target dense representation (Hll4, Hll6, or Hll8)
    ///
    /// # Panics
    ///
    /// If lg_config_k is not in range [4, 21]
    pub fn new(lg_config_k: u8, hll_type: HllType) -> Self {
        assert!(
            (4..=21).contains(&lg_config_k),
            "lg_config_k must be in [4, 21], got {}",
            lg_config_k
        );

        let list = List::default();

        Self {
            lg_config_k,
            mode: Mode::List { list, hll_type },
        }
    }

    /// Create an HLL sketch directly from a Mode
    ///
    /// This is used internally (e.g., by union operations) to construct
    /// sketches in specific modes without going through List mode first.
    pub(super) fn from_mode(lg_config_k: u8, mode: Mode) -> Self {
        Self { lg_config_k, mode }
    }

    /// Get the current mode of the sketch
    pub(super) fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Get mutable access to the current mode
    ///
    /// Callers must maintain the internal invariants (register bookkeeping,
    /// estimator state).
    pub(super) fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    /// Get the current storage mode
    pub fn cur_mode(&self) -> CurMode {
        match &self.mode {
            Mode::List { .. } => CurMode::List,
            Mode::Set { .. } => CurMode::Set,
            Mode::Array4(_) | Mode::Array6(_) | Mode::Array8(_) => CurMode::Hll,
        }
    }

    /// Check if the sketch is empty (no values have been added)
    pub fn is_empty(&self) -> bool {
        match &self.mode {
            Mode::List { list, .. } => list.container().is_empty(),
            Mode::Set { set, .. } => set.container().is_empty(),
            Mode::Array4(arr) => arr.is_empty(),
            Mode::Array6(arr) => arr.is_empty(),
            Mode::Array8(arr) => arr.is_empty(),
        }
    }

    /// Get the target dense representation for this sketch
    pub fn target_type(&self) -> HllType {
        match &self.mode {
            Mode::List { hll_type, .. } => *hll_type,
            Mode::Set { hll_type, .. } => *hll_type,
            Mode::Array4(_) => HllType::Hll4,
            Mode::Array6(_) => HllType::Hll6,
            Mode::Array8(_) => HllType::Hll8,
        }
    }

    /// Get the configured lg_config_k
    pub fn lg_config_k(&self) -> u8 {
        self.lg_config_k
    }

    /// Update the sketch with a value
    ///
    /// This accepts any type that implements `Hash`. The value is hashed with
    /// the process-wide seed and handed to [`update_hash64`](Self::update_hash64).
    pub fn update<T: Hash>(&mut self, value: T) {
        self.update_hash64(hash64(value));
    }

    /// Update the sketch with an externally computed 64-bit hash
    ///
    /// The engine derives the register slot and value from the hash; it never
    /// hashes raw bytes itself.
    pub fn update_hash64(&mut self, hash: u64) {
        self.update_with_coupon(coupon_from_hash(hash));
    }

    /// Update the sketch with a raw coupon value
    ///
    /// Maintains all sketch invariants including mode transitions and
    /// estimator updates.
    pub(super) fn update_with_coupon(&mut self, coupon: u32) {
        match &mut self.mode {
            Mode::List { list, hll_type } => {
                list.update(coupon);
                let should_promote = list.container().is_full();
                if should_promote {
                    self.mode = if self.lg_config_k < 8 {
                        promote_container_to_array(list.container(), *hll_type, self.lg_config_k)
                    } else {
                        promote_container_to_set(list.container(), *hll_type)
                    }
                }
            }
            Mode::Set { set, hll_type } => {
                set.update(coupon);
                let should_promote = RESIZE_DENOMINATOR as usize * set.container().len()
                    > RESIZE_NUMERATOR as usize * set.container().capacity();
                if should_promote {
                    self.mode = if set.container().lg_size() == self.lg_config_k as usize - 3 {
                        promote_container_to_array(set.container(), *hll_type, self.lg_config_k)
                    } else {
                        grow_set(set, *hll_type)
                    }
                }
            }
            Mode::Array4(arr) => arr.update(coupon),
            Mode::Array6(arr) => arr.update(coupon),
            Mode::Array8(arr) => arr.update(coupon),
        }
    }

    /// Get the current cardinality estimate
    ///
    /// In the sparse modes this is the (collision-corrected) exact coupon
    /// count; in dense mode it is the HIP or composite estimate.
    pub fn estimate(&self) -> f64 {
        match &self.mode {
            Mode::List { list, .. } => list.container().estimate(),
            Mode::Set { set, .. } => set.container().estimate(),
            Mode::Array4(arr) => arr.estimate(),
            Mode::Array6(arr) => arr.estimate(),
            Mode::Array8(arr) => arr.estimate(),
        }
    }

    /// Get upper confidence bound for the cardinality estimate
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        match &self.mode {
            Mode::List { list, .. } => list.container().upper_bound(num_std_dev),
            Mode::Set { set, .. } => set.container().upper_bound(num_std_dev),
            Mode::Array4(arr) => arr.upper_bound(num_std_dev),
            Mode::Array6(arr) => arr.upper_bound(num_std_dev),
            Mode::Array8(arr) => arr.upper_bound(num_std_dev),
        }
    }

    /// Get lower confidence bound for the cardinality estimate
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        match &self.mode {
            Mode::List { list, .. } => list.container().lower_bound(num_std_dev),
            Mode::Set { set, .. } => set.container().lower_bound(num_std_dev),
            Mode::Array4(arr) => arr.lower_bound(num_std_dev),
            Mode::Array6(arr) => arr.lower_bound(num_std_dev),
            Mode::Array8(arr) => arr.lower_bound(num_std_dev),
        }
    }

    /// Serializes the sketch to bytes
    pub fn serialize(&self) -> Vec<u8> {
        match &self.mode {
            Mode::List { list, hll_type } => list.serialize(self.lg_config_k, *hll_type),
            Mode::Set { set, hll_type } => set.serialize(self.lg_config_k, *hll_type),
            Mode::Array4(arr) => arr.serialize(self.lg_config_k),
            Mode::Array6(arr) => arr.serialize(self.lg_config_k),
            Mode::Array8(arr) => arr.serialize(self.lg_config_k),
        }
    }

    /// Deserializes a sketch from bytes
    ///
    /// Validates the preamble, version, configuration range and all declared
    /// sizes before building the sketch; any inconsistency yields a
    /// `MalformedData` (or `OutOfRange`) error.
    pub fn deserialize(bytes: &[u8]) -> Result<HllSketch, Error> {
        let mut cursor = SketchSlice::new(bytes);

        let preamble_ints = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("preamble_ints"))?;
        let ser_ver = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("serial_version"))?;
        let family_id = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("family_id"))?;
        let lg_config_k = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("lg_config_k"))?;
        let lg_arr = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("lg_arr"))?;
        let flags = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("flags"))?;
        let count_or_cur_min = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("count/cur_min"))?;
        let mode_byte = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("mode_byte"))?;

        Family::HLL.validate_id(family_id)?;

        if ser_ver != SERIAL_VERSION {
            return Err(Error::unsupported_serial_version(SERIAL_VERSION, ser_ver));
        }

        if !(4..=21).contains(&lg_config_k) {
            return Err(Error::deserial(format!(
                "lg_config_k must be in [4, 21], got {lg_config_k}"
            )));
        }

        let hll_type = match extract_tgt_hll_type(mode_byte) {
            TGT_HLL4 => HllType::Hll4,
            TGT_HLL6 => HllType::Hll6,
            TGT_HLL8 => HllType::Hll8,
            tgt => {
                return Err(Error::deserial(format!("invalid target HLL type: {tgt}")));
            }
        };

        let empty = (flags & EMPTY_FLAG_MASK) != 0;
        let compact = (flags & COMPACT_FLAG_MASK) != 0;
        let ooo = (flags & OUT_OF_ORDER_FLAG_MASK) != 0;

        let mode = match extract_cur_mode(mode_byte) {
            CUR_MODE_LIST => {
                if preamble_ints != LIST_PREINTS {
                    return Err(Error::deserial(format!(
                        "LIST mode preamble: expected {LIST_PREINTS}, got {preamble_ints}"
                    )));
                }
                if lg_arr > 26 {
                    return Err(Error::deserial(format!("invalid lg_arr: {lg_arr}")));
                }
                let coupon_count = count_or_cur_min as usize;
                if empty && coupon_count > 0 {
                    return Err(Error::deserial(format!(
                        "empty LIST sketch declares {coupon_count} coupons"
                    )));
                }

                let list =
                    List::deserialize(&mut cursor, lg_arr as usize, coupon_count, empty, compact)?;
                Mode::List { list, hll_type }
            }
            CUR_MODE_SET => {
                if preamble_ints != HASH_SET_PREINTS {
                    return Err(Error::deserial(format!(
                        "SET mode preamble: expected {HASH_SET_PREINTS}, got {preamble_ints}"
                    )));
                }
                if lg_arr > 26 {
                    return Err(Error::deserial(format!("invalid lg_arr: {lg_arr}")));
                }

                let set = HashSet::deserialize(&mut cursor, lg_arr as usize, compact)?;
                Mode::Set { set, hll_type }
            }
            CUR_MODE_HLL => {
                if preamble_ints != HLL_PREINTS {
                    return Err(Error::deserial(format!(
                        "HLL mode preamble: expected {HLL_PREINTS}, got {preamble_ints}"
                    )));
                }

                match hll_type {
                    HllType::Hll4 => {
                        Array4::deserialize(&mut cursor, lg_config_k, count_or_cur_min, ooo)
                            .map(Mode::Array4)?
                    }
                    HllType::Hll6 => {
                        if count_or_cur_min != 0 {
                            return Err(Error::deserial(
                                "cur_min must be 0 for the 6-bit representation",
                            ));
                        }
                        Array6::deserialize(&mut cursor, lg_config_k, ooo).map(Mode::Array6)?
                    }
                    HllType::Hll8 => {
                        if count_or_cur_min != 0 {
                            return Err(Error::deserial(
                                "cur_min must be 0 for the 8-bit representation",
                            ));
                        }
                        Array8::deserialize(&mut cursor, lg_config_k, ooo).map(Mode::Array8)?
                    }
                }
            }
            mode => return Err(Error::deserial(format!("invalid mode: {mode}"))),
        };

        Ok(HllSketch { lg_config_k, mode })
    }
}

fn promote_container_to_set(container: &Container, hll_type: HllType) -> Mode {
    let mut set = HashSet::default();
    for coupon in container.iter() {
        set.update(coupon);
    }

    Mode::Set { set, hll_type }
}

fn grow_set(old_set: &HashSet, hll_type: HllType) -> Mode {
    let new_size = old_set.container().lg_size() + 1;
    let mut new_set = HashSet::new(new_size);
    for coupon in old_set.container().iter() {
        new_set.update(coupon);
    }

    Mode::Set {
        set: new_set,
        hll_type,
    }
}

pub(super) fn promote_container_to_array(
    container: &Container,
    hll_type: HllType,
    lg_config_k: u8,
) -> Mode {
    // Promotion replays every (slot, value) pair; re-insertion is idempotent
    // and preserves the max-value-per-register invariant.
    match hll_type {
        HllType::Hll4 => {
            let mut array = Array4::new(lg_config_k);
            for (slot, value) in container.pairs() {
                array.update(pack_coupon(slot, value));
            }
            array.set_hip_accum(container.estimate());
            Mode::Array4(array)
        }
        HllType::Hll6 => {
            let mut array = Array6::new(lg_config_k);
            for (slot, value) in container.pairs() {
                array.update(pack_coupon(slot, value));
            }
            array.set_hip_accum(container.estimate());
            Mode::Array6(array)
        }
        HllType::Hll8 => {
            let mut array = Array8::new(lg_config_k);
            for (slot, value) in container.pairs() {
                array.update(pack_coupon(slot, value));
            }
            array.set_hip_accum(container.estimate());
            Mode::Array8(array)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_in_list_mode() {
        let sketch = HllSketch::new(12, HllType::Hll6);
        assert_eq!(sketch.cur_mode(), CurMode::List);
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0.0);
    }

    #[test]
    #[should_panic(expected = "lg_config_k must be in [4, 21]")]
    fn test_new_rejects_bad_lg_k() {
        HllSketch::new(3, HllType::Hll8);
    }

    #[test]
    fn test_small_lg_k_promotes_straight_to_dense() {
        let mut sketch = HllSketch::new(4, HllType::Hll8);
        for i in 0..64u64 {
            sketch.update(i);
        }
        assert_eq!(sketch.cur_mode(), CurMode::Hll);
    }

    #[test]
    fn test_promotion_preserves_estimate_continuity() {
        let mut sketch = HllSketch::new(12, HllType::Hll8);
        for i in 0..2000u64 {
            sketch.update(i);
        }
        // Past the set threshold for lg_k 12 the sketch is dense, and the
        // estimate should still track the true cardinality.
        let estimate = sketch.estimate();
        assert!((estimate - 2000.0).abs() < 200.0, "estimate {estimate}");
    }

    #[test]
    fn test_update_hash64_matches_update() {
        let mut by_value = HllSketch::new(10, HllType::Hll8);
        let mut by_hash = HllSketch::new(10, HllType::Hll8);
        for i in 0..100u64 {
            by_value.update(i);
            by_hash.update_hash64(crate::hll::hash64(i));
        }
        assert_eq!(by_value, by_hash);
    }
}
