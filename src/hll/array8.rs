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

//! HLL Array8 mode - 8-bit (1 byte per slot) representation
//!
//! Array8 is the simplest HLL array implementation, storing one byte per slot.
//! This provides the maximum value range with no bit-packing complexity.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::hll::array4::write_hll_preamble;
use crate::hll::estimator::HipEstimator;
use crate::hll::get_slot;
use crate::hll::get_value;
use crate::hll::iter::Array8Iter;
use crate::hll::serialization::*;

/// Core Array8 data structure - one byte per slot, no packing
#[derive(Debug, Clone, PartialEq)]
pub struct Array8 {
    lg_config_k: u8,
    /// Direct byte array: bytes[slot] = value
    bytes: Box<[u8]>,
    /// Count of slots with value 0
    num_zeros: u32,
    /// HIP estimator for cardinality estimation
    estimator: HipEstimator,
}

impl Array8 {
    pub fn new(lg_config_k: u8) -> Self {
        let k = 1 << lg_config_k;

        Self {
            lg_config_k,
            bytes: vec![0u8; k as usize].into_boxed_slice(),
            num_zeros: k,
            estimator: HipEstimator::new(lg_config_k),
        }
    }

    pub fn num_registers(&self) -> u32 {
        1 << self.lg_config_k
    }

    /// Get the total number of bytes used
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_zeros == self.num_registers()
    }

    /// Get value from a slot
    #[inline]
    pub fn get(&self, slot: u32) -> u8 {
        self.bytes[slot as usize]
    }

    /// Set value in a slot
    #[inline]
    fn put(&mut self, slot: u32, value: u8) {
        self.bytes[slot as usize] = value;
    }

    /// Update with a coupon
    pub fn update(&mut self, coupon: u32) {
        let mask = (1 << self.lg_config_k) - 1;
        let slot = get_slot(coupon) & mask;
        let new_value = get_value(coupon);

        let old_value = self.get(slot);

        if new_value > old_value {
            self.estimator
                .update(self.lg_config_k, old_value, new_value);
            self.put(slot, new_value);

            if old_value == 0 {
                self.num_zeros -= 1;
            }
        }
    }

    /// Get the current cardinality estimate
    pub fn estimate(&self) -> f64 {
        // Array8 doesn't use cur_min (always 0), so num_at_cur_min = num_zeros
        self.estimator.estimate(self.lg_config_k, 0, self.num_zeros)
    }

    /// Get upper confidence bound for the cardinality estimate
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .upper_bound(self.lg_config_k, 0, self.num_zeros, num_std_dev)
    }

    /// Get lower confidence bound for the cardinality estimate
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .lower_bound(self.lg_config_k, 0, self.num_zeros, num_std_dev)
    }

    /// Get the number of zero-valued slots
    pub fn num_zeros(&self) -> u32 {
        self.num_zeros
    }

    pub fn set_hip_accum(&mut self, value: f64) {
        self.estimator.set_hip_accum(value);
    }

    pub fn is_out_of_order(&self) -> bool {
        self.estimator.is_out_of_order()
    }

    pub fn set_out_of_order(&mut self, ooo: bool) {
        self.estimator.set_out_of_order(ooo);
    }

    /// Lazy (slot, value) traversal over all registers
    pub fn iter(&self) -> Array8Iter<'_> {
        Array8Iter::new(&self.bytes)
    }

    /// Deserialize the Array8 payload following the 8-byte preamble
    pub(crate) fn deserialize(
        cursor: &mut SketchSlice<'_>,
        lg_config_k: u8,
        ooo: bool,
    ) -> Result<Self, Error> {
        let k = 1u32 << lg_config_k;

        let hip_accum = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("hip_accum"))?;
        let kxq0 = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("kxq0"))?;
        let kxq1 = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("kxq1"))?;
        let num_zeros = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("num_at_cur_min"))?;
        let aux_count = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("aux_count"))?;

        if num_zeros > k {
            return Err(Error::out_of_range(format!(
                "num_at_cur_min {num_zeros} exceeds {k} registers"
            )));
        }
        if aux_count != 0 {
            return Err(Error::deserial(format!(
                "8-bit representation carries no exceptions, got aux_count {aux_count}"
            )));
        }

        let mut data = vec![0u8; k as usize];
        cursor
            .read_exact(&mut data)
            .map_err(|_| Error::insufficient_data("register array"))?;

        let mut estimator = HipEstimator::new(lg_config_k);
        estimator.set_kxq0(kxq0);
        estimator.set_kxq1(kxq1);
        estimator.set_out_of_order(ooo);
        // Restore the accumulator after the flag: setting the flag clears it.
        estimator.set_hip_accum(hip_accum);

        Ok(Self {
            lg_config_k,
            bytes: data.into_boxed_slice(),
            num_zeros,
            estimator,
        })
    }

    /// Serialize to the full HLL-mode layout
    pub(crate) fn serialize(&self, lg_config_k: u8) -> Vec<u8> {
        let total_size = HLL_PREAMBLE_SIZE + self.bytes.len();
        let mut bytes = SketchBytes::with_capacity(total_size);

        write_hll_preamble(
            &mut bytes,
            lg_config_k,
            0, // cur_min is always 0 for Array8
            TGT_HLL8,
            self.estimator.is_out_of_order(),
        );

        bytes.write_f64_le(self.estimator.hip_accum());
        bytes.write_f64_le(self.estimator.kxq0());
        bytes.write_f64_le(self.estimator.kxq1());
        bytes.write_u32_le(self.num_zeros);
        bytes.write_u32_le(0); // aux_count is always 0 for Array8

        bytes.write(&self.bytes);

        bytes.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hll::pack_coupon;

    #[test]
    fn test_storage_calculation() {
        assert_eq!(Array8::new(4).size_bytes(), 16);
        assert_eq!(Array8::new(8).size_bytes(), 256);
        assert_eq!(Array8::new(14).size_bytes(), 16384);
    }

    #[test]
    fn test_update_basic() {
        let mut arr = Array8::new(4);

        arr.update(pack_coupon(0, 5));
        assert_eq!(arr.get(0), 5);

        // A smaller value is ignored
        arr.update(pack_coupon(0, 3));
        assert_eq!(arr.get(0), 5);

        arr.update(pack_coupon(0, 42));
        assert_eq!(arr.get(0), 42);

        // Max coupon value (6 bits)
        arr.update(pack_coupon(1, 63));
        assert_eq!(arr.get(1), 63);
    }

    #[test]
    fn test_num_zeros_tracking() {
        let mut arr = Array8::new(4); // 16 slots
        assert_eq!(arr.num_zeros(), 16);

        arr.update(pack_coupon(0, 5));
        assert_eq!(arr.num_zeros(), 15);

        arr.update(pack_coupon(0, 10));
        assert_eq!(arr.num_zeros(), 15);

        for i in 1..16 {
            arr.update(pack_coupon(i, 1));
        }
        assert_eq!(arr.num_zeros(), 0);
    }

    #[test]
    fn test_estimate_is_reasonable() {
        let mut arr = Array8::new(10); // 1024 registers

        assert_eq!(arr.estimate(), 0.0);

        for i in 0..10_000u64 {
            arr.update(crate::hll::coupon_from_hash(crate::hll::hash64(i)));
        }

        let estimate = arr.estimate();
        assert!(estimate.is_finite());
        assert!(estimate > 1_000.0, "estimate too low: {estimate}");
        assert!(estimate < 100_000.0, "estimate too high: {estimate}");
    }
}
