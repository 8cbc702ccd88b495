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

//! HLL Array6 mode - 6-bit packed representation
//!
//! Array6 stores HLL register values using 6 bits per slot, providing a range
//! of 0-63. This is sufficient without exception handling or the cur_min
//! optimization used by Array4.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::hll::array4::write_hll_preamble;
use crate::hll::estimator::HipEstimator;
use crate::hll::get_slot;
use crate::hll::get_value;
use crate::hll::iter::Array6Iter;
use crate::hll::serialization::*;

pub(crate) const VAL_MASK_6: u16 = 0x3F; // 6 bits: 0b0011_1111

/// Core Array6 data structure - stores 6-bit values with cross-byte packing
#[derive(Debug, Clone, PartialEq)]
pub struct Array6 {
    lg_config_k: u8,
    /// Packed 6-bit values, may cross byte boundaries
    bytes: Box<[u8]>,
    /// Count of slots with value 0
    num_zeros: u32,
    /// HIP estimator for cardinality estimation
    estimator: HipEstimator,
}

impl Array6 {
    pub fn new(lg_config_k: u8) -> Self {
        let k = 1 << lg_config_k;
        let num_bytes = num_bytes_for_k(k);

        Self {
            lg_config_k,
            bytes: vec![0u8; num_bytes].into_boxed_slice(),
            num_zeros: k,
            estimator: HipEstimator::new(lg_config_k),
        }
    }

    pub fn num_registers(&self) -> u32 {
        1 << self.lg_config_k
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_zeros == self.num_registers()
    }

    /// Packed byte array, exposed for the bit-offset iterator
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get value from a slot (6-bit value)
    ///
    /// Uses 16-bit window reads to handle values crossing byte boundaries.
    #[inline]
    fn get_raw(&self, slot: u32) -> u8 {
        let start_bit = slot * 6;
        let byte_idx = (start_bit >> 3) as usize;
        let shift = (start_bit & 7) as u8;

        // Read 2 bytes as u16 (little-endian)
        let two_bytes = u16::from_le_bytes([self.bytes[byte_idx], self.bytes[byte_idx + 1]]);

        // Extract 6 bits at the shift position
        ((two_bytes >> shift) & VAL_MASK_6) as u8
    }

    /// Set value in a slot (6-bit value)
    ///
    /// Uses read-modify-write on a 16-bit window to preserve surrounding bits.
    #[inline]
    fn put_raw(&mut self, slot: u32, value: u8) {
        debug_assert!(value <= 63, "6-bit value must be 0-63");

        let start_bit = slot * 6;
        let byte_idx = (start_bit >> 3) as usize;
        let shift = (start_bit & 0x7) as u8;

        let mut two_bytes = u16::from_le_bytes([self.bytes[byte_idx], self.bytes[byte_idx + 1]]);

        // Clear the 6-bit slot, then insert the new value
        two_bytes &= !(VAL_MASK_6 << shift);
        two_bytes |= ((value as u16) & VAL_MASK_6) << shift;

        let bytes_out = two_bytes.to_le_bytes();
        self.bytes[byte_idx] = bytes_out[0];
        self.bytes[byte_idx + 1] = bytes_out[1];
    }

    /// Get value for a slot (public API)
    pub fn get(&self, slot: u32) -> u8 {
        self.get_raw(slot)
    }

    /// Update with a coupon
    pub fn update(&mut self, coupon: u32) {
        let mask = (1 << self.lg_config_k) - 1;
        let slot = get_slot(coupon) & mask;
        let new_value = get_value(coupon);

        let old_value = self.get_raw(slot);

        if new_value > old_value {
            self.estimator
                .update(self.lg_config_k, old_value, new_value);
            self.put_raw(slot, new_value);

            if old_value == 0 {
                self.num_zeros -= 1;
            }
        }
    }

    /// Get the current cardinality estimate
    pub fn estimate(&self) -> f64 {
        // Array6 doesn't use cur_min (always 0), so num_at_cur_min = num_zeros
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
    pub fn iter(&self) -> Array6Iter<'_> {
        Array6Iter::new(self)
    }

    /// Deserialize the Array6 payload following the 8-byte preamble
    pub(crate) fn deserialize(
        cursor: &mut SketchSlice<'_>,
        lg_config_k: u8,
        ooo: bool,
    ) -> Result<Self, Error> {
        let k = 1u32 << lg_config_k;
        let num_bytes = num_bytes_for_k(k);

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
                "6-bit representation carries no exceptions, got aux_count {aux_count}"
            )));
        }

        let mut data = vec![0u8; num_bytes];
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
            0, // cur_min is always 0 for Array6
            TGT_HLL6,
            self.estimator.is_out_of_order(),
        );

        bytes.write_f64_le(self.estimator.hip_accum());
        bytes.write_f64_le(self.estimator.kxq0());
        bytes.write_f64_le(self.estimator.kxq1());
        bytes.write_u32_le(self.num_zeros);
        bytes.write_u32_le(0); // aux_count is always 0 for Array6

        bytes.write(&self.bytes);

        bytes.into_bytes()
    }
}

/// Calculate number of bytes needed for k slots with 6 bits each
///
/// One extra byte keeps the 16-bit window reads of the codec in bounds.
fn num_bytes_for_k(k: u32) -> usize {
    (((k * 3) >> 2) + 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hll::pack_coupon;

    #[test]
    fn test_num_bytes_calculation() {
        // k=16 slots: 16 * 6 bits = 96 bits = 12 bytes (+1 window byte)
        assert_eq!(num_bytes_for_k(16), 13);
        // k=1024: 1024 * 6 bits = 6144 bits = 768 bytes (+1 window byte)
        assert_eq!(num_bytes_for_k(1024), 769);
        assert_eq!(Array6::new(10).size_bytes(), 769);
    }

    #[test]
    fn test_get_set_raw() {
        let mut arr = Array6::new(4); // 16 slots

        arr.put_raw(0, 0);
        arr.put_raw(1, 1);
        arr.put_raw(2, 31);
        arr.put_raw(3, 63); // Max 6-bit value

        assert_eq!(arr.get_raw(0), 0);
        assert_eq!(arr.get_raw(1), 1);
        assert_eq!(arr.get_raw(2), 31);
        assert_eq!(arr.get_raw(3), 63);

        // No cross-slot corruption
        for slot in 0..16 {
            arr.put_raw(slot, (slot % 64) as u8);
        }
        for slot in 0..16 {
            assert_eq!(arr.get_raw(slot), (slot % 64) as u8);
        }
    }

    #[test]
    fn test_boundary_crossing() {
        let mut arr = Array6::new(8); // 256 slots

        // Slot 1 starts at bit 6 and crosses the byte 0/1 boundary
        arr.put_raw(1, 0b111111);
        assert_eq!(arr.get_raw(1), 63);

        // Slot 3 starts at bit 18 and crosses the byte 2/3 boundary
        arr.put_raw(3, 0b110011);
        assert_eq!(arr.get_raw(3), 51);

        assert_eq!(arr.get_raw(1), 63);
    }

    #[test]
    fn test_num_zeros_tracking() {
        let mut arr = Array6::new(4); // 16 slots
        assert_eq!(arr.num_zeros(), 16);

        arr.update(pack_coupon(0, 5));
        assert_eq!(arr.num_zeros(), 15);

        // Same slot again does not change the count
        arr.update(pack_coupon(0, 10));
        assert_eq!(arr.num_zeros(), 15);

        arr.update(pack_coupon(1, 3));
        assert_eq!(arr.num_zeros(), 14);
    }

    #[test]
    fn test_estimate_is_reasonable() {
        let mut arr = Array6::new(10); // 1024 registers

        assert_eq!(arr.estimate(), 0.0);
        assert!(!arr.is_out_of_order());

        for i in 0..10_000u64 {
            arr.update(crate::hll::coupon_from_hash(crate::hll::hash64(i)));
        }

        let estimate = arr.estimate();
        assert!(estimate.is_finite());
        assert!(estimate > 1_000.0, "estimate too low: {estimate}");
        assert!(estimate < 100_000.0, "estimate too high: {estimate}");
    }
}
