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

//! HLL Array4 mode - 4-bit packed representation with exception handling
//!
//! Array4 stores HLL register values using 4 bits per slot (2 slots per byte).
//! When values exceed 4 bits after the cur_min offset, they're stored in an
//! auxiliary hash map owned by this engine variant; the packed byte array
//! itself stays a pure fixed-width codec.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::hll::aux_map::AuxMap;
use crate::hll::estimator::HipEstimator;
use crate::hll::get_slot;
use crate::hll::get_value;
use crate::hll::iter::Array4Iter;
use crate::hll::pack_coupon;
use crate::hll::serialization::*;

/// Nibble value marking a slot whose true value lives in the aux map
const AUX_TOKEN: u8 = 15;

/// Core Array4 data structure - stores 4-bit values efficiently
#[derive(Debug, Clone, PartialEq)]
pub struct Array4 {
    lg_config_k: u8,
    /// Packed 4-bit values: 2 values per byte
    /// Even slots use low nibble, odd slots use high nibble
    bytes: Box<[u8]>,
    /// Current minimum value offset (optimization to delay aux map creation)
    cur_min: u8,
    /// Count of slots at exactly cur_min (when 0, increment cur_min)
    num_at_cur_min: u32,
    /// Exception table for values >= 15 after cur_min offset
    aux_map: Option<AuxMap>,
    /// HIP estimator for cardinality estimation
    estimator: HipEstimator,
}

impl Array4 {
    pub fn new(lg_config_k: u8) -> Self {
        let num_bytes = 1 << (lg_config_k - 1);
        let num_at_cur_min = 1 << lg_config_k;
        Self {
            lg_config_k,
            bytes: vec![0u8; num_bytes].into_boxed_slice(),
            cur_min: 0,
            num_at_cur_min,
            aux_map: None,
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
        self.cur_min == 0 && self.num_at_cur_min == self.num_registers()
    }

    /// Get raw 4-bit value from slot (not adjusted for cur_min)
    #[inline]
    fn get_raw(&self, slot: u32) -> u8 {
        debug_assert!(slot >> 1 < self.bytes.len() as u32);

        let byte = self.bytes[(slot >> 1) as usize];
        if slot & 1 == 0 {
            byte & 15 // low nibble for even slots
        } else {
            byte >> 4 // high nibble for odd slots
        }
    }

    /// Set raw 4-bit value in slot
    #[inline]
    fn put_raw(&mut self, slot: u32, value: u8) {
        debug_assert!(value <= AUX_TOKEN);
        debug_assert!(slot >> 1 < self.bytes.len() as u32);

        let byte_idx = (slot >> 1) as usize;
        let old_byte = self.bytes[byte_idx];
        self.bytes[byte_idx] = if slot & 1 == 0 {
            (old_byte & 0xF0) | (value & 0x0F) // set low nibble
        } else {
            (old_byte & 0x0F) | (value << 4) // set high nibble
        };
    }

    /// Get actual value for slot (adjusted for cur_min and aux map)
    pub fn get(&self, slot: u32) -> u8 {
        let raw = self.get_raw(slot);
        if raw < AUX_TOKEN {
            raw + self.cur_min
        } else {
            // raw == AUX_TOKEN, lookup in aux map
            self.aux_map
                .as_ref()
                .expect("AUX_TOKEN present but no aux map")
                .get(slot)
                .expect("AUX_TOKEN but slot not in aux map")
        }
    }

    pub fn update(&mut self, coupon: u32) {
        let mask = (1 << self.lg_config_k) - 1;
        let slot = get_slot(coupon) & mask;
        let new_value = get_value(coupon);

        // Quick rejection: if new value <= cur_min, no update needed
        if new_value <= self.cur_min {
            return;
        }

        let raw_stored = self.get_raw(slot);
        let lower_bound = raw_stored + self.cur_min;

        if new_value <= lower_bound {
            return;
        }

        // Get actual old value (might be in aux map)
        let old_value = if raw_stored < AUX_TOKEN {
            lower_bound
        } else {
            self.aux_map
                .as_ref()
                .expect("AUX_TOKEN without aux_map")
                .get(slot)
                .expect("AUX_TOKEN but slot not in aux_map")
        };

        if new_value <= old_value {
            return;
        }

        // Update HIP and KxQ registers via estimator
        self.estimator
            .update(self.lg_config_k, old_value, new_value);

        let shifted_new = new_value - self.cur_min;

        // Four cases based on old/new exception status
        match (raw_stored, shifted_new) {
            // Case 1: Both old and new are exceptions
            (AUX_TOKEN, shifted) if shifted >= AUX_TOKEN => {
                self.aux_map
                    .as_mut()
                    .expect("AUX_TOKEN without aux_map")
                    .replace(slot, new_value);
            }
            // Case 2: Old is exception, new is not (impossible without cur_min change)
            (AUX_TOKEN, _) => {
                unreachable!("AUX_TOKEN present with non-exception new value");
            }
            // Case 3: Old not exception, new is exception
            (_, shifted) if shifted >= AUX_TOKEN => {
                self.put_raw(slot, AUX_TOKEN);
                let aux = self
                    .aux_map
                    .get_or_insert_with(|| AuxMap::new(self.lg_config_k));
                aux.insert(slot, new_value);
            }
            // Case 4: Neither is exception
            _ => {
                self.put_raw(slot, shifted_new);
            }
        }

        // Handle cur_min adjustment
        if old_value == self.cur_min {
            self.num_at_cur_min -= 1;
            while self.num_at_cur_min == 0 {
                self.shift_to_bigger_cur_min();
            }
        }
    }

    /// Increment cur_min and adjust all values
    ///
    /// This is called when no slots remain at the cur_min value.
    /// All stored values are decremented by 1, and exceptions
    /// that fall back into the 4-bit range are moved out of the aux map.
    fn shift_to_bigger_cur_min(&mut self) {
        let new_cur_min = self.cur_min + 1;
        let k = 1 << self.lg_config_k;
        let mut num_at_new = 0;

        // Decrement all stored values in the main array
        for slot in 0..k {
            let raw = self.get_raw(slot);
            debug_assert_ne!(raw, 0, "value cannot be 0 when shifting cur_min");
            if raw < AUX_TOKEN {
                let decremented = raw - 1;
                self.put_raw(slot, decremented);
                if decremented == 0 {
                    num_at_new += 1;
                }
            }
        }

        // Rebuild aux map: some exceptions may no longer be exceptions
        if let Some(old_aux) = self.aux_map.take() {
            let mut new_aux = None;

            for (slot, old_actual_val) in old_aux.into_iter() {
                let new_shifted = old_actual_val - new_cur_min;

                if new_shifted < AUX_TOKEN {
                    self.put_raw(slot, new_shifted);
                } else {
                    // Still an exception
                    let aux = new_aux.get_or_insert_with(|| AuxMap::new(self.lg_config_k));
                    aux.insert(slot, old_actual_val);
                }
            }
            self.aux_map = new_aux;
        }

        self.cur_min = new_cur_min;
        self.num_at_cur_min = num_at_new;
    }

    /// Get the current cardinality estimate
    pub fn estimate(&self) -> f64 {
        self.estimator
            .estimate(self.lg_config_k, self.cur_min, self.num_at_cur_min)
    }

    /// Get upper confidence bound for the cardinality estimate
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .upper_bound(self.lg_config_k, self.cur_min, self.num_at_cur_min, num_std_dev)
    }

    /// Get lower confidence bound for the cardinality estimate
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.estimator
            .lower_bound(self.lg_config_k, self.cur_min, self.num_at_cur_min, num_std_dev)
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
    pub fn iter(&self) -> Array4Iter<'_> {
        Array4Iter::new(self)
    }

    /// Deserialize the Array4 payload following the 8-byte preamble
    pub(crate) fn deserialize(
        cursor: &mut SketchSlice<'_>,
        lg_config_k: u8,
        cur_min: u8,
        ooo: bool,
    ) -> Result<Self, Error> {
        let k = 1u32 << lg_config_k;
        let num_bytes = 1usize << (lg_config_k - 1);

        let hip_accum = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("hip_accum"))?;
        let kxq0 = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("kxq0"))?;
        let kxq1 = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("kxq1"))?;
        let num_at_cur_min = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("num_at_cur_min"))?;
        let aux_count = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("aux_count"))?;

        if num_at_cur_min > k {
            return Err(Error::out_of_range(format!(
                "num_at_cur_min {num_at_cur_min} exceeds {k} registers"
            )));
        }
        if aux_count > k {
            return Err(Error::out_of_range(format!(
                "aux_count {aux_count} exceeds {k} registers"
            )));
        }

        let mut data = vec![0u8; num_bytes];
        cursor
            .read_exact(&mut data)
            .map_err(|_| Error::insufficient_data("register array"))?;

        let mut aux_map = None;
        if aux_count > 0 {
            let mut aux = AuxMap::new(lg_config_k);
            for i in 0..aux_count {
                let coupon = cursor
                    .read_u32_le()
                    .map_err(|_| Error::insufficient_data(format!("aux entry {i}")))?;
                let slot = get_slot(coupon) & (k - 1);
                let value = get_value(coupon);
                if aux.get(slot).is_some() {
                    return Err(Error::deserial(format!(
                        "duplicate aux entry for slot {slot}"
                    )));
                }
                aux.insert(slot, value);
            }
            aux_map = Some(aux);
        }

        let mut estimator = HipEstimator::new(lg_config_k);
        estimator.set_kxq0(kxq0);
        estimator.set_kxq1(kxq1);
        estimator.set_out_of_order(ooo);
        // Restore the accumulator after the flag: setting the flag clears it.
        estimator.set_hip_accum(hip_accum);

        Ok(Self {
            lg_config_k,
            bytes: data.into_boxed_slice(),
            cur_min,
            num_at_cur_min,
            aux_map,
            estimator,
        })
    }

    /// Serialize to the full HLL-mode layout
    pub(crate) fn serialize(&self, lg_config_k: u8) -> Vec<u8> {
        let aux_count = self.aux_map.as_ref().map_or(0, AuxMap::count);
        let total_size = HLL_PREAMBLE_SIZE + self.bytes.len() + aux_count as usize * 4;
        let mut bytes = SketchBytes::with_capacity(total_size);

        write_hll_preamble(
            &mut bytes,
            lg_config_k,
            self.cur_min,
            TGT_HLL4,
            self.estimator.is_out_of_order(),
        );

        bytes.write_f64_le(self.estimator.hip_accum());
        bytes.write_f64_le(self.estimator.kxq0());
        bytes.write_f64_le(self.estimator.kxq1());
        bytes.write_u32_le(self.num_at_cur_min);
        bytes.write_u32_le(aux_count);

        bytes.write(&self.bytes);

        if let Some(aux) = &self.aux_map {
            for (slot, value) in aux.iter() {
                bytes.write_u32_le(pack_coupon(slot, value));
            }
        }

        bytes.into_bytes()
    }
}

/// Write the shared 8-byte HLL-mode preamble
pub(crate) fn write_hll_preamble(
    bytes: &mut SketchBytes,
    lg_config_k: u8,
    cur_min: u8,
    tgt_type: u8,
    out_of_order: bool,
) {
    use crate::codec::family::Family;

    bytes.write_u8(HLL_PREINTS);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(Family::HLL.id);
    bytes.write_u8(lg_config_k);
    bytes.write_u8(0); // lg_arr is not used in HLL mode
    bytes.write_u8(if out_of_order {
        OUT_OF_ORDER_FLAG_MASK
    } else {
        0
    });
    bytes.write_u8(cur_min);
    bytes.write_u8(encode_mode_byte(CUR_MODE_HLL, tgt_type));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_raw() {
        let mut data = Array4::new(4); // 16 registers

        // Even slot uses the low nibble
        data.put_raw(0, 5);
        assert_eq!(data.get_raw(0), 5);

        // Odd slot uses the high nibble
        data.put_raw(1, 7);
        assert_eq!(data.get_raw(1), 7);

        // Both values share the same byte
        assert_eq!(data.bytes[0], 0x75);

        data.put_raw(2, 15);
        data.put_raw(3, 3);
        assert_eq!(data.get_raw(2), 15);
        assert_eq!(data.get_raw(3), 3);
    }

    #[test]
    fn test_update_basic() {
        let mut data = Array4::new(4);

        data.update(pack_coupon(0, 5));
        assert_eq!(data.get(0), 5);

        // A smaller value is ignored
        data.update(pack_coupon(0, 3));
        assert_eq!(data.get(0), 5);

        data.update(pack_coupon(0, 8));
        assert_eq!(data.get(0), 8);
    }

    #[test]
    fn test_exception_values_route_to_aux_map() {
        let mut data = Array4::new(4);

        // cur_min is 0, so any value >= 15 is an exception
        data.update(pack_coupon(2, 20));
        assert_eq!(data.get(2), 20);
        assert_eq!(data.get_raw(2), AUX_TOKEN);
        assert!(data.aux_map.is_some());

        // Raising it further replaces the aux entry
        data.update(pack_coupon(2, 33));
        assert_eq!(data.get(2), 33);
    }

    #[test]
    fn test_cur_min_shift() {
        let mut data = Array4::new(4);

        // Fill every register so num_at_cur_min reaches 0
        for slot in 0..16u32 {
            data.update(pack_coupon(slot, 1));
        }
        assert_eq!(data.cur_min, 1);
        assert_eq!(data.num_at_cur_min, 16);

        // Values are still read correctly after the shift
        for slot in 0..16u32 {
            assert_eq!(data.get(slot), 1);
        }
    }

    #[test]
    fn test_storage_layout() {
        let arr = Array4::new(10);
        assert_eq!(arr.num_registers(), 1024);
        assert_eq!(arr.size_bytes(), 512); // two registers per byte
        assert!(arr.is_empty());
    }

    #[test]
    fn test_estimate_is_reasonable() {
        let mut arr = Array4::new(10); // 1024 registers

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
