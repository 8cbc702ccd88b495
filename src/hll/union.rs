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

//! Union (merge) of two cardinality sketches
//!
//! Union requires both sketches to share the same `lg_config_k`. The receiver
//! absorbs the other sketch by max-merging registers (or replaying coupons),
//! so the result's mode is at least as dense as either input's and no mode
//! ever goes backward.

use crate::error::Error;
use crate::hll::HllSketch;
use crate::hll::mode::Mode;
use crate::hll::pack_coupon;
use crate::hll::sketch::promote_container_to_array;

impl HllSketch {
    /// Merge another sketch into this one.
    ///
    /// Both sketches must have been constructed with the same `lg_config_k`;
    /// otherwise a `ConfigMismatch` error is returned and the receiver is
    /// left untouched. The other sketch is only read.
    ///
    /// A sparse source is replayed coupon by coupon through the normal update
    /// path, which keeps the receiver's estimator sequence intact. A dense
    /// source forces the receiver dense (at its own target width) and
    /// max-merges registers, after which the receiver's estimator switches to
    /// the out-of-order composite estimate.
    pub fn union(&mut self, other: &HllSketch) -> Result<(), Error> {
        if self.lg_config_k() != other.lg_config_k() {
            return Err(Error::config_mismatch("lg_config_k differs")
                .with_context("receiver", self.lg_config_k())
                .with_context("other", other.lg_config_k()));
        }

        if other.is_empty() {
            return Ok(());
        }

        match other.mode() {
            Mode::List { list, .. } => {
                for coupon in list.container().iter() {
                    self.update_with_coupon(coupon);
                }
            }
            Mode::Set { set, .. } => {
                for coupon in set.container().iter() {
                    self.update_with_coupon(coupon);
                }
            }
            dense => {
                self.promote_to_dense();
                self.max_merge_registers(dense);
                self.mark_out_of_order();
            }
        }

        Ok(())
    }

    /// Force the receiver into its target dense representation.
    fn promote_to_dense(&mut self) {
        let lg_config_k = self.lg_config_k();
        let new_mode = match self.mode() {
            Mode::List { list, hll_type } => {
                Some(promote_container_to_array(list.container(), *hll_type, lg_config_k))
            }
            Mode::Set { set, hll_type } => {
                Some(promote_container_to_array(set.container(), *hll_type, lg_config_k))
            }
            Mode::Array4(_) | Mode::Array6(_) | Mode::Array8(_) => None,
        };
        if let Some(mode) = new_mode {
            *self = HllSketch::from_mode(lg_config_k, mode);
        }
    }

    /// Max-merge every register of a dense source into the receiver.
    ///
    /// The receiver must already be dense. Values above the receiver's
    /// register width are routed to its exception table by the normal update
    /// path (4-bit case).
    fn max_merge_registers(&mut self, src: &Mode) {
        let pairs: Box<dyn Iterator<Item = (u32, u8)> + '_> = match src {
            Mode::Array4(arr) => Box::new(arr.iter()),
            Mode::Array6(arr) => Box::new(arr.iter()),
            Mode::Array8(arr) => Box::new(arr.iter()),
            Mode::List { .. } | Mode::Set { .. } => {
                unreachable!("max_merge_registers called with a sparse source")
            }
        };

        for (slot, value) in pairs {
            if value > 0 {
                self.update_with_coupon(pack_coupon(slot, value));
            }
        }
    }

    /// Switch the receiver's estimator to the out-of-order composite form.
    fn mark_out_of_order(&mut self) {
        match self.mode_mut() {
            Mode::Array4(arr) => arr.set_out_of_order(true),
            Mode::Array6(arr) => arr.set_out_of_order(true),
            Mode::Array8(arr) => arr.set_out_of_order(true),
            Mode::List { .. } | Mode::Set { .. } => {
                unreachable!("receiver must be dense after a dense union")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::hll::CurMode;
    use crate::hll::HllSketch;
    use crate::hll::HllType;
    use crate::hll::mode::Mode;

    #[test]
    fn test_union_rejects_mismatched_lg_k() {
        let mut a = HllSketch::new(12, HllType::Hll8);
        let b = HllSketch::new(14, HllType::Hll8);
        let err = a.union(&b).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigMismatch);
    }

    #[test]
    fn test_union_of_empty_is_noop() {
        let mut a = HllSketch::new(12, HllType::Hll8);
        a.update("x");
        let before = a.clone();
        let b = HllSketch::new(12, HllType::Hll8);
        a.union(&b).unwrap();
        assert_eq!(a, before);
    }

    #[test]
    fn test_dense_union_marks_out_of_order() {
        let mut a = HllSketch::new(10, HllType::Hll8);
        let mut b = HllSketch::new(10, HllType::Hll8);
        for i in 0..2000u64 {
            b.update(i);
        }
        assert_eq!(b.cur_mode(), CurMode::Hll);

        a.union(&b).unwrap();
        assert_eq!(a.cur_mode(), CurMode::Hll);
        match a.mode() {
            Mode::Array8(arr) => assert!(arr.is_out_of_order()),
            other => panic!("unexpected mode {other:?}"),
        }
    }
}
