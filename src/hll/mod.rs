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

//! HyperLogLog sketch implementation for cardinality estimation.
//!
//! This module provides a probabilistic data structure for estimating the cardinality
//! (number of distinct elements) of large datasets with high accuracy and low memory usage.
//!
//! # Overview
//!
//! HyperLogLog (HLL) sketches summarize 64-bit hashes of input items in
//! logarithmic space. The sketch adapts its storage representation as the
//! observed cardinality grows:
//!
//! - **List mode**: stores individual coupons for small cardinalities
//! - **Set mode**: uses a hash set of coupons for medium cardinalities
//! - **HLL mode**: uses a dense bit-packed register array for large cardinalities
//!
//! Mode transitions are automatic, one-directional, and transparent to the
//! caller. Each promotion re-inserts all previously observed coupons and
//! preserves the max-value-per-register invariant.
//!
//! # Coupons
//!
//! A coupon is a 32-bit value encoding both a slot number (26 bits) and a value
//! (6 bits). The slot identifies which register to update, and the value is the
//! number of leading zeros in the remaining hash bits plus one.
//!
//! # HLL Types
//!
//! Three target dense representations are supported, trading precision for memory:
//!
//! - [`HllType::Hll4`]: 4 bits per register plus an exception table (most compact)
//! - [`HllType::Hll6`]: 6 bits per register (balanced)
//! - [`HllType::Hll8`]: 8 bits per register (fastest)
//!
//! # Hashing
//!
//! The engine itself consumes pre-computed 64-bit hashes via
//! [`HllSketch::update_hash64`]; it never hashes raw bytes. The convenience
//! method [`HllSketch::update`] accepts any `Hash` value and feeds it through
//! a murmur3 hasher with a fixed seed, so equal logical values map to equal
//! coupons across processes.
//!
//! # Usage
//!
//! ```rust
//! # use streamsketch::hll::HllSketch;
//! # use streamsketch::hll::HllType;
//! let mut sketch = HllSketch::new(12, HllType::Hll8);
//! sketch.update("apple");
//! sketch.update("banana");
//! assert!(sketch.estimate() >= 2.0);
//! ```

use std::hash::Hash;

mod array4;
mod array6;
mod array8;
mod aux_map;
mod container;
mod coupon_mapping;
mod cubic_interpolation;
mod estimator;
mod harmonic_numbers;
mod hash_set;
mod iter;
mod list;
mod mode;
mod serialization;
mod sketch;
mod union;

pub use self::sketch::CurMode;
pub use self::sketch::HllSketch;

/// Target dense representation of an HLL sketch.
///
/// See the [module level documentation](self) for more details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HllType {
    /// Uses a 4-bit field per HLL register and for large counts may require a
    /// small internal auxiliary table for storing statistical exceptions,
    /// which are rare. Smallest storage footprint of about K/2 bytes.
    Hll4,
    /// Uses a 6-bit field per HLL register, with a storage footprint of
    /// about 3/4 * K bytes.
    Hll6,
    /// Uses one byte per HLL register. Fastest updates but the largest
    /// storage footprint of about K bytes.
    Hll8,
}

const KEY_BITS_26: u32 = 26;
const KEY_MASK_26: u32 = (1 << KEY_BITS_26) - 1;

const COUPON_RSE_FACTOR: f64 = 0.409; // At transition point not the asymptote
const COUPON_RSE: f64 = COUPON_RSE_FACTOR / (1 << 13) as f64;

const RESIZE_NUMERATOR: u32 = 3; // Resize at 3/4 = 75% load factor
const RESIZE_DENOMINATOR: u32 = 4;

/// Extract slot number (low 26 bits) from coupon
#[inline]
fn get_slot(coupon: u32) -> u32 {
    coupon & KEY_MASK_26
}

/// Extract value (upper 6 bits) from coupon
#[inline]
fn get_value(coupon: u32) -> u8 {
    (coupon >> KEY_BITS_26) as u8
}

/// Pack slot number and value into a coupon
///
/// Format: [value (6 bits) << 26] | [slot (26 bits)]
#[inline]
fn pack_coupon(slot: u32, value: u8) -> u32 {
    ((value as u32) << KEY_BITS_26) | (slot & KEY_MASK_26)
}

/// Derive a coupon from an externally computed 64-bit hash.
///
/// The slot comes from the low 26 bits; the value is one plus the number of
/// leading zeros in the remaining 38-bit slice, capped so it fits the coupon's
/// 6-bit value field.
#[inline]
fn coupon_from_hash(hash: u64) -> u32 {
    let addr26 = hash as u32 & KEY_MASK_26;
    let rest = hash >> KEY_BITS_26;
    // `rest` has its top 26 bits clear, so subtracting re-bases the count
    // onto the 38-bit slice.
    let lz = (rest.leading_zeros() - KEY_BITS_26).min(62);
    pack_coupon(addr26, (lz + 1) as u8)
}

/// Hash a value to 64 bits with the process-wide sketch seed.
fn hash64<H: Hash>(v: H) -> u64 {
    const DEFAULT_SEED: u32 = 9001;

    let mut hasher = mur3::Hasher128::with_seed(DEFAULT_SEED);
    v.hash(&mut hasher);
    let (lo, _hi) = hasher.finish128();
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_coupon() {
        let slot = 12345u32;
        let value = 42u8;
        let coupon = pack_coupon(slot, value);
        assert_eq!(get_slot(coupon), slot);
        assert_eq!(get_value(coupon), value);
    }

    #[test]
    fn test_coupon_from_hash_bounds() {
        // All-zero upper slice yields the capped maximum value.
        let coupon = coupon_from_hash(0x03ff_ffff);
        assert_eq!(get_slot(coupon), 0x03ff_ffff);
        assert_eq!(get_value(coupon), 39);

        // Top bit set yields value 1.
        let coupon = coupon_from_hash(1u64 << 63);
        assert_eq!(get_value(coupon), 1);
    }

    #[test]
    fn test_hash64_is_stable_for_equal_values() {
        assert_eq!(hash64("apple"), hash64("apple"));
        assert_ne!(hash64("apple"), hash64("banana"));
    }
}
