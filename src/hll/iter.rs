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

//! Lazy (slot, value) iterators over the dense register representations
//!
//! One variant exists per register width. Each holds a shared reference to
//! its store and O(1) cursor state; a fresh iterator must be constructed to
//! re-traverse. The 6-bit variant decodes exactly six bits per advance from
//! a running bit offset, independent of byte alignment.

use crate::hll::array4::Array4;
use crate::hll::array6::Array6;
use crate::hll::array6::VAL_MASK_6;

/// Iterator over the registers of an [`Array4`]
///
/// Yields true values, with the cur_min offset applied and exceptions
/// resolved through the aux map.
pub struct Array4Iter<'a> {
    array: &'a Array4,
    slot: u32,
}

impl<'a> Array4Iter<'a> {
    pub(crate) fn new(array: &'a Array4) -> Self {
        Self { array, slot: 0 }
    }
}

impl Iterator for Array4Iter<'_> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if self.slot >= self.array.num_registers() {
            return None;
        }
        let slot = self.slot;
        self.slot += 1;
        Some((slot, self.array.get(slot)))
    }
}

/// Iterator over the registers of an [`Array6`]
///
/// Tracks a running bit offset and decodes a 6-bit window per advance.
pub struct Array6Iter<'a> {
    array: &'a Array6,
    slot: u32,
    bit_offset: usize,
}

impl<'a> Array6Iter<'a> {
    pub(crate) fn new(array: &'a Array6) -> Self {
        Self {
            array,
            slot: 0,
            bit_offset: 0,
        }
    }
}

impl Iterator for Array6Iter<'_> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if self.slot >= self.array.num_registers() {
            return None;
        }
        let slot = self.slot;

        let bytes = self.array.bytes();
        let byte_idx = self.bit_offset >> 3;
        let shift = (self.bit_offset & 7) as u16;
        let window = u16::from_le_bytes([bytes[byte_idx], bytes[byte_idx + 1]]);
        let value = ((window >> shift) & VAL_MASK_6) as u8;

        self.slot += 1;
        self.bit_offset += 6;
        Some((slot, value))
    }
}

/// Iterator over the registers of an `Array8`
pub struct Array8Iter<'a> {
    bytes: &'a [u8],
    slot: usize,
}

impl<'a> Array8Iter<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, slot: 0 }
    }
}

impl Iterator for Array8Iter<'_> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if self.slot >= self.bytes.len() {
            return None;
        }
        let slot = self.slot;
        self.slot += 1;
        Some((slot as u32, self.bytes[slot]))
    }
}
