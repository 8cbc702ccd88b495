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

//! The leveled backing buffer of a KLL sketch.
//!
//! One growable buffer holds every retained item; level *i* occupies the
//! contiguous half-open range `[level_start[i], level_start[i+1])`. Free
//! space sits below level 0 and level 0 grows downward into it, so the
//! retained items always form the contiguous tail of the buffer and the
//! offset array is exactly what the wire format stores. Levels above 0 are
//! kept sorted; level 0 holds raw inserted items.

use super::sketch::KllItem;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeveledBuffer<T> {
    items: Vec<T>,
    /// `num_levels + 1` ascending offsets; the last is always `items.len()`.
    level_start: Vec<u32>,
}

impl<T: KllItem> LeveledBuffer<T> {
    /// An empty single-level buffer of the given total capacity.
    pub fn new(total_capacity: u32) -> Self {
        Self {
            items: vec![T::default(); total_capacity as usize],
            level_start: vec![total_capacity, total_capacity],
        }
    }

    /// Rebuild from per-level item runs, with at least `min_capacity` slots.
    ///
    /// The runs are placed against the end of the buffer with all free space
    /// below level 0.
    pub fn from_levels(levels: Vec<Vec<T>>, min_capacity: u32) -> Self {
        let retained: usize = levels.iter().map(Vec::len).sum();
        let capacity = (min_capacity as usize).max(retained);

        let mut items = vec![T::default(); capacity];
        let mut level_start = Vec::with_capacity(levels.len() + 1);
        let mut offset = capacity - retained;
        level_start.push(offset as u32);
        for level in levels {
            for item in level {
                items[offset] = item;
                offset += 1;
            }
            level_start.push(offset as u32);
        }

        Self { items, level_start }
    }

    /// Reassemble from deserialized parts. Offsets must already be validated.
    pub fn from_parts(items: Vec<T>, level_start: Vec<u32>) -> Self {
        debug_assert!(level_start.len() >= 2);
        debug_assert_eq!(*level_start.last().unwrap() as usize, items.len());
        Self { items, level_start }
    }

    pub fn num_levels(&self) -> usize {
        self.level_start.len() - 1
    }

    pub fn num_retained(&self) -> usize {
        (self.level_start[self.num_levels()] - self.level_start[0]) as usize
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// First offset of a level's range.
    pub fn level_offset(&self, level: usize) -> u32 {
        self.level_start[level]
    }

    pub fn level_len(&self, level: usize) -> usize {
        (self.level_start[level + 1] - self.level_start[level]) as usize
    }

    pub fn level(&self, level: usize) -> &[T] {
        &self.items[self.level_start[level] as usize..self.level_start[level + 1] as usize]
    }

    /// The contiguous retained run (all levels in order).
    pub fn retained(&self) -> &[T] {
        &self.items[self.level_start[0] as usize..]
    }

    /// Sizes of all levels, bottom first.
    pub fn level_sizes(&self) -> Vec<usize> {
        (0..self.num_levels()).map(|l| self.level_len(l)).collect()
    }

    /// Append an item to level 0, which grows downward into the free region.
    ///
    /// The caller must have compacted first if no free space remains.
    pub fn push_level_zero(&mut self, item: T) {
        debug_assert!(self.level_start[0] > 0, "no free space below level 0");
        self.level_start[0] -= 1;
        self.items[self.level_start[0] as usize] = item;
    }

    /// Add an empty top level, growing the buffer by `delta_cap` slots.
    ///
    /// Existing data shifts up by `delta_cap`, so the freed space lands below
    /// level 0 and the new top level is an empty range at the very end.
    pub fn add_empty_top_level(&mut self, delta_cap: u32) {
        let old_len = self.items.len();
        let new_len = old_len + delta_cap as usize;

        let mut new_items = vec![T::default(); new_len];
        for (i, item) in self.items.iter().enumerate() {
            new_items[i + delta_cap as usize] = item.clone();
        }
        self.items = new_items;

        for offset in self.level_start.iter_mut() {
            *offset += delta_cap;
        }
        self.level_start.push(new_len as u32);
    }

    /// Direct access for in-place compaction.
    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Move a level boundary. Only the compaction path may do this.
    pub fn set_level_offset(&mut self, level: usize, offset: u32) {
        self.level_start[level] = offset;
    }

    /// Shift the data of all levels below `level` up by `amount` slots,
    /// closing the gap a compaction opened underneath them.
    ///
    /// `old_level_begin` is the start of the compacted level's range before
    /// the compaction moved its boundary.
    pub fn shift_lower_levels_up(&mut self, level: usize, old_level_begin: u32, amount: u32) {
        let lowest = self.level_start[0] as usize;
        let count = old_level_begin as usize - lowest;
        // Move backward so overlapping ranges stay intact.
        for idx in (0..count).rev() {
            self.items[lowest + amount as usize + idx] = self.items[lowest + idx].clone();
        }
        for lvl in 0..level {
            self.level_start[lvl] += amount;
        }
    }

    /// Shrink (or grow) the buffer to exactly `capacity`, keeping the
    /// retained run against the end.
    pub fn repack(&mut self, capacity: u32) {
        if self.capacity() == capacity as usize {
            return;
        }
        let levels: Vec<Vec<T>> = (0..self.num_levels())
            .map(|l| self.level(l).to_vec())
            .collect();
        *self = Self::from_levels(levels, capacity);
    }
}
