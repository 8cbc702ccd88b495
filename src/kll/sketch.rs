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

use std::cmp::Ordering;

use super::DEFAULT_K;
use super::DEFAULT_M;
use super::MAX_K;
use super::MIN_K;
use super::compaction::CompactionOffset;
use super::compaction::halve_down;
use super::compaction::halve_up;
use super::compaction::merge_sorted_runs;
use super::compaction::merge_sorted_vec;
use super::helper::compute_total_capacity;
use super::helper::level_capacity;
use super::helper::sum_the_sample_weights;
use super::levels::LeveledBuffer;
use super::serialization::DATA_START;
use super::serialization::DATA_START_SINGLE_ITEM;
use super::serialization::EMPTY_SIZE_BYTES;
use super::serialization::FLAG_EMPTY;
use super::serialization::FLAG_LEVEL_ZERO_SORTED;
use super::serialization::FLAG_SINGLE_ITEM;
use super::serialization::PREAMBLE_INTS_FULL;
use super::serialization::PREAMBLE_INTS_SHORT;
use super::serialization::SERIAL_VERSION_1;
use super::serialization::SERIAL_VERSION_2;
use super::sorted_view::build_sorted_view;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::family::Family;
use crate::error::Error;

/// Trait implemented by item types supported by [`KllSketch`].
pub(crate) trait KllItem: Clone + Default {
    /// Compare two items.
    fn cmp(a: &Self, b: &Self) -> Ordering;

    /// Returns true if the item is NaN.
    fn is_nan(_value: &Self) -> bool {
        false
    }

    /// Serialized size in bytes.
    fn serialized_size(value: &Self) -> usize;

    /// Serialize a single item into the buffer.
    fn serialize(value: &Self, bytes: &mut SketchBytes);

    /// Deserialize a single item from the input.
    fn deserialize(input: &mut SketchSlice<'_>) -> Result<Self, Error>;
}

/// KLL sketch for estimating quantiles and ranks.
///
/// See the [kll module level documentation](crate::kll) for more.
#[allow(private_bounds)]
#[derive(Debug, Clone)]
pub struct KllSketch<T: KllItem> {
    k: u16,
    m: u8,
    n: u64,
    is_level_zero_sorted: bool,
    store: LeveledBuffer<T>,
    offset: CompactionOffset,
    min_item: Option<T>,
    max_item: Option<T>,
}

impl<T: KllItem> Default for KllSketch<T> {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

#[allow(private_bounds)]
impl<T: KllItem> KllSketch<T> {
    /// Creates a new sketch with the given value of k.
    ///
    /// The compaction offset starts at a random bit; use
    /// [`with_initial_offset`](Self::with_initial_offset) for a reproducible
    /// layout.
    ///
    /// # Panics
    ///
    /// Panics if k is not in [MIN_K, MAX_K].
    ///
    /// # Examples
    ///
    /// ```
    /// # use streamsketch::kll::KllSketch;
    /// let sketch = KllSketch::<f64>::new(200);
    /// assert_eq!(sketch.k(), 200);
    /// ```
    pub fn new(k: u16) -> Self {
        Self::with_offset(k, CompactionOffset::random())
    }

    /// Creates a new sketch whose compaction offset starts at a fixed bit.
    ///
    /// With a fixed initial bit the internal layout is a deterministic
    /// function of the update sequence.
    ///
    /// # Panics
    ///
    /// Panics if k is not in [MIN_K, MAX_K].
    pub fn with_initial_offset(k: u16, offset_bit: u32) -> Self {
        Self::with_offset(k, CompactionOffset::with_initial(offset_bit))
    }

    fn with_offset(k: u16, offset: CompactionOffset) -> Self {
        assert!(
            (MIN_K..=MAX_K).contains(&k),
            "k must be in [{MIN_K}, {MAX_K}], got {k}"
        );
        let store = LeveledBuffer::new(compute_total_capacity(k, DEFAULT_M, 1));
        Self {
            k,
            m: DEFAULT_M,
            n: 0,
            is_level_zero_sorted: false,
            store,
            offset,
            min_item: None,
            max_item: None,
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns total weight of the stream.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.store.num_retained()
    }

    /// Returns the current number of levels.
    pub fn num_levels(&self) -> usize {
        self.store.num_levels()
    }

    /// Returns the retained items in storage order (level 0 first).
    ///
    /// Diagnostic surface; the order within level 0 is most-recent first.
    pub fn retained_items(&self) -> &[T] {
        self.store.retained()
    }

    /// Returns the number of items in each level, bottom first.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.store.level_sizes()
    }

    /// Returns the maximum item count permitted in a level.
    pub fn level_capacity(&self, level: usize) -> u32 {
        level_capacity(self.k, self.store.num_levels(), level, self.m)
    }

    /// Returns true if the sketch is in estimation mode.
    pub fn is_estimation_mode(&self) -> bool {
        self.store.num_levels() > 1
    }

    /// Returns the minimum item seen by the sketch.
    pub fn min_item(&self) -> Option<&T> {
        self.min_item.as_ref()
    }

    /// Returns the maximum item seen by the sketch.
    pub fn max_item(&self) -> Option<&T> {
        self.max_item.as_ref()
    }

    /// Updates the sketch with a new item.
    ///
    /// NaN values are defined as a no-op for floating-point types.
    pub fn update(&mut self, item: T) {
        if T::is_nan(&item) {
            return;
        }
        self.update_min_max(&item);
        self.internal_update(item);
    }

    /// Merges another sketch into this one.
    ///
    /// Both sketches must have been constructed with the same k; otherwise a
    /// `ConfigMismatch` error is returned and the receiver is left untouched.
    /// The other sketch is only read.
    pub fn merge(&mut self, other: &KllSketch<T>) -> Result<(), Error> {
        if self.k != other.k {
            return Err(Error::config_mismatch("k differs")
                .with_context("receiver", self.k)
                .with_context("other", other.k));
        }
        if other.is_empty() {
            return Ok(());
        }

        debug_assert_eq!(self.m, other.m, "m is fixed at construction");

        self.update_min_max_from_other(other);
        let final_n = self.n + other.n;

        let num_levels = self.store.num_levels().max(other.store.num_levels());
        let mut work: Vec<Vec<T>> = Vec::with_capacity(num_levels);

        // Level 0 collects both raw runs; higher levels merge keeping order.
        let mut level_zero = self.store.level(0).to_vec();
        level_zero.extend(other.store.level(0).iter().cloned());
        work.push(level_zero);

        for lvl in 1..num_levels {
            let left = if lvl < self.store.num_levels() {
                self.store.level(lvl).to_vec()
            } else {
                Vec::new()
            };
            let right = if lvl < other.store.num_levels() {
                other.store.level(lvl).to_vec()
            } else {
                Vec::new()
            };

            work.push(if left.is_empty() {
                right
            } else if right.is_empty() {
                left
            } else {
                merge_sorted_vec(left, right)
            });
        }

        let min_capacity = compute_total_capacity(self.k, self.m, num_levels);
        self.store = LeveledBuffer::from_levels(work, min_capacity);
        self.is_level_zero_sorted = false;

        // Repair: compact any level at or above its capacity. Deepening the
        // sketch lowers the capacities of the levels below the new top, so
        // restart the sweep after every compaction.
        let mut level = 0;
        while level < self.store.num_levels() {
            if self.store.level_len(level) >= self.level_cap(level) {
                self.compact_level(level);
                level = 0;
            } else {
                level += 1;
            }
        }

        let capacity = compute_total_capacity(self.k, self.m, self.store.num_levels());
        self.store.repack(capacity);
        self.n = final_n;

        debug_assert_eq!(self.total_weight(), self.n, "total weight does not match n");
        Ok(())
    }

    /// Returns the normalized rank of the given item.
    pub fn rank(&self, item: &T, inclusive: bool) -> Result<f64, Error> {
        if self.is_empty() {
            return Err(Error::empty_sketch("rank query on an empty sketch"));
        }
        let view = build_sorted_view(&self.store);
        Ok(view.rank(item, inclusive))
    }

    /// Returns the quantile for the given normalized rank.
    ///
    /// The rank must be in [0.0, 1.0].
    pub fn quantile(&self, rank: f64, inclusive: bool) -> Result<T, Error> {
        if self.is_empty() {
            return Err(Error::empty_sketch("quantile query on an empty sketch"));
        }
        if !(0.0..=1.0).contains(&rank) {
            return Err(Error::invalid_input(format!(
                "rank must be in [0.0, 1.0], got {rank}"
            )));
        }
        let view = build_sorted_view(&self.store);
        Ok(view.quantile(rank, inclusive))
    }

    /// Returns the approximate CDF for the given split points.
    pub fn cdf(&self, split_points: &[T], inclusive: bool) -> Result<Vec<f64>, Error> {
        if self.is_empty() {
            return Err(Error::empty_sketch("cdf query on an empty sketch"));
        }
        let view = build_sorted_view(&self.store);
        view.cdf(split_points, inclusive)
    }

    /// Returns the approximate PMF for the given split points.
    pub fn pmf(&self, split_points: &[T], inclusive: bool) -> Result<Vec<f64>, Error> {
        if self.is_empty() {
            return Err(Error::empty_sketch("pmf query on an empty sketch"));
        }
        let view = build_sorted_view(&self.store);
        view.pmf(split_points, inclusive)
    }

    /// Returns normalized rank error for the configured k.
    pub fn normalized_rank_error(&self, pmf: bool) -> f64 {
        normalized_rank_error(self.k, pmf)
    }

    /// Resets the sketch to its initial empty state, keeping k.
    pub fn reset(&mut self) {
        self.n = 0;
        self.is_level_zero_sorted = false;
        self.min_item = None;
        self.max_item = None;
        self.store = LeveledBuffer::new(compute_total_capacity(self.k, self.m, 1));
    }

    /// Serializes the sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let size = self.serialized_size();
        let mut bytes = SketchBytes::with_capacity(size);

        let is_empty = self.is_empty();
        let is_single_item = self.n == 1;

        let preamble_ints = if is_empty || is_single_item {
            PREAMBLE_INTS_SHORT
        } else {
            PREAMBLE_INTS_FULL
        };
        let serial_version = if is_single_item {
            SERIAL_VERSION_2
        } else {
            SERIAL_VERSION_1
        };

        let flags = (if is_empty { FLAG_EMPTY } else { 0 })
            | (if self.is_level_zero_sorted {
                FLAG_LEVEL_ZERO_SORTED
            } else {
                0
            })
            | (if is_single_item { FLAG_SINGLE_ITEM } else { 0 });

        bytes.write_u8(preamble_ints);
        bytes.write_u8(serial_version);
        bytes.write_u8(Family::KLL.id);
        bytes.write_u8(flags);
        bytes.write_u16_le(self.k);
        bytes.write_u8(self.m);
        bytes.write_u8(0);

        if is_empty {
            return bytes.into_bytes();
        }

        if !is_single_item {
            bytes.write_u64_le(self.n);
            // The min-k slot: same-k merges never degrade accuracy.
            bytes.write_u16_le(self.k);
            bytes.write_u8(self.store.num_levels() as u8);
            bytes.write_u8(0);

            for level in 0..self.store.num_levels() {
                bytes.write_u32_le(self.store.level_offset(level));
            }

            if let Some(min_item) = &self.min_item {
                T::serialize(min_item, &mut bytes);
            }
            if let Some(max_item) = &self.max_item {
                T::serialize(max_item, &mut bytes);
            }
        }

        for item in self.store.retained() {
            T::serialize(item, &mut bytes);
        }

        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    ///
    /// Validates the preamble, version, configuration range and the declared
    /// level offsets before building the sketch; any inconsistency yields a
    /// `MalformedData` (or `OutOfRange`) error. The compaction offset is not
    /// part of the wire format and starts a fresh random sequence.
    pub fn deserialize(bytes: &[u8]) -> Result<KllSketch<T>, Error> {
        let mut cursor = SketchSlice::new(bytes);

        let preamble_ints = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("preamble_ints"))?;
        let serial_version = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("serial_version"))?;
        let family_id = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("family_id"))?;
        let flags = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("flags"))?;
        let k = cursor
            .read_u16_le()
            .map_err(|_| Error::insufficient_data("k"))?;
        let m = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("m"))?;
        let _unused = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("unused"))?;

        Family::KLL.validate_id(family_id)?;
        if m != DEFAULT_M {
            return Err(Error::deserial(format!(
                "invalid m: expected {DEFAULT_M}, got {m}"
            )));
        }
        if serial_version != SERIAL_VERSION_1 && serial_version != SERIAL_VERSION_2 {
            return Err(Error::unsupported_serial_version(
                SERIAL_VERSION_1,
                serial_version,
            ));
        }

        let is_empty = (flags & FLAG_EMPTY) != 0;
        let is_single_item = (flags & FLAG_SINGLE_ITEM) != 0;
        let is_level_zero_sorted = (flags & FLAG_LEVEL_ZERO_SORTED) != 0;
        if is_empty || is_single_item {
            if preamble_ints != PREAMBLE_INTS_SHORT {
                return Err(Error::deserial(format!(
                    "invalid preamble ints: expected {PREAMBLE_INTS_SHORT}, got {preamble_ints}"
                )));
            }
        } else if preamble_ints != PREAMBLE_INTS_FULL {
            return Err(Error::deserial(format!(
                "invalid preamble ints: expected {PREAMBLE_INTS_FULL}, got {preamble_ints}"
            )));
        }

        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::deserial(format!("k out of range: {k}")));
        }

        if is_empty {
            let mut sketch = Self::new(k);
            sketch.is_level_zero_sorted = is_level_zero_sorted;
            return Ok(sketch);
        }

        let (n, min_k, num_levels) = if is_single_item {
            (1u64, k, 1usize)
        } else {
            let n = cursor
                .read_u64_le()
                .map_err(|_| Error::insufficient_data("n"))?;
            let min_k = cursor
                .read_u16_le()
                .map_err(|_| Error::insufficient_data("min_k"))?;
            let num_levels = cursor
                .read_u8()
                .map_err(|_| Error::insufficient_data("num_levels"))?;
            let _unused = cursor
                .read_u8()
                .map_err(|_| Error::insufficient_data("unused2"))?;
            (n, min_k, num_levels as usize)
        };

        if num_levels == 0 {
            return Err(Error::deserial("num_levels must be > 0"));
        }
        if min_k < MIN_K || min_k > k {
            return Err(Error::deserial(format!(
                "min_k must be in [{MIN_K}, {k}], got {min_k}"
            )));
        }

        let capacity = compute_total_capacity(k, DEFAULT_M, num_levels);
        let mut level_offsets = Vec::with_capacity(num_levels + 1);
        if !is_single_item {
            for _ in 0..num_levels {
                let offset = cursor
                    .read_u32_le()
                    .map_err(|_| Error::insufficient_data("levels"))?;
                level_offsets.push(offset);
            }
        } else {
            level_offsets.push(capacity - 1);
        }
        level_offsets.push(capacity);

        if level_offsets[0] > capacity {
            return Err(Error::out_of_range(format!(
                "first level offset {} exceeds capacity {capacity}",
                level_offsets[0]
            )));
        }
        for window in level_offsets.windows(2) {
            if window[1] < window[0] {
                return Err(Error::deserial("levels array must be non-decreasing"));
            }
        }

        let (min_item, max_item) = if is_single_item {
            (None, None)
        } else {
            (
                Some(T::deserialize(&mut cursor)?),
                Some(T::deserialize(&mut cursor)?),
            )
        };

        let mut items = vec![T::default(); capacity as usize];
        for slot in items
            .iter_mut()
            .take(capacity as usize)
            .skip(level_offsets[0] as usize)
        {
            *slot = T::deserialize(&mut cursor)?;
        }

        let level_sizes: Vec<usize> = level_offsets
            .windows(2)
            .map(|w| (w[1] - w[0]) as usize)
            .collect();
        if sum_the_sample_weights(&level_sizes) != n {
            return Err(Error::deserial(format!(
                "retained weight does not match n = {n}"
            )));
        }

        let store = LeveledBuffer::from_parts(items, level_offsets);

        let mut sketch = Self::with_offset(k, CompactionOffset::random());
        sketch.n = n;
        sketch.is_level_zero_sorted = is_level_zero_sorted;
        sketch.store = store;
        sketch.min_item = min_item;
        sketch.max_item = max_item;

        if is_single_item {
            if let Some(item) = sketch.store.retained().first().cloned() {
                sketch.min_item = Some(item.clone());
                sketch.max_item = Some(item);
            }
        }

        Ok(sketch)
    }

    fn level_cap(&self, level: usize) -> usize {
        level_capacity(self.k, self.store.num_levels(), level, self.m) as usize
    }

    fn serialized_size(&self) -> usize {
        if self.is_empty() {
            return EMPTY_SIZE_BYTES;
        }
        if self.n == 1 {
            let item = &self.store.retained()[0];
            return DATA_START_SINGLE_ITEM + T::serialized_size(item);
        }

        let mut size = DATA_START + self.store.num_levels() * 4;
        if let Some(min_item) = &self.min_item {
            size += T::serialized_size(min_item);
        }
        if let Some(max_item) = &self.max_item {
            size += T::serialized_size(max_item);
        }
        for item in self.store.retained() {
            size += T::serialized_size(item);
        }
        size
    }

    fn update_min_max(&mut self, item: &T) {
        match self.min_item.as_ref() {
            None => {
                self.min_item = Some(item.clone());
                self.max_item = Some(item.clone());
            }
            Some(min) => {
                if T::cmp(item, min) == Ordering::Less {
                    self.min_item = Some(item.clone());
                }
                if let Some(max) = &self.max_item {
                    if T::cmp(max, item) == Ordering::Less {
                        self.max_item = Some(item.clone());
                    }
                }
            }
        }
    }

    fn update_min_max_from_other(&mut self, other: &KllSketch<T>) {
        match (&self.min_item, &self.max_item) {
            (None, None) => {
                self.min_item = other.min_item.clone();
                self.max_item = other.max_item.clone();
            }
            (Some(min), Some(max)) => {
                if let Some(other_min) = &other.min_item {
                    if T::cmp(other_min, min) == Ordering::Less {
                        self.min_item = Some(other_min.clone());
                    }
                }
                if let Some(other_max) = &other.max_item {
                    if T::cmp(max, other_max) == Ordering::Less {
                        self.max_item = Some(other_max.clone());
                    }
                }
            }
            _ => {
                self.min_item = other.min_item.clone();
                self.max_item = other.max_item.clone();
            }
        }
    }

    fn internal_update(&mut self, item: T) {
        if self.store.level_len(0) >= self.level_cap(0) {
            self.compact_and_cascade(0);
        }
        self.n += 1;
        self.is_level_zero_sorted = false;
        self.store.push_level_zero(item);
    }

    /// Compact one level in place and cascade while the level above is
    /// pushed to or past its own capacity.
    fn compact_and_cascade(&mut self, start: usize) {
        let mut level = start;
        loop {
            self.compact_level(level);
            let next = level + 1;
            if next >= self.store.num_levels() || self.store.level_len(next) < self.level_cap(next)
            {
                break;
            }
            level = next;
        }
    }

    /// Pairwise-compact one level of the backing buffer.
    ///
    /// Preconditions: the level holds at least two items, and levels above
    /// it are sorted. The even-length eligible run is halved with the
    /// alternating offset; survivors move into the next level (created on
    /// demand) with doubled implicit weight. An odd leftover item stays in
    /// this level. Afterwards the level is at or below its capacity.
    fn compact_level(&mut self, level: usize) {
        if level == self.store.num_levels() - 1 {
            let delta = level_capacity(self.k, self.store.num_levels() + 1, 0, self.m);
            self.store.add_empty_top_level(delta);
        }

        let raw_beg = self.store.level_offset(level);
        let raw_lim = self.store.level_offset(level + 1);
        let raw_pop = (raw_lim - raw_beg) as usize;
        debug_assert!(raw_pop >= 2, "compacting a level with fewer than 2 items");

        let odd_pop = raw_pop % 2 == 1;
        let adj_beg = (if odd_pop { raw_beg + 1 } else { raw_beg }) as usize;
        let adj_pop = if odd_pop { raw_pop - 1 } else { raw_pop };
        let half_adj_pop = adj_pop / 2;

        if level == 0 && !self.is_level_zero_sorted {
            self.store.items_mut()[adj_beg..raw_lim as usize].sort_by(T::cmp);
        }

        let pop_above = (self.store.level_offset(level + 2) - raw_lim) as usize;
        let offset = self.offset.next();
        let items = self.store.items_mut();
        if pop_above == 0 {
            halve_up(items, adj_beg, adj_pop, offset);
        } else {
            halve_down(items, adj_beg, adj_pop, offset);
            merge_sorted_runs(
                items,
                adj_beg,
                half_adj_pop,
                raw_lim as usize,
                pop_above,
                adj_beg + half_adj_pop,
            );
        }

        let new_lim = raw_lim - half_adj_pop as u32;
        self.store.set_level_offset(level + 1, new_lim);
        if odd_pop {
            // The leftover item becomes the level's only occupant.
            let new_beg = new_lim - 1;
            self.store.set_level_offset(level, new_beg);
            if new_beg != raw_beg {
                let items = self.store.items_mut();
                let leftover = items[raw_beg as usize].clone();
                items[new_beg as usize] = leftover;
            }
        } else {
            self.store.set_level_offset(level, new_lim);
        }

        if level > 0 {
            self.store
                .shift_lower_levels_up(level, raw_beg, half_adj_pop as u32);
        }
    }

    fn total_weight(&self) -> u64 {
        sum_the_sample_weights(&self.store.level_sizes())
    }
}

fn normalized_rank_error(k: u16, pmf: bool) -> f64 {
    let k = k as f64;
    if pmf {
        2.446 / k.powf(0.9433)
    } else {
        2.296 / k.powf(0.9723)
    }
}

impl KllItem for f32 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialized_size(_value: &Self) -> usize {
        4
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f32_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_f32_le()
            .map_err(|_| Error::insufficient_data("f32"))
    }
}

impl KllItem for f64 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialized_size(_value: &Self) -> usize {
        8
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f64_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("f64"))
    }
}

impl KllItem for i64 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }

    fn serialized_size(_value: &Self) -> usize {
        8
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_i64_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> Result<Self, Error> {
        input
            .read_i64_le()
            .map_err(|_| Error::insufficient_data("i64"))
    }
}
