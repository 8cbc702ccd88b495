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

//! KLL sketch implementation for estimating quantiles and ranks.
//!
//! KLL is a compact, streaming quantiles sketch with randomized compaction
//! and near-optimal accuracy per retained item. It supports one-pass updates,
//! approximate quantiles, ranks, PMF, and CDF queries.
//!
//! The sketch owns a single growable backing buffer logically partitioned
//! into levels; an item stored in level *i* implicitly carries weight `2^i`.
//! When level 0 reaches its capacity it is sorted and compacted: adjacent
//! items are paired and one survivor per pair, chosen by an alternating
//! offset bit, is promoted into the level above with doubled weight. A
//! promotion that overflows the next level cascades into it.
//!
//! The compaction offset alternates deterministically once seeded. Production
//! sketches seed it from a process-wide random source; tests can pin the
//! initial bit with [`KllSketch::with_initial_offset`] to make the entire
//! layout reproducible.
//!
//! # Usage
//!
//! ```rust
//! # use streamsketch::kll::KllSketch;
//! let mut sketch = KllSketch::<f64>::new(200);
//! sketch.update(1.0);
//! sketch.update(2.0);
//! let q = sketch.quantile(0.5, true).unwrap();
//! assert!(q >= 1.0 && q <= 2.0);
//! ```

mod compaction;
mod helper;
mod levels;
mod serialization;
mod sketch;
mod sorted_view;

pub use self::sketch::KllSketch;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 200;
/// Default value of parameter m (the minimum level width).
pub const DEFAULT_M: u8 = 8;
/// Minimum value of parameter k.
pub const MIN_K: u16 = DEFAULT_M as u16;
/// Maximum value of parameter k.
pub const MAX_K: u16 = u16::MAX;
