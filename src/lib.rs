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

//! Streaming sketches that summarize massive data streams in small, bounded
//! memory while answering cardinality and quantile queries with statistically
//! bounded error.
//!
//! Two engines are provided:
//!
//! - [`hll::HllSketch`] — a cardinality sketch that grows through sparse
//!   list and set representations into a dense bit-packed register array,
//!   with mergeable union semantics and a stable binary format.
//! - [`kll::KllSketch`] — a quantile sketch built on a leveled buffer with
//!   randomized pairwise compaction, answering rank and quantile queries
//!   under a fixed memory budget.
//!
//! Every sketch is a single-writer, in-memory value type: updates are applied
//! in caller order, no operation blocks or performs I/O, and concurrent
//! producers should shard into independent sketches and combine them with
//! `union`/`merge`.
//!
//! All fallible operations return [`error::Error`] with a kind from the
//! crate-wide taxonomy; sketches are never left in an invariant-violating
//! state by a failed call.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod codec;
pub mod common;
pub mod error;
pub mod hll;
pub mod kll;
