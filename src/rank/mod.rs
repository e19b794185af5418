/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank by power iteration, in single-process and partitioned form.

pub mod dist;
pub mod pagerank;

pub use dist::{run_partitioned, Strategy, Worker};
pub use pagerank::{pagerank, preds, PageRank, State, TransitionProduct};
