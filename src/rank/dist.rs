/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank over a row-partitioned transition matrix.
//!
//! A group of workers proceeds in lock-step: each worker owns a
//! [partition](crate::split::Partition) and a [`Collective`] handle, and
//! computes at every iteration only its share of the product *P*ᵀ **x**. The
//! shares are then combined through a collective call, after which every
//! worker holds the same full-length product and performs the same update on
//! its own copy of the rank vector. There is no shared mutable state.
//!
//! Two [strategies](Strategy) are available:
//!
//! - [`Reduce`](Strategy::Reduce) partitions the rows of *P*, that is, the
//!   _sources_ of arcs. Since a source can point anywhere, each worker
//!   computes with [`transposed_multiply`](Csr::transposed_multiply) a
//!   full-length vector from its slice of the rank vector, and the vectors
//!   of all workers are summed with [`reduce_sum`](Collective::reduce_sum).
//! - [`Gather`](Strategy::Gather) partitions the rows of the materialized
//!   transpose *P*ᵀ, that is, the _targets_ of arcs. Each worker computes
//!   with [`multiply`](Csr::multiply) the entries of the product for its
//!   rows, and the slices are concatenated with
//!   [`gather_rows`](Collective::gather_rows).
//!
//! Since all workers see the same data, they take the same stopping decision
//! and exit their loops at the same iteration.

use super::pagerank::{preds::PredParams, PageRank, TransitionProduct};
use crate::collective::{Collective, ThreadCollective};
use crate::csr::Csr;
use crate::split::Partition;
use crate::{Error, Float, Result};
use dsi_progress_logger::{no_logging, progress_logger};
use predicates::Predicate;
use std::time::Duration;

/// How partial products are combined among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Partition the transition matrix by sources and sum full-length
    /// partial products.
    #[default]
    Reduce,
    /// Partition the transpose of the transition matrix by targets and
    /// concatenate the resulting row ranges.
    Gather,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Reduce => f.write_str("reduce"),
            Strategy::Gather => f.write_str("gather"),
        }
    }
}

/// The context of a worker: its partition, the global dangling-node list and
/// its communication handle.
///
/// A worker is a [`TransitionProduct`], so it can be passed directly to
/// [`PageRank::new`].
#[derive(Debug)]
pub struct Worker<'a, C: Collective> {
    num_nodes: usize,
    dangling_nodes: &'a [usize],
    partition: Partition,
    strategy: Strategy,
    collective: C,
}

impl<'a, C: Collective> Worker<'a, C> {
    /// Creates a worker.
    ///
    /// `partition` must be a part of the transition matrix if `strategy` is
    /// [`Reduce`](Strategy::Reduce), or a part of its transpose if `strategy`
    /// is [`Gather`](Strategy::Gather). In both cases, `dangling_nodes` is the
    /// dangling-node list of the whole transition matrix.
    pub fn new(
        num_nodes: usize,
        dangling_nodes: &'a [usize],
        partition: Partition,
        strategy: Strategy,
        collective: C,
    ) -> Self {
        debug_assert!(partition.rows().end <= num_nodes);
        debug_assert_eq!(partition.matrix().num_cols(), num_nodes);
        Self {
            num_nodes,
            dangling_nodes,
            partition,
            strategy,
            collective,
        }
    }

    /// Returns the partition of this worker.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Returns the communication handle of this worker.
    pub fn collective(&self) -> &C {
        &self.collective
    }
}

impl<C: Collective> TransitionProduct for Worker<'_, C> {
    fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    fn dangling_nodes(&self) -> &[usize] {
        self.dangling_nodes
    }

    fn transposed_product(&mut self, rank: &[Float]) -> Result<Vec<Float>> {
        if rank.len() != self.num_nodes {
            return Err(Error::Dimension {
                expected: self.num_nodes,
                actual: rank.len(),
            });
        }
        let rows = self.partition.rows();
        let sub = self.partition.matrix();
        match self.strategy {
            Strategy::Reduce => {
                let local = sub.transposed_multiply(&rank[rows])?;
                self.collective.reduce_sum(&local)
            }
            Strategy::Gather => {
                let local = sub.multiply(rank)?;
                self.collective
                    .gather_rows(&local, rows.start, self.num_nodes)
            }
        }
    }
}

/// Computes PageRank with `num_workers` in-process workers connected by a
/// [`ThreadCollective`], and returns the number of iterations and the rank
/// vector of worker 0.
///
/// The matrix (or, with [`Gather`](Strategy::Gather), its transpose) is
/// [split](crate::split::split) in `num_workers` parts, and each worker runs
/// in its own thread a [`PageRank`] computation with damping factor `alpha`,
/// stopping when the predicate returned by `predicate` holds. Only worker 0
/// logs its progress.
///
/// If `timeout` is `Some`, a worker waiting longer than the given duration
/// for its peers fails with [`Error::Timeout`]; otherwise, the loss of a
/// worker stalls the computation.
///
/// # Errors
///
/// Returns a [dimension error](Error::Dimension) if the matrix is not
/// square, a [partition error](Error::Partition) if `num_workers` is zero or
/// larger than the number of nodes, and otherwise the first error, in worker
/// order, returned by a worker.
///
/// # Panics
///
/// Panics if `alpha` is not in the interval [0 . . 1).
pub fn run_partitioned<Q: Predicate<PredParams>>(
    matrix: &Csr,
    num_workers: usize,
    strategy: Strategy,
    timeout: Option<Duration>,
    alpha: Float,
    predicate: impl Fn() -> Q + Sync,
) -> Result<(usize, Vec<Float>)> {
    assert!(
        (0.0..1.0).contains(&alpha),
        "The damping factor must be in [0 . . 1), got {alpha}"
    );
    let num_nodes = matrix.num_cols();
    if matrix.num_rows() != num_nodes {
        return Err(Error::Dimension {
            expected: num_nodes,
            actual: matrix.num_rows(),
        });
    }
    let parts = match strategy {
        Strategy::Reduce => matrix.split(num_workers)?,
        Strategy::Gather => matrix.transpose().split(num_workers)?,
    };
    log::info!(
        "Running PageRank on {} workers using the {} strategy",
        num_workers,
        strategy
    );

    let dangling_nodes = matrix.dangling_nodes();
    let predicate = &predicate;

    let results = std::thread::scope(|s| {
        let mut handles = Vec::with_capacity(num_workers);
        for (partition, collective) in parts
            .into_iter()
            .zip(ThreadCollective::group(num_workers, timeout))
        {
            let rank = collective.rank();
            let handle = std::thread::Builder::new()
                .name(format!("pprank-worker-{rank}"))
                .spawn_scoped(s, move || -> Result<(usize, Vec<Float>)> {
                    log::debug!(
                        "Worker {} owns rows {:?}",
                        rank,
                        partition.rows()
                    );
                    let worker = Worker::new(
                        num_nodes,
                        dangling_nodes,
                        partition,
                        strategy,
                        collective,
                    );
                    let mut pr = PageRank::new(worker);
                    pr.alpha(alpha);
                    if rank == 0 {
                        let mut pl = progress_logger![];
                        pr.run_with_logging(predicate(), &mut pl)?;
                    } else {
                        pr.run_with_logging(predicate(), no_logging![])?;
                    }
                    Ok((pr.iterations(), pr.into_rank()))
                })?;
            handles.push(handle);
        }

        Ok::<_, Error>(
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Vec<_>>(),
        )
    })?;

    let mut results = results.into_iter();
    let first = results
        .next()
        .ok_or(Error::Partition {
            num_rows: matrix.num_rows(),
            parts: num_workers,
        })??;
    for result in results {
        result?;
    }

    log::info!("Completed after {} iteration(s)", first.0);
    Ok(first)
}
