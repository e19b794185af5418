/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank by power iteration.
//!
//! # The formula
//!
//! Let *P* be the row-normalized adjacency matrix of a graph with *n* nodes
//! (with zero rows for dangling nodes), let **d** be the characteristic vector
//! of dangling nodes and let α be the damping factor. Dangling nodes are
//! patched by a uniform transition towards all nodes, and the random surfer
//! teleports uniformly with probability 1 − α, so the PageRank vector is the
//! fixed point of
//!
//! > **x** = (1 − α) **1**/*n* + α ( *P*ᵀ **x** + (**d** · **x**) **1**/*n* ).
//!
//! # The iteration
//!
//! Starting from the uniform vector **1**/*n*, every iteration computes
//!
//! 1. the dangling mass δ = (**d** · **x**) / *n* of the _previous_ vector;
//! 2. the product *P*ᵀ **x**, through a [`TransitionProduct`];
//! 3. the new vector *xᵢ*′ = (1 − α) / *n* + α (*(P*ᵀ **x**)ᵢ + δ);
//! 4. the 𝓁₁ norm of the difference ‖**x**′ − **x**‖₁.
//!
//! The iteration stops when a [predicate](preds) on the iteration count and
//! on the norm of the difference holds; the default is
//! [`L1Norm`](preds::L1Norm), which stops as soon as the norm falls _strictly_
//! below a threshold.
//!
//! There is no cap on the number of iterations unless a
//! [`MaxIter`](preds::MaxIter) predicate is combined with the norm predicate.
//! Since α < 1 the iteration converges geometrically, so in practice the
//! number of iterations is small.
//!
//! Sums over the dangling nodes and the norm of the difference are computed
//! sequentially with [Kahan summation](kahan::KahanSum), so the result does
//! not depend on the number of threads; this is essential when several
//! [workers](super::dist) must reach the same decision independently.

pub mod preds {
    //! Predicates implementing stopping conditions.
    //!
    //! The implementation of [PageRank](super::PageRank) requires a
    //! [predicate](Predicate) to stop the algorithm. This module provides a few
    //! such predicates: they evaluate to true if the computation should be
    //! stopped.
    //!
    //! You can combine the predicates using the `and` and `or` methods provided
    //! by the [`Predicate`] trait.
    //!
    //! # Examples
    //! ```
    //! # fn main() -> Result<(), Box<dyn std::error::Error>> {
    //! use predicates::prelude::*;
    //! use pprank::rank::preds::{L1Norm, MaxIter};
    //!
    //! let mut predicate = L1Norm::try_from(1E-6)?.boxed();
    //! predicate = predicate.or(MaxIter::from(100)).boxed();
    //! #     Ok(())
    //! # }
    //! ```

    use crate::Float;
    use anyhow::ensure;
    use predicates::{reflection::PredicateReflection, Predicate};
    use std::fmt::Display;

    #[doc(hidden)]
    /// This structure is passed to stopping predicates to provide the
    /// information that is needed to evaluate them.
    #[derive(Debug, Clone)]
    pub struct PredParams {
        pub iteration: usize,
        pub norm_delta: Float,
    }

    /// Stops after at most the provided number of iterations.
    #[derive(Debug, Clone)]
    pub struct MaxIter {
        max_iter: usize,
    }

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = usize::MAX;
    }

    impl From<usize> for MaxIter {
        fn from(max_iter: usize) -> Self {
            MaxIter { max_iter }
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            Self::from(Self::DEFAULT_MAX_ITER)
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(max iter: {})", self.max_iter))
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.iteration >= self.max_iter
        }
    }

    /// Stops when the 𝓁₁ norm of the difference between successive
    /// approximations is smaller than a given threshold.
    #[derive(Debug, Clone)]
    pub struct L1Norm {
        threshold: Float,
    }

    impl L1Norm {
        pub const DEFAULT_THRESHOLD: Float = 1E-6;

        /// Returns the threshold.
        pub fn threshold(&self) -> Float {
            self.threshold
        }
    }

    impl TryFrom<Option<Float>> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: Option<Float>) -> anyhow::Result<Self> {
            Ok(match threshold {
                Some(threshold) => {
                    ensure!(!threshold.is_nan());
                    ensure!(threshold > 0.0, "The threshold must be positive");
                    L1Norm { threshold }
                }
                None => Self::default(),
            })
        }
    }

    impl TryFrom<Float> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: Float) -> anyhow::Result<Self> {
            Some(threshold).try_into()
        }
    }

    impl Default for L1Norm {
        fn default() -> Self {
            L1Norm {
                threshold: Self::DEFAULT_THRESHOLD,
            }
        }
    }

    impl Display for L1Norm {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(norm: {})", self.threshold))
        }
    }

    impl PredicateReflection for L1Norm {}
    impl Predicate<PredParams> for L1Norm {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.norm_delta < self.threshold
        }
    }
}

use crate::csr::Csr;
use crate::{Error, Float, Result};
use dsi_progress_logger::{no_logging, ProgressLog};
use kahan::KahanSum;
use predicates::Predicate;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

/// Computes the product of the transpose of a transition matrix with a rank
/// vector.
///
/// This is the only operation of PageRank that depends on where the matrix
/// lives: a [`Csr`] computes it directly, whereas a
/// [distributed worker](super::dist::Worker) computes its share and combines
/// it with those of the other workers.
pub trait TransitionProduct {
    /// Returns the number of nodes, that is, the length of the rank vector.
    fn num_nodes(&self) -> usize;

    /// Returns, in increasing order, the (global) indices of dangling nodes.
    fn dangling_nodes(&self) -> &[usize];

    /// Returns *P*ᵀ **x**, where **x** is the full rank vector.
    fn transposed_product(&mut self, rank: &[Float]) -> Result<Vec<Float>>;
}

impl TransitionProduct for &Csr {
    fn num_nodes(&self) -> usize {
        Csr::num_cols(self)
    }

    fn dangling_nodes(&self) -> &[usize] {
        Csr::dangling_nodes(self)
    }

    fn transposed_product(&mut self, rank: &[Float]) -> Result<Vec<Float>> {
        self.transposed_multiply(rank)
    }
}

/// The state of a PageRank computation.
///
/// [`Converged`](State::Converged) means that the stopping predicate passed
/// to [`run`](PageRank::run) held, not necessarily that the 𝓁₁ norm fell
/// below a threshold: if the predicate combines [`L1Norm`](preds::L1Norm)
/// with [`MaxIter`](preds::MaxIter), check [`norm_delta`](PageRank::norm_delta)
/// to tell the two cases apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// The stopping predicate has not yet been met.
    #[default]
    Running,
    /// The stopping predicate has been met; the rank vector is final.
    Converged,
}

/// Computes PageRank by power iteration.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). After completion the rank vector is available via the
/// [`rank`](Self::rank) method.
///
/// # Examples
///
/// ```
/// use pprank::csr::Csr;
/// use pprank::rank::{preds, PageRank};
///
/// // 0 → 1, 1 → 2; node 2 is dangling
/// let csr = Csr::from_arcs([(0, 1), (1, 2)]);
///
/// let mut pr = PageRank::new(&csr);
/// pr.run(preds::L1Norm::try_from(1E-6).unwrap())?;
///
/// assert_eq!(pr.rank().len(), 3);
/// assert!((pr.rank().iter().sum::<pprank::Float>() - 1.0).abs() < 1E-4);
/// assert!(pr.rank()[2] > pr.rank()[1] && pr.rank()[1] > pr.rank()[0]);
/// # Ok::<(), pprank::Error>(())
/// ```
#[derive(Debug)]
pub struct PageRank<P: TransitionProduct> {
    product: P,
    alpha: Float,
    norm_delta: Float,
    rank: Vec<Float>,
    iteration: usize,
    state: State,
}

impl<P: TransitionProduct> PageRank<P> {
    pub const DEFAULT_ALPHA: Float = 0.85;

    /// Creates a new PageRank computation with damping factor
    /// [0.85](Self::DEFAULT_ALPHA) and rank vector initialized to the uniform
    /// distribution.
    pub fn new(product: P) -> Self {
        let mut pr = Self {
            product,
            alpha: Self::DEFAULT_ALPHA,
            norm_delta: Float::INFINITY,
            rank: vec![],
            iteration: 0,
            state: State::Running,
        };
        pr.reset();
        pr
    }

    /// Sets the damping factor α.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the interval [0 . . 1).
    pub fn alpha(&mut self, alpha: Float) -> &mut Self {
        assert!(
            // Note that 0.0..1.0 is [0.0..1.0) in mathematical notation
            (0.0..1.0).contains(&alpha),
            "The damping factor must be in [0 . . 1), got {alpha}"
        );
        self.alpha = alpha;
        self
    }

    /// Resets the rank vector to the uniform distribution and the iteration
    /// count to zero.
    pub fn reset(&mut self) {
        let n = self.product.num_nodes();
        self.rank.clear();
        self.rank.resize(n, 1.0 / n as Float);
        self.iteration = 0;
        self.norm_delta = Float::INFINITY;
        self.state = State::Running;
    }

    /// Returns the rank vector.
    ///
    /// After calling [`run`](Self::run), this contains the computed PageRank
    /// values.
    pub fn rank(&self) -> &[Float] {
        &self.rank
    }

    /// Consumes the computation and returns the rank vector.
    pub fn into_rank(self) -> Vec<Float> {
        self.rank
    }

    /// Returns the number of iterations performed since the last
    /// [reset](Self::reset).
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the 𝓁₁ norm of the difference between the last two
    /// approximations.
    pub fn norm_delta(&self) -> Float {
        self.norm_delta
    }

    /// Returns the state of the computation.
    pub fn state(&self) -> State {
        self.state
    }

    /// Performs one iteration and returns the 𝓁₁ norm of the difference
    /// between the new and the previous rank vector.
    ///
    /// # Errors
    ///
    /// Returns a [dimension error](Error::Dimension) if the transition
    /// matrix is not square.
    pub fn step(&mut self) -> Result<Float> {
        let n = self.rank.len();
        let inv_n = 1.0 / n as Float;

        let mut dangling_mass = KahanSum::new();
        for &node in self.product.dangling_nodes() {
            // Dangling rows beyond the rank vector mean a non-square matrix
            dangling_mass += *self.rank.get(node).ok_or(Error::Dimension {
                expected: n,
                actual: node + 1,
            })?;
        }
        let dangling = dangling_mass.sum() * inv_n;

        let product = self.product.transposed_product(&self.rank)?;
        if product.len() != n {
            return Err(Error::Dimension {
                expected: n,
                actual: product.len(),
            });
        }

        let alpha = self.alpha;
        let teleport = (1.0 - alpha) * inv_n;
        let new_rank = product
            .par_iter()
            .with_min_len(crate::RAYON_MIN_LEN)
            .map(|&p| teleport + alpha * (p + dangling))
            .collect::<Vec<_>>();

        let mut norm_delta = KahanSum::new();
        for (&new, &old) in new_rank.iter().zip(&self.rank) {
            norm_delta += (new - old).abs();
        }

        self.rank = new_rank;
        self.norm_delta = norm_delta.sum();
        self.iteration += 1;
        Ok(self.norm_delta)
    }

    /// Runs the PageRank computation until the given predicate is satisfied.
    pub fn run(&mut self, predicate: impl Predicate<preds::PredParams>) -> Result<()> {
        self.run_with_logging(predicate, no_logging![])
    }

    /// Runs the PageRank computation until the given predicate is satisfied,
    /// logging progress.
    ///
    /// The rank vector is [reset](Self::reset) first. The options of `pl`
    /// will be preserved, making thus possible to customize the logs.
    pub fn run_with_logging(
        &mut self,
        predicate: impl Predicate<preds::PredParams>,
        pl: &mut impl ProgressLog,
    ) -> Result<()> {
        self.reset();
        let n = self.rank.len();
        if let Some(&last) = self.product.dangling_nodes().last() {
            if last >= n {
                return Err(Error::Dimension {
                    expected: n,
                    actual: last + 1,
                });
            }
        }
        if n == 0 {
            self.norm_delta = 0.0;
            self.state = State::Converged;
            return Ok(());
        }

        pl.info(format_args!("Alpha: {}", self.alpha));
        pl.info(format_args!("Stopping criterion: {}", predicate));
        pl.item_name("iteration");
        pl.expected_updates(None);
        pl.start("Iterating...");

        loop {
            self.step()?;
            pl.info(format_args!(
                "Iteration {}: norm delta = {}",
                self.iteration, self.norm_delta
            ));
            pl.update_and_display();

            if predicate.eval(&preds::PredParams {
                iteration: self.iteration,
                norm_delta: self.norm_delta,
            }) {
                break;
            }
        }

        pl.done();
        self.state = State::Converged;
        Ok(())
    }
}

/// Computes the PageRank of the graph of a transition matrix with damping
/// factor 0.85, iterating until the 𝓁₁ norm of the difference between
/// successive approximations is smaller than `tol`.
///
/// Returns the number of iterations and the rank vector.
///
/// # Errors
///
/// Returns a [dimension error](Error::Dimension) if the matrix is not
/// square.
///
/// # Panics
///
/// Panics if `tol` is not positive.
pub fn pagerank(matrix: &Csr, tol: Float) -> Result<(usize, Vec<Float>)> {
    assert!(tol > 0.0, "The tolerance must be positive, got {tol}");
    if matrix.num_rows() != matrix.num_cols() {
        return Err(Error::Dimension {
            expected: matrix.num_cols(),
            actual: matrix.num_rows(),
        });
    }
    let mut pr = PageRank::new(matrix);
    let mut pl = dsi_progress_logger::progress_logger![];
    pr.run_with_logging(preds::L1Norm::try_from(tol).unwrap_or_default(), &mut pl)?;
    log::info!(
        "Completed after {} iteration(s), norm delta = {}",
        pr.iterations(),
        pr.norm_delta()
    );
    Ok((pr.iterations(), pr.into_rank()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() -> anyhow::Result<()> {
        let csr = Csr::default();
        let mut pr = PageRank::new(&csr);
        pr.run(preds::L1Norm::default())?;
        assert_eq!(pr.state(), State::Converged);
        assert_eq!(pr.iterations(), 0);
        assert!(pr.rank().is_empty());
        Ok(())
    }

    #[test]
    fn test_single_dangling_node() -> anyhow::Result<()> {
        let csr = Csr::from_parts(1, vec![], vec![0, 0], vec![])?;
        let mut pr = PageRank::new(&csr);
        assert_eq!(pr.state(), State::Running);
        assert_eq!(pr.step()?, 0.0);
        assert_eq!(pr.rank(), &[1.0]);
        Ok(())
    }

    #[test]
    fn test_max_iter() -> anyhow::Result<()> {
        use predicates::prelude::*;
        let csr = Csr::from_arcs([(0, 1), (1, 2), (2, 0), (2, 1)]);
        let mut pr = PageRank::new(&csr);
        pr.run(preds::L1Norm::try_from(1E-30)?.or(preds::MaxIter::from(3)))?;
        assert_eq!(pr.iterations(), 3);
        // The predicate held through the iteration cap, not the norm
        assert_eq!(pr.state(), State::Converged);
        assert!(pr.norm_delta() >= 1E-30);
        Ok(())
    }
}
