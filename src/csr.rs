/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Sparse transition matrices in compressed sparse-row format.
//!
//! A [`Csr`] stores, for each row, the column indices and the weights of its
//! nonzero entries. When built from a graph (with [`Csr::from_graph`],
//! [`Csr::from_arcs`] or [`EdgeStream`]) row *i* contains one entry
//! of weight 1/*d* for each successor of node *i*, where *d* is the outdegree
//! of *i*; rows of nodes without successors are empty, and their indices are
//! collected in the [dangling-node list](Csr::dangling_nodes).
//!
//! # The implicit transpose
//!
//! PageRank needs the product of the _transpose_ of the transition matrix
//! with the rank vector. Instead of storing the transpose, or sorting the
//! entries a second time, [`Csr::transposed_multiply`] scatters each row of
//! the matrix into the output vector: in this mode the column indices address
//! the _output_ vector, not the input one.

use crate::edge_stream::EdgeStream;
use crate::graph::Graph;
use crate::{Error, Float, Result};
use itertools::Itertools;
use rayon::slice::ParallelSliceMut;
use std::path::Path;

/// A compressed sparse-row matrix.
///
/// Once built, a matrix is immutable. The invariants are:
/// - `row_ptr` has length `num_rows + 1`, starts from zero, is
///   nondecreasing and ends with the number of nonzero entries;
/// - `values` and `col_idx` have the same length, and within each row
///   column indices are strictly increasing and smaller than `num_cols`;
/// - `dangling_nodes` contains, in increasing order, exactly the rows
///   without entries.
///
/// By setting the feature `serde`, this struct can be serialized and
/// deserialized using [serde](https://crates.io/crates/serde).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Csr {
    num_rows: usize,
    num_cols: usize,
    values: Vec<Float>,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    dangling_nodes: Vec<usize>,
}

impl core::default::Default for Csr {
    fn default() -> Self {
        Self::from_raw(0, vec![], vec![0], vec![])
    }
}

impl Csr {
    /// Creates a matrix from its parts without checking them, deriving the
    /// list of dangling rows.
    pub(crate) fn from_raw(
        num_cols: usize,
        values: Vec<Float>,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Self {
        debug_assert!(!row_ptr.is_empty());
        debug_assert_eq!(values.len(), col_idx.len());
        let num_rows = row_ptr.len() - 1;
        let dangling_nodes = row_ptr
            .iter()
            .tuple_windows()
            .positions(|(start, end)| start == end)
            .collect();
        Self {
            num_rows,
            num_cols,
            values,
            row_ptr,
            col_idx,
            dangling_nodes,
        }
    }

    /// Creates a matrix from its parts, checking all invariants.
    ///
    /// The number of rows is `row_ptr.len() - 1`; dangling rows are derived
    /// from `row_ptr`.
    pub fn from_parts(
        num_cols: usize,
        values: Vec<Float>,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Result<Self> {
        if row_ptr.first() != Some(&0) {
            return Err(Error::format(None, "The row pointers must start with 0"));
        }
        if values.len() != col_idx.len() {
            return Err(Error::format(
                None,
                format!(
                    "{} values but {} column indices",
                    values.len(),
                    col_idx.len()
                ),
            ));
        }
        if row_ptr.last() != Some(&values.len()) {
            return Err(Error::format(
                None,
                format!(
                    "The last row pointer ({:?}) is not the number of values ({})",
                    row_ptr.last(),
                    values.len()
                ),
            ));
        }
        if let Some(row) = row_ptr
            .iter()
            .tuple_windows()
            .position(|(start, end)| start > end)
        {
            return Err(Error::format(
                None,
                format!("Row pointers decrease at row {row}"),
            ));
        }
        for (row, (&start, &end)) in row_ptr.iter().tuple_windows().enumerate() {
            let cols = &col_idx[start..end];
            if let Some(&col) = cols.iter().find(|&&col| col >= num_cols) {
                return Err(Error::format(
                    None,
                    format!("Column {col} in row {row} is out of bounds ({num_cols} columns)"),
                ));
            }
            if cols.iter().tuple_windows().any(|(a, b)| a >= b) {
                return Err(Error::format(
                    None,
                    format!("Columns of row {row} are not strictly increasing"),
                ));
            }
        }
        Ok(Self::from_raw(num_cols, values, row_ptr, col_idx))
    }

    /// Creates a matrix from a dense row-major representation, storing only
    /// the nonzero entries.
    ///
    /// The values are not normalized, so the resulting matrix is not in
    /// general a transition matrix.
    pub fn from_dense(num_rows: usize, num_cols: usize, dense: &[Float]) -> Result<Self> {
        if dense.len() != num_rows * num_cols {
            return Err(Error::Dimension {
                expected: num_rows * num_cols,
                actual: dense.len(),
            });
        }
        let mut values = vec![];
        let mut col_idx = vec![];
        let mut row_ptr = Vec::with_capacity(num_rows + 1);
        row_ptr.push(0);
        for row in dense.chunks(num_cols.max(1)).take(num_rows) {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    values.push(value);
                    col_idx.push(col);
                }
            }
            row_ptr.push(values.len());
        }
        // Zero columns yield no chunks
        row_ptr.resize(num_rows + 1, 0);
        Ok(Self::from_raw(num_cols, values, row_ptr, col_idx))
    }

    /// Creates the transition matrix of a [`Graph`].
    pub fn from_graph(graph: &Graph) -> Self {
        let mut builder = TransitionBuilder::with_capacity(graph.num_nodes(), graph.num_arcs());
        let mut succ = vec![];
        for node in 0..graph.num_nodes() {
            succ.clear();
            succ.extend(graph.successors(node));
            builder.push_row(&succ);
        }
        builder.build(graph.num_nodes())
    }

    /// Creates the transition matrix of the graph with the given arcs.
    ///
    /// Arcs can be given in any order; duplicates are removed. The number of
    /// nodes is one plus the largest node appearing in an arc.
    pub fn from_arcs(arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut arcs = arcs.into_iter().collect::<Vec<_>>();
        arcs.par_sort_unstable();
        arcs.dedup();
        let num_nodes = arcs
            .iter()
            .map(|&(src, dst)| src.max(dst) + 1)
            .max()
            .unwrap_or(0);

        let mut builder = TransitionBuilder::with_capacity(num_nodes, arcs.len());
        let mut succ = vec![];
        let rows = arcs.iter().chunk_by(|(src, _)| *src);
        for (src, group) in &rows {
            builder.pad_to(src);
            succ.clear();
            succ.extend(group.map(|&(_, dst)| dst));
            builder.push_row(&succ);
        }
        builder.build(num_nodes)
    }

    /// Creates the transition matrix of the graph described by an edge-list
    /// file, using the default [`EdgeStream`] options.
    ///
    /// The file must list arcs grouped by ascending source; see
    /// [`EdgeStream`] for the details.
    pub fn from_stream(path: impl AsRef<Path>) -> Result<Self> {
        EdgeStream::new().load(path)
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Returns the number of stored (nonzero) entries.
    pub fn num_nonzeros(&self) -> usize {
        self.values.len()
    }

    /// Returns the weights of the stored entries in row-major order.
    pub fn values(&self) -> &[Float] {
        &self.values
    }

    /// Returns the row pointers.
    ///
    /// Entries of row *i* are those in the range `row_ptr[i]..row_ptr[i + 1]`.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Returns the column indices of the stored entries, parallel to
    /// [`values`](Self::values).
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// Returns, in increasing order, the rows without entries.
    pub fn dangling_nodes(&self) -> &[usize] {
        &self.dangling_nodes
    }

    /// Returns an iterator on the column/weight pairs of a row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not smaller than the number of rows.
    pub fn row(&self, row: usize) -> impl ExactSizeIterator<Item = (usize, Float)> + '_ {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Computes *A*ᵀ **x** without materializing the transpose.
    ///
    /// For each row *i* and each entry (*j*, *w*) of that row, *w* · **x**[*i*]
    /// is added to the output at index *j*: column indices thus address the
    /// output vector. The input must have length
    /// [`num_rows`](Self::num_rows); the output has length
    /// [`num_cols`](Self::num_cols).
    pub fn transposed_multiply(&self, x: &[Float]) -> Result<Vec<Float>> {
        if x.len() != self.num_rows {
            return Err(Error::Dimension {
                expected: self.num_rows,
                actual: x.len(),
            });
        }
        let mut result = vec![0.0; self.num_cols];
        for (&x_i, (&start, &end)) in x.iter().zip(self.row_ptr.iter().tuple_windows()) {
            for k in start..end {
                result[self.col_idx[k]] += self.values[k] * x_i;
            }
        }
        Ok(result)
    }

    /// Computes *A* **x**.
    ///
    /// The input must have length [`num_cols`](Self::num_cols); the output has
    /// length [`num_rows`](Self::num_rows). Empty rows yield zero.
    pub fn multiply(&self, x: &[Float]) -> Result<Vec<Float>> {
        if x.len() != self.num_cols {
            return Err(Error::Dimension {
                expected: self.num_cols,
                actual: x.len(),
            });
        }
        Ok(self
            .row_ptr
            .iter()
            .tuple_windows()
            .map(|(&start, &end)| {
                (start..end)
                    .map(|k| self.values[k] * x[self.col_idx[k]])
                    .sum::<Float>()
            })
            .collect())
    }

    /// Returns the transpose of this matrix.
    ///
    /// The transpose is built with a counting sort on columns, so its rows
    /// have strictly increasing column indices. Note that the dangling rows of
    /// the transpose are the _columns_ of this matrix without entries.
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0; self.num_cols + 1];
        for &col in &self.col_idx {
            row_ptr[col + 1] += 1;
        }
        for i in 0..self.num_cols {
            row_ptr[i + 1] += row_ptr[i];
        }

        let mut next = row_ptr[..self.num_cols].to_vec();
        let mut values = vec![0.0; self.values.len()];
        let mut col_idx = vec![0; self.col_idx.len()];
        for row in 0..self.num_rows {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                let pos = &mut next[self.col_idx[k]];
                values[*pos] = self.values[k];
                col_idx[*pos] = row;
                *pos += 1;
            }
        }
        Self::from_raw(self.num_rows, values, row_ptr, col_idx)
    }

    /// Splits this matrix by rows in `n` parts.
    ///
    /// See [`split`](crate::split::split).
    pub fn split(&self, n: usize) -> Result<Vec<crate::split::Partition>> {
        crate::split::split(self, n)
    }
}

/// Incremental construction of a transition matrix, one row at a time.
///
/// Rows must be pushed in order; gaps are filled by [`pad_to`](Self::pad_to)
/// or, at the end, by [`build`](Self::build).
#[derive(Debug)]
pub(crate) struct TransitionBuilder {
    values: Vec<Float>,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl TransitionBuilder {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub(crate) fn with_capacity(num_nodes: usize, num_arcs: usize) -> Self {
        let mut row_ptr = Vec::with_capacity(num_nodes + 1);
        row_ptr.push(0);
        Self {
            values: Vec::with_capacity(num_arcs),
            row_ptr,
            col_idx: Vec::with_capacity(num_arcs),
        }
    }

    /// The largest number of entries preallocated from a hint.
    const MAX_HINT: usize = 1 << 24;

    /// Reserves space for the given number of nodes and arcs, as declared by
    /// untrusted input.
    ///
    /// Each hint is capped at [`MAX_HINT`](Self::MAX_HINT) entries, and
    /// failed allocations are ignored: vectors will grow on demand.
    pub(crate) fn reserve_hint(&mut self, num_nodes: usize, num_arcs: usize) {
        let num_nodes = num_nodes.min(Self::MAX_HINT) + 1;
        let num_arcs = num_arcs.min(Self::MAX_HINT);
        let reserved = self
            .row_ptr
            .try_reserve(num_nodes.saturating_sub(self.row_ptr.len()))
            .and_then(|_| {
                self.values
                    .try_reserve(num_arcs.saturating_sub(self.values.len()))
            })
            .and_then(|_| {
                self.col_idx
                    .try_reserve(num_arcs.saturating_sub(self.col_idx.len()))
            });
        if let Err(e) = reserved {
            log::warn!("Could not preallocate {num_nodes} rows and {num_arcs} arcs: {e}");
        }
    }

    /// Returns the number of rows pushed so far.
    pub(crate) fn num_rows(&self) -> usize {
        self.row_ptr.len() - 1
    }

    /// Appends empty rows until the next row pushed will be `row`.
    pub(crate) fn pad_to(&mut self, row: usize) {
        debug_assert!(row >= self.num_rows());
        let last = self.values.len();
        self.row_ptr.resize(row + 1, last);
    }

    /// Appends a row whose successors are `succ`, which must be sorted and
    /// without duplicates.
    pub(crate) fn push_row(&mut self, succ: &[usize]) {
        debug_assert!(succ.iter().tuple_windows().all(|(a, b)| a < b));
        if !succ.is_empty() {
            let weight = 1.0 / succ.len() as Float;
            self.col_idx.extend_from_slice(succ);
            self.values
                .extend(std::iter::repeat(weight).take(succ.len()));
        }
        self.row_ptr.push(self.values.len());
    }

    /// Pads the matrix to `num_nodes` rows and returns a square matrix of
    /// that size.
    pub(crate) fn build(mut self, num_nodes: usize) -> Csr {
        debug_assert!(num_nodes >= self.num_rows());
        self.pad_to(num_nodes);
        self.values.shrink_to_fit();
        self.col_idx.shrink_to_fit();
        Csr::from_raw(num_nodes, self.values, self.row_ptr, self.col_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_padding() {
        let mut builder = TransitionBuilder::new();
        builder.reserve_hint(usize::MAX, usize::MAX);
        builder.pad_to(2);
        builder.push_row(&[0, 3]);
        let csr = builder.build(4);
        assert_eq!(csr.row_ptr(), &[0, 0, 0, 2, 2]);
        assert_eq!(csr.col_idx(), &[0, 3]);
        assert_eq!(csr.values(), &[0.5, 0.5]);
        assert_eq!(csr.dangling_nodes(), &[0, 1, 3]);
    }

    #[test]
    fn test_default_is_empty() {
        let csr = Csr::default();
        assert_eq!(csr.num_rows(), 0);
        assert_eq!(csr.num_cols(), 0);
        assert_eq!(csr.row_ptr(), &[0]);
        assert!(csr.dangling_nodes().is_empty());
    }
}
