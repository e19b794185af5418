/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Row-wise partitioning of sparse matrices for parallel execution.
//!
//! A matrix with *r* rows is split in *n* parts of ⌈*r* / *n*⌉ contiguous
//! rows each, except for the last parts, which contain the remaining rows.
//! Every part is an independent [`Csr`] with its own zero-based row
//! numbering, together with the global index of its first row.
//!
//! The nominal block size is used consistently for all offsets: part *k*
//! starts at row *k* ⌈*r* / *n*⌉ (clamped to *r*). Thus, when the rows run out
//! before the last part, the trailing parts are empty; for example, splitting
//! 10 rows in 6 parts yields five parts of two rows and an empty part at
//! offset 10. The parts always tile the row range exactly, and the result
//! depends only on the matrix and on *n*.

use crate::csr::Csr;
use crate::{Error, Result};

/// A block of contiguous rows of a matrix.
///
/// By setting the feature `serde`, this struct can be serialized and
/// deserialized using [serde](https://crates.io/crates/serde).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    row_offset: usize,
    matrix: Csr,
}

impl Partition {
    /// Returns the global index of the first row of the block.
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// Returns the rows of the block as a matrix.
    ///
    /// Row indices are local, whereas column indices are those of the
    /// original matrix.
    pub fn matrix(&self) -> &Csr {
        &self.matrix
    }

    /// Returns the range of global rows covered by the block.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.row_offset..self.row_offset + self.matrix.num_rows()
    }

    pub fn into_inner(self) -> (usize, Csr) {
        (self.row_offset, self.matrix)
    }
}

/// Splits a matrix by rows in exactly `n` parts.
///
/// Row pointers of each part are rebased to start from zero; values and
/// column indices are copied verbatim, so column indices still refer to the
/// full-width vector.
///
/// Concatenating the rows of the parts in order yields the original matrix.
///
/// # Errors
///
/// Returns a [partition error](Error::Partition) if `n` is zero or larger
/// than the number of rows.
pub fn split(matrix: &Csr, n: usize) -> Result<Vec<Partition>> {
    let num_rows = matrix.num_rows();
    if n == 0 || n > num_rows {
        return Err(Error::Partition { num_rows, parts: n });
    }

    let block_size = num_rows.div_ceil(n);
    let row_ptr = matrix.row_ptr();
    let mut parts = Vec::with_capacity(n);
    let mut consumed = 0;

    for k in 0..n {
        let start = (k * block_size).min(num_rows);
        let end = (start + block_size).min(num_rows);
        debug_assert_eq!(row_ptr[start], consumed);

        let sub_row_ptr = row_ptr[start..=end]
            .iter()
            .map(|&p| p - consumed)
            .collect::<Vec<_>>();
        let range = consumed..row_ptr[end];
        let sub = Csr::from_raw(
            matrix.num_cols(),
            matrix.values()[range.clone()].to_vec(),
            sub_row_ptr,
            matrix.col_idx()[range].to_vec(),
        );
        consumed = row_ptr[end];

        parts.push(Partition {
            row_offset: start,
            matrix: sub,
        });
    }

    debug_assert_eq!(consumed, matrix.num_nonzeros());
    log::debug!(
        "Split {} rows in {} parts of at most {} rows",
        num_rows,
        n,
        block_size
    );
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_empty_part() -> anyhow::Result<()> {
        let csr = Csr::from_arcs((0..10).map(|i| (i, (i + 1) % 10)));
        let parts = split(&csr, 6)?;
        assert_eq!(parts.len(), 6);
        let offsets = parts.iter().map(Partition::row_offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(parts[5].matrix().num_rows(), 0);
        assert_eq!(parts[5].matrix().row_ptr(), &[0]);
        Ok(())
    }
}
