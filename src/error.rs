/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use thiserror::Error;

/// Errors returned by the library.
///
/// None of them is retried: they are surfaced to the caller as soon as they
/// are detected, and no partial result is salvaged.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing header, unordered input in strict mode, or a
    /// mismatch between declared and observed counts.
    #[error("Format error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Format {
        line: Option<usize>,
        message: String,
    },
    /// A vector passed to a matrix-vector product has the wrong length.
    #[error("Dimension mismatch: expected a vector of length {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
    /// A matrix cannot be split in the requested number of parts.
    #[error("Cannot split {num_rows} rows in {parts} parts")]
    Partition { num_rows: usize, parts: usize },
    /// The underlying file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A collective call did not complete within the configured timeout.
    #[error("Worker {rank} timed out waiting for round {round}")]
    Timeout { rank: usize, round: u64 },
    /// A peer worker left the group.
    #[error("Worker {rank} lost contact with its peers in round {round}")]
    Disconnected { rank: usize, round: u64 },
    /// Workers of a group performed different collective calls in the same
    /// round.
    #[error("Worker {rank} and worker {peer} performed different collective calls in round {round}")]
    Mismatch { rank: usize, peer: usize, round: u64 },
}

impl Error {
    pub(crate) fn format(line: Option<usize>, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }
}

/// A specialized [`Result`](std::result::Result) for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_display() {
        let e = Error::format(Some(3), "bad header");
        assert_eq!(e.to_string(), "Format error at line 3: bad header");
        let e = Error::format(None, "edge count mismatch");
        assert_eq!(e.to_string(), "Format error: edge count mismatch");
    }
}
