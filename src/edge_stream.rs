/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Streaming construction of transition matrices from edge-list files.
//!
//! An edge list is a text file in which each record is a line containing two
//! whitespace-separated node identifiers, the source and the target of an
//! arc. Lines starting with a comment marker are ignored, and so are lines
//! that do not contain exactly two unsigned integers. Before the first arc
//! there might be a header of the form
//!
//! ```text
//! # Nodes: 875713 Edges: 5105039
//! ```
//!
//! which is used to preallocate the matrix and to validate the final counts.
//!
//! Arcs must be grouped by ascending source: in this case the matrix is
//! built in a single pass, without sorting. Since this precondition is not
//! checked by default, an out-of-order source silently produces a wrong
//! matrix (its arcs are attached to the row being built); enable
//! [strict mode](EdgeStream::strict) to have it reported as an error.
//! [`Graph::write_ordered`](crate::graph::Graph::write_ordered) can be used
//! to rewrite an arbitrary edge list in the required order.

use crate::csr::{Csr, TransitionBuilder};
use crate::{Error, Result};
use dsi_progress_logger::{no_logging, ProgressLog};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The counts declared in the header of an edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The declared number of nodes.
    pub num_nodes: usize,
    /// The declared number of arcs.
    pub num_arcs: usize,
}

impl Header {
    /// Parses the body of a comment line (that is, the line without the
    /// comment marker).
    ///
    /// Returns `Ok(None)` if the line is not a header, and an error message
    /// if the line starts like a header but it is malformed.
    pub fn parse(body: &str) -> std::result::Result<Option<Self>, String> {
        let mut tokens = body.split_whitespace();
        if tokens.next() != Some("Nodes:") {
            return Ok(None);
        }
        let num_nodes = tokens
            .next()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| format!("Malformed node count in header {:?}", body.trim()))?;
        if tokens.next() != Some("Edges:") {
            return Err(format!("Missing edge count in header {:?}", body.trim()));
        }
        let num_arcs = tokens
            .next()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| format!("Malformed edge count in header {:?}", body.trim()))?;
        if tokens.next().is_some() {
            return Err(format!("Trailing data in header {:?}", body.trim()));
        }
        Ok(Some(Header {
            num_nodes,
            num_arcs,
        }))
    }
}

/// Parses an arc, that is, a line made of exactly two unsigned integers.
pub(crate) fn parse_arc(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let src = tokens.next()?.parse().ok()?;
    let dst = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some((src, dst))
}

/// Options for reading an edge list into a [`Csr`] transition matrix.
///
/// # Examples
///
/// ```
/// use pprank::edge_stream::EdgeStream;
///
/// let input = "# Nodes: 3 Edges: 2\n0 1\n1 2\n";
/// let csr = EdgeStream::new().strict(true).read(input.as_bytes())?;
/// assert_eq!(csr.row_ptr(), &[0, 1, 2, 2]);
/// assert_eq!(csr.col_idx(), &[1, 2]);
/// assert_eq!(csr.dangling_nodes(), &[2]);
/// # Ok::<(), pprank::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EdgeStream {
    comment: char,
    strict: bool,
    require_header: bool,
}

impl core::default::Default for EdgeStream {
    fn default() -> Self {
        Self {
            comment: '#',
            strict: false,
            require_header: false,
        }
    }
}

impl EdgeStream {
    /// Creates a reader with the default options: comments start with `#`,
    /// ordering is not checked and the header is optional.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comment marker.
    pub fn comment(&mut self, comment: char) -> &mut Self {
        self.comment = comment;
        self
    }

    /// Sets whether sources must be checked to be nondecreasing.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Sets whether a missing header is an error.
    pub fn require_header(&mut self, require_header: bool) -> &mut Self {
        self.require_header = require_header;
        self
    }

    /// Reads the transition matrix of the edge list in the given file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Csr> {
        Ok(self.load_with_logging(path, no_logging![])?.0)
    }

    /// Reads the transition matrix of the edge list in the given file,
    /// logging progress and returning the header, if present.
    pub fn load_with_logging(
        &self,
        path: impl AsRef<Path>,
        pl: &mut impl ProgressLog,
    ) -> Result<(Csr, Option<Header>)> {
        let path = path.as_ref();
        log::info!("Reading arcs from {}", path.display());
        let file = File::open(path)?;
        self.read_with_logging(BufReader::new(file), pl)
    }

    /// Reads the transition matrix of the edge list returned by a reader.
    pub fn read(&self, reader: impl BufRead) -> Result<Csr> {
        Ok(self.read_with_logging(reader, no_logging![])?.0)
    }

    /// Reads the transition matrix of the edge list returned by a reader,
    /// logging progress and returning the header, if present.
    pub fn read_with_logging(
        &self,
        reader: impl BufRead,
        pl: &mut impl ProgressLog,
    ) -> Result<(Csr, Option<Header>)> {
        let mut header: Option<Header> = None;
        let mut builder = TransitionBuilder::new();
        // The source being accumulated, and its successors
        let mut current: Option<usize> = None;
        let mut succ = vec![];
        let mut max_node: Option<usize> = None;
        let mut num_arcs = 0;
        let mut skipped = 0;

        pl.item_name("arc");
        pl.expected_updates(None);
        pl.start("Reading arcs...");

        for (line_num, line) in (1..).zip(reader.lines()) {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(body) = trimmed.strip_prefix(self.comment) {
                if max_node.is_none() {
                    match Header::parse(body) {
                        Ok(Some(h)) => {
                            if header.is_some() {
                                return Err(Error::format(Some(line_num), "Duplicate header"));
                            }
                            log::info!(
                                "Header declares {} nodes and {} arcs",
                                h.num_nodes,
                                h.num_arcs
                            );
                            builder.reserve_hint(h.num_nodes, h.num_arcs);
                            pl.expected_updates(Some(h.num_arcs));
                            header = Some(h);
                        }
                        Ok(None) => {}
                        Err(message) => return Err(Error::format(Some(line_num), message)),
                    }
                }
                continue;
            }

            let Some((src, dst)) = parse_arc(trimmed) else {
                log::debug!("Skipping malformed line {}: {:?}", line_num, line);
                skipped += 1;
                continue;
            };

            if self.require_header && header.is_none() {
                return Err(Error::format(
                    Some(line_num),
                    "Missing header before the first arc",
                ));
            }

            match current {
                Some(c) if src == c => {}
                Some(c) if src < c => {
                    if self.strict {
                        return Err(Error::format(
                            Some(line_num),
                            format!(
                                "Source {src} follows source {c}: arcs must be grouped by ascending source"
                            ),
                        ));
                    }
                }
                _ => {
                    if let Some(c) = current {
                        flush_row(&mut builder, c, &mut succ);
                    }
                    current = Some(src);
                }
            }

            succ.push(dst);
            num_arcs += 1;
            max_node = Some(max_node.map_or(src.max(dst), |m| m.max(src).max(dst)));
            pl.light_update();
        }

        if let Some(c) = current {
            flush_row(&mut builder, c, &mut succ);
        }
        pl.done();

        if self.require_header && header.is_none() {
            return Err(Error::format(None, "Missing header"));
        }

        let num_nodes = max_node.map_or(0, |m| m + 1);
        if skipped > 0 {
            log::warn!("Skipped {} malformed lines", skipped);
        }

        if let Some(h) = header {
            if h.num_nodes != num_nodes {
                return Err(Error::format(
                    None,
                    format!(
                        "The header declares {} nodes, but the largest node is {:?}",
                        h.num_nodes, max_node
                    ),
                ));
            }
            if h.num_arcs != num_arcs {
                return Err(Error::format(
                    None,
                    format!(
                        "The header declares {} arcs, but {} arcs were read",
                        h.num_arcs, num_arcs
                    ),
                ));
            }
        }

        let csr = builder.build(num_nodes);
        log::info!(
            "Nodes: {} Arcs: {} Dangling: {}",
            csr.num_rows(),
            csr.num_nonzeros(),
            csr.dangling_nodes().len()
        );
        Ok((csr, header))
    }
}

/// Writes the row of `src` to the builder, filling the gap since the last
/// row, and clears `succ`.
fn flush_row(builder: &mut TransitionBuilder, src: usize, succ: &mut Vec<usize>) {
    succ.sort_unstable();
    succ.dedup();
    builder.pad_to(src);
    builder.push_row(succ);
    succ.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        assert_eq!(
            Header::parse(" Nodes: 10 Edges: 20"),
            Ok(Some(Header {
                num_nodes: 10,
                num_arcs: 20
            }))
        );
        assert_eq!(
            Header::parse("\tNodes:\t3\tEdges:\t2"),
            Ok(Some(Header {
                num_nodes: 3,
                num_arcs: 2
            }))
        );
        assert_eq!(Header::parse(" Directed graph (each pair saved once)"), Ok(None));
        assert!(Header::parse(" Nodes: ten Edges: 20").is_err());
        assert!(Header::parse(" Nodes: 10").is_err());
        assert!(Header::parse(" Nodes: 10 Edges: 20 Extra").is_err());
    }

    #[test]
    fn test_parse_arc() {
        assert_eq!(parse_arc("0 1"), Some((0, 1)));
        assert_eq!(parse_arc("12\t7"), Some((12, 7)));
        assert_eq!(parse_arc("1"), None);
        assert_eq!(parse_arc("1 2 3"), None);
        assert_eq!(parse_arc("-1 2"), None);
        assert_eq!(parse_arc("a b"), None);
    }
}
