/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! In-memory edge maps and edge-list conversions.

use crate::edge_stream::parse_arc;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// A mutable graph based on a vector of [`BTreeSet`].
///
/// Contrarily to [`EdgeStream`](crate::edge_stream::EdgeStream), arcs can be
/// added in any order, and duplicate arcs are ignored. The price is a much
/// larger memory footprint, so this structure is suitable for small graphs,
/// or to reorder an edge list.
///
/// By setting the feature `serde`, this struct can be serialized and
/// deserialized using [serde](https://crates.io/crates/serde).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    /// The number of arcs in the graph.
    num_arcs: usize,
    /// For each node, its set of successors.
    succ: Vec<BTreeSet<usize>>,
}

impl Graph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new graph with `n` nodes and no arcs.
    pub fn empty(n: usize) -> Self {
        Self {
            num_arcs: 0,
            succ: Vec::from_iter((0..n).map(|_| BTreeSet::new())),
        }
    }

    /// Creates a new graph from an iterator of arcs.
    pub fn from_arcs(arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut g = Self::new();
        for (src, dst) in arcs {
            g.add_arc(src, dst);
        }
        g
    }

    /// Reads a graph from an edge list in arbitrary order.
    ///
    /// The syntax is that of [`EdgeStream`](crate::edge_stream::EdgeStream):
    /// lines starting with `#` and lines not made of exactly two unsigned
    /// integers are skipped. The number of nodes is one plus the largest node
    /// appearing in an arc.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut g = Self::new();
        let mut skipped = 0;
        for (line_num, line) in (1..).zip(reader.lines()) {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_arc(trimmed) {
                Some((src, dst)) => {
                    g.add_arc(src, dst);
                }
                None => {
                    log::debug!("Skipping malformed line {}: {:?}", line_num, line);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} malformed lines", skipped);
        }
        Ok(g)
    }

    /// Reads a graph from a file containing an edge list in arbitrary order.
    ///
    /// See [`from_reader`](Self::from_reader).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading arcs from {}", path.display());
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    /// Returns the number of (distinct) arcs.
    pub fn num_arcs(&self) -> usize {
        self.num_arcs
    }

    /// Adds an isolated node to the graph, extending the node range as
    /// needed, and returns true if it is a new node.
    pub fn add_node(&mut self, node: usize) -> bool {
        let len = self.succ.len();
        self.succ.extend((len..=node).map(|_| BTreeSet::new()));
        len <= node
    }

    /// Adds an arc to the graph, extending the node range as needed, and
    /// returns whether it is a new one.
    pub fn add_arc(&mut self, src: usize, dst: usize) -> bool {
        self.add_node(src.max(dst));
        let result = self.succ[src].insert(dst);
        self.num_arcs += result as usize;
        result
    }

    /// Returns the successors of a node in increasing order.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not smaller than the number of nodes.
    pub fn successors(&self, node: usize) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.succ[node].iter().copied()
    }

    /// Returns the outdegree of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not smaller than the number of nodes.
    pub fn outdegree(&self, node: usize) -> usize {
        self.succ[node].len()
    }

    /// Writes the arcs of this graph as an edge list grouped by ascending
    /// source, with ascending targets within each group.
    ///
    /// The output satisfies the ordering precondition of
    /// [`EdgeStream`](crate::edge_stream::EdgeStream). If `header` is true,
    /// a `# Nodes: … Edges: …` header is written first.
    pub fn write_ordered(&self, mut writer: impl Write, header: bool) -> Result<()> {
        if header {
            writeln!(
                writer,
                "# Nodes: {} Edges: {}",
                self.num_nodes(),
                self.num_arcs()
            )?;
        }
        for (src, succ) in self.succ.iter().enumerate() {
            for dst in succ {
                writeln!(writer, "{} {}", src, dst)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Rewrites an edge list with one-based node identifiers using zero-based
/// identifiers.
///
/// Every line made of two unsigned integers `a b` is written as `a-1 b-1`;
/// all other lines are copied verbatim. Returns the number of rewritten
/// arcs.
///
/// An arc containing node 0 is a [format error](Error::Format).
pub fn to_zero_based(reader: impl BufRead, mut writer: impl Write) -> Result<usize> {
    let mut num_arcs = 0;
    for (line_num, line) in (1..).zip(reader.lines()) {
        let line = line?;
        match parse_arc(line.trim()) {
            Some((src, dst)) => {
                if src == 0 || dst == 0 {
                    return Err(Error::format(
                        Some(line_num),
                        "Node 0 in a one-based edge list",
                    ));
                }
                writeln!(writer, "{} {}", src - 1, dst - 1)?;
                num_arcs += 1;
            }
            None => writeln!(writer, "{}", line)?,
        }
    }
    writer.flush()?;
    Ok(num_arcs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_arc() {
        let mut g = Graph::new();
        assert!(g.add_arc(3, 1));
        assert!(!g.add_arc(3, 1));
        assert!(g.add_arc(0, 3));
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_arcs(), 2);
        assert_eq!(g.outdegree(2), 0);
        assert_eq!(g.successors(3).collect::<Vec<_>>(), vec![1]);
    }
}
