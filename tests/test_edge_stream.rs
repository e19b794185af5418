/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::no_logging;
use pprank::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn read(input: &str) -> pprank::Result<Csr> {
    EdgeStream::new().read(input.as_bytes())
}

#[test]
fn test_toy() -> Result<()> {
    let csr = read("# Nodes: 3 Edges: 2\n0 1\n1 2\n")?;
    assert_eq!(csr.values(), &[1.0, 1.0]);
    assert_eq!(csr.row_ptr(), &[0, 1, 2, 2]);
    assert_eq!(csr.col_idx(), &[1, 2]);
    assert_eq!(csr.dangling_nodes(), &[2]);
    assert_eq!(csr, Csr::from_arcs([(0, 1), (1, 2)]));
    Ok(())
}

#[test]
fn test_weights() -> Result<()> {
    let csr = read("0 1\n0 2\n0 3\n0 4\n1 0\n1 2\n")?;
    assert_eq!(csr.values(), &[0.25, 0.25, 0.25, 0.25, 0.5, 0.5]);
    assert_eq!(csr.row_ptr(), &[0, 4, 6, 6, 6, 6]);
    assert_eq!(csr.dangling_nodes(), &[2, 3, 4]);
    Ok(())
}

#[test]
fn test_unsorted_targets_and_duplicates() -> Result<()> {
    let csr = read("0 2\n0 1\n0 2\n2 0\n")?;
    assert_eq!(csr.col_idx(), &[1, 2, 0]);
    assert_eq!(csr.values(), &[0.5, 0.5, 1.0]);
    assert_eq!(csr.row_ptr(), &[0, 2, 2, 3]);
    assert_eq!(csr.dangling_nodes(), &[1]);
    Ok(())
}

#[test]
fn test_gaps() -> Result<()> {
    // Nodes 1 and 3 never appear as sources; node 3 only as a target
    let csr = read("0 3\n2 0\n")?;
    assert_eq!(csr.num_rows(), 4);
    assert_eq!(csr.row_ptr(), &[0, 1, 1, 2, 2]);
    assert_eq!(csr.dangling_nodes(), &[1, 3]);
    Ok(())
}

#[test]
fn test_empty() -> Result<()> {
    let csr = read("")?;
    assert_eq!(csr.num_rows(), 0);
    assert_eq!(csr.row_ptr(), &[0]);
    let csr = read("# just a comment\n\n")?;
    assert_eq!(csr, Csr::default());
    Ok(())
}

#[test]
fn test_malformed_lines() -> Result<()> {
    let csr = read("0 1\nfoo\n1 2 3\n-1 2\n1\n\n  1   2  \n")?;
    assert_eq!(csr, Csr::from_arcs([(0, 1), (1, 2)]));
    Ok(())
}

#[test]
fn test_comment_symbol() -> Result<()> {
    let csr = EdgeStream::new()
        .comment('%')
        .read("% Nodes: 2 Edges: 1\n% 5 7\n0 1\n".as_bytes())?;
    assert_eq!(csr.num_rows(), 2);
    assert_eq!(csr.col_idx(), &[1]);
    Ok(())
}

#[test]
fn test_header_mismatch() {
    // Too many declared nodes
    assert!(matches!(
        read("# Nodes: 4 Edges: 2\n0 1\n1 2\n"),
        Err(Error::Format { line: None, .. })
    ));
    // Too few declared nodes
    assert!(matches!(
        read("# Nodes: 2 Edges: 2\n0 1\n1 2\n"),
        Err(Error::Format { line: None, .. })
    ));
    // Wrong number of arcs
    assert!(matches!(
        read("# Nodes: 3 Edges: 3\n0 1\n1 2\n"),
        Err(Error::Format { line: None, .. })
    ));
}

#[test]
fn test_huge_header_counts() {
    // Declared counts are only a preallocation hint until checked
    for input in [
        "# Nodes: 18446744073709551615 Edges: 1\n0 1\n",
        "# Nodes: 2 Edges: 4611686018427387904\n0 1\n",
        "# Nodes: 2 Edges: 18446744073709551615\n0 1\n",
        "# Nodes: 2 Edges: 1000000000000\n0 1\n",
    ] {
        assert!(
            matches!(read(input), Err(Error::Format { line: None, .. })),
            "{input:?}"
        );
    }
}

#[test]
fn test_header_counts_records() -> Result<()> {
    // Duplicate arcs count as records, but produce a single entry
    let csr = read("# Nodes: 2 Edges: 2\n0 1\n0 1\n")?;
    assert_eq!(csr.num_nonzeros(), 1);
    Ok(())
}

#[test]
fn test_malformed_header() {
    assert!(matches!(
        read("# Nodes: x Edges: 2\n0 1\n1 2\n"),
        Err(Error::Format { line: Some(1), .. })
    ));
    assert!(matches!(
        read("# Nodes: 3 Edges: 2\n# Nodes: 3 Edges: 2\n0 1\n1 2\n"),
        Err(Error::Format { line: Some(2), .. })
    ));
}

#[test]
fn test_late_header_is_a_comment() -> Result<()> {
    let csr = read("0 1\n# Nodes: 10 Edges: 10\n1 2\n")?;
    assert_eq!(csr.num_rows(), 3);
    Ok(())
}

#[test]
fn test_require_header() -> Result<()> {
    let mut edge_stream = EdgeStream::new();
    edge_stream.require_header(true);
    assert!(matches!(
        edge_stream.read("0 1\n1 2\n".as_bytes()),
        Err(Error::Format { line: Some(1), .. })
    ));
    assert!(matches!(
        edge_stream.read("".as_bytes()),
        Err(Error::Format { line: None, .. })
    ));
    let (csr, header) =
        edge_stream.read_with_logging("# Nodes: 3 Edges: 2\n0 1\n1 2\n".as_bytes(), no_logging![])?;
    assert_eq!(csr.num_rows(), 3);
    assert_eq!(
        header,
        Some(Header {
            num_nodes: 3,
            num_arcs: 2
        })
    );
    Ok(())
}

#[test]
fn test_strict() -> Result<()> {
    let input = "1 2\n1 0\n0 1\n";
    let mut edge_stream = EdgeStream::new();
    edge_stream.strict(true);
    match edge_stream.read(input.as_bytes()) {
        Err(Error::Format { line, .. }) => assert_eq!(line, Some(3)),
        other => panic!("Expected a format error, got {other:?}"),
    }

    // Ordered input is accepted
    let csr = edge_stream.read("0 1\n1 0\n1 2\n".as_bytes())?;
    assert_eq!(csr.row_ptr(), &[0, 1, 3, 3]);

    // In lenient mode, the arc from 0 is silently attached to row 1
    let csr = read(input)?;
    assert_eq!(csr.row_ptr(), &[0, 0, 3, 3]);
    assert_eq!(csr.col_idx(), &[0, 1, 2]);
    assert_eq!(csr.dangling_nodes(), &[0, 2]);
    Ok(())
}

#[test]
fn test_load() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "# Directed graph")?;
    writeln!(file, "# Nodes: 5 Edges: 4")?;
    writeln!(file, "# FromNodeId\tToNodeId")?;
    for (src, dst) in [(0, 4), (1, 0), (1, 4), (3, 1)] {
        writeln!(file, "{src}\t{dst}")?;
    }
    file.flush()?;

    let (csr, header) = EdgeStream::new().load_with_logging(file.path(), no_logging![])?;
    assert_eq!(
        header,
        Some(Header {
            num_nodes: 5,
            num_arcs: 4
        })
    );
    assert_eq!(csr, Csr::from_arcs([(0, 4), (1, 0), (1, 4), (3, 1)]));
    assert_eq!(Csr::from_stream(file.path())?, csr);
    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Csr::from_stream(dir.path().join("missing.txt")),
        Err(Error::Io(_))
    ));
}
