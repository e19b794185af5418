/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use pprank::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::io::Write;

#[test]
fn test_from_reader() -> Result<()> {
    let input = "# unordered\n3 1\n0 2\n3 0\n0 2\nnot an arc\n1 3\n";
    let g = Graph::from_reader(input.as_bytes())?;
    assert_eq!(g.num_nodes(), 4);
    assert_eq!(g.num_arcs(), 4);
    assert_eq!(g.successors(0).collect::<Vec<_>>(), vec![2]);
    assert_eq!(g.successors(2).len(), 0);
    assert_eq!(g.successors(3).collect::<Vec<_>>(), vec![0, 1]);
    Ok(())
}

#[test]
fn test_add_node() {
    let mut g = Graph::empty(2);
    assert!(!g.add_node(1));
    assert!(g.add_node(5));
    assert_eq!(g.num_nodes(), 6);
    assert_eq!(g.num_arcs(), 0);
}

#[test]
fn test_write_ordered() -> Result<()> {
    let g = Graph::from_arcs([(2, 0), (0, 2), (0, 1), (2, 1)]);
    let mut out = vec![];
    g.write_ordered(&mut out, true)?;
    assert_eq!(
        String::from_utf8(out)?,
        "# Nodes: 3 Edges: 4\n0 1\n0 2\n2 0\n2 1\n"
    );

    let mut out = vec![];
    g.write_ordered(&mut out, false)?;
    assert_eq!(String::from_utf8(out)?, "0 1\n0 2\n2 0\n2 1\n");
    Ok(())
}

#[test]
fn test_order_then_stream() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    let arcs = (0..500)
        .map(|_| (rng.random_range(0..100), rng.random_range(0..100)))
        .collect::<Vec<(usize, usize)>>();

    let mut unordered = vec![];
    for (src, dst) in &arcs {
        writeln!(unordered, "{src} {dst}")?;
    }
    let g = Graph::from_reader(unordered.as_slice())?;

    let mut ordered = vec![];
    g.write_ordered(&mut ordered, true)?;
    let csr = EdgeStream::new()
        .strict(true)
        .require_header(true)
        .read(ordered.as_slice())?;

    assert_eq!(csr, Csr::from_graph(&g));
    assert_eq!(csr, Csr::from_arcs(arcs));
    Ok(())
}

#[test]
fn test_from_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("arcs.txt");
    std::fs::write(&path, "1 0\n0 1\n")?;
    let g = Graph::from_path(&path)?;
    assert_eq!(g, Graph::from_arcs([(0, 1), (1, 0)]));
    Ok(())
}

#[test]
fn test_to_zero_based() -> Result<()> {
    let input = "# SNAP-like header\n1 2\n2 3\n\n3 1\n";
    let mut out = vec![];
    let num_arcs = to_zero_based(input.as_bytes(), &mut out)?;
    assert_eq!(num_arcs, 3);
    assert_eq!(
        String::from_utf8(out)?,
        "# SNAP-like header\n0 1\n1 2\n\n2 0\n"
    );

    let mut out = vec![];
    assert!(matches!(
        to_zero_based("1 2\n0 1\n".as_bytes(), &mut out),
        Err(Error::Format { line: Some(2), .. })
    ));
    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn test_serde() -> Result<()> {
    let g = Graph::from_arcs([(0, 1), (0, 2), (1, 2), (3, 0)]);
    let json = serde_json::to_string(&g)?;
    let back: Graph = serde_json::from_str(&json)?;
    assert_eq!(back, g);
    Ok(())
}
