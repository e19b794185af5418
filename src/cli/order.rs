/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{create_parent_dir, GlobalArgs};
use crate::graph::Graph;
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

pub const COMMAND_NAME: &str = "order";

#[derive(Args, Debug)]
#[command(about = "Rewrites an edge list with arcs grouped by ascending source and target.", long_about = None)]
struct CliArgs {
    /// The edge list, in any order.
    src: PathBuf,
    /// The output edge list.
    dst: PathBuf,

    #[arg(long)]
    /// Do not write a "# Nodes: … Edges: …" header.
    no_header: bool,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(_global_args: GlobalArgs, submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;

    let graph = Graph::from_path(&args.src)
        .with_context(|| format!("Could not read edge list {}", args.src.display()))?;
    log::info!(
        "Read {} nodes and {} distinct arcs",
        graph.num_nodes(),
        graph.num_arcs()
    );

    create_parent_dir(&args.dst)?;
    let file = File::create(&args.dst)
        .with_context(|| format!("Could not create {}", args.dst.display()))?;
    graph
        .write_ordered(BufWriter::new(file), !args.no_header)
        .with_context(|| format!("Could not write edge list {}", args.dst.display()))?;
    Ok(())
}
