/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{GlobalArgs, StreamArgs};
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use dsi_progress_logger::progress_logger;
use std::path::PathBuf;

pub const COMMAND_NAME: &str = "info";

#[derive(Args, Debug)]
#[command(about = "Builds the transition matrix of an edge list and prints its statistics.", long_about = None)]
struct CliArgs {
    /// The edge list, with arcs grouped by ascending source.
    file: PathBuf,

    #[clap(flatten)]
    stream: StreamArgs,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(global_args: GlobalArgs, submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;

    let mut pl = progress_logger![display_memory = true];
    global_args.configure(&mut pl);

    let (csr, header) = args
        .stream
        .edge_stream()
        .load_with_logging(&args.file, &mut pl)
        .with_context(|| format!("Could not read edge list {}", args.file.display()))?;

    if let Some(header) = header {
        println!(
            "Header:    {} nodes, {} arcs",
            header.num_nodes, header.num_arcs
        );
    }
    println!("Nodes:     {}", csr.num_rows());
    println!("Arcs:      {}", csr.num_nonzeros());
    println!("Dangling:  {}", csr.dangling_nodes().len());
    Ok(())
}
