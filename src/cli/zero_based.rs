/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{create_parent_dir, GlobalArgs};
use crate::graph::to_zero_based;
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

pub const COMMAND_NAME: &str = "zero-based";

#[derive(Args, Debug)]
#[command(about = "Rewrites an edge list with one-based node identifiers using zero-based identifiers.", long_about = None)]
struct CliArgs {
    /// The edge list with one-based identifiers.
    src: PathBuf,
    /// The output edge list.
    dst: PathBuf,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(_global_args: GlobalArgs, submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;

    let src = File::open(&args.src)
        .with_context(|| format!("Could not open {}", args.src.display()))?;
    create_parent_dir(&args.dst)?;
    let dst = File::create(&args.dst)
        .with_context(|| format!("Could not create {}", args.dst.display()))?;

    let num_arcs = to_zero_based(BufReader::new(src), BufWriter::new(dst))
        .with_context(|| format!("Could not convert {}", args.src.display()))?;
    log::info!("Rewrote {} arcs", num_arcs);
    Ok(())
}
