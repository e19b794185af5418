/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{parse_duration, FloatVectorFormat, GlobalArgs, StreamArgs};
use crate::rank::preds::{L1Norm, MaxIter};
use crate::rank::{run_partitioned, PageRank, Strategy};
use crate::Float;
use anyhow::{ensure, Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches, ValueEnum};
use dsi_progress_logger::progress_logger;
use predicates::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

pub const COMMAND_NAME: &str = "rank";

/// How workers combine their partial products.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum CliStrategy {
    /// Split the rows of the transition matrix and sum the partial products.
    #[default]
    Reduce,
    /// Split the rows of the transpose and concatenate the partial products.
    Gather,
}

impl From<CliStrategy> for Strategy {
    fn from(s: CliStrategy) -> Self {
        match s {
            CliStrategy::Reduce => Strategy::Reduce,
            CliStrategy::Gather => Strategy::Gather,
        }
    }
}

#[derive(Args, Debug)]
#[command(about = "Computes PageRank by power iteration.", long_about = None)]
struct CliArgs {
    /// The edge list, with arcs grouped by ascending source.
    file: PathBuf,

    #[clap(flatten)]
    stream: StreamArgs,

    #[arg(short, long)]
    /// Where to store the rank vector. Defaults to
    /// `PageRanks-<nodes>-<arcs>.txt` in the current directory.
    output: Option<PathBuf>,

    #[arg(short, long, default_value_t = 0.85)]
    /// The damping factor α (must be in the interval [0 . . 1).
    alpha: Float,

    #[arg(long)]
    /// Maximum number of iterations.
    max_iter: Option<usize>,

    #[arg(short, long, default_value_t = 1e-6)]
    /// Stop when the ℓ₁ norm of the difference between successive
    /// approximations is below this threshold.
    threshold: Float,

    #[arg(short, long, default_value_t = 1)]
    /// The number of workers; with one worker the computation is
    /// single-process.
    workers: usize,

    #[arg(long, value_enum, default_value_t = CliStrategy::Reduce)]
    /// How workers combine their partial products.
    strategy: CliStrategy,

    #[arg(long, value_parser = parse_duration)]
    /// Fail if a worker waits longer than this for its peers (same syntax as
    /// --log-interval). By default, workers wait indefinitely.
    timeout: Option<Duration>,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Indexed)]
    /// The output format for the rank vector.
    fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for text output formats.
    precision: Option<usize>,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(global_args: GlobalArgs, submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    ensure!(
        // Note that 0.0..1.0 is [0.0..1.0) in mathematical notation
        (0.0..1.0).contains(&args.alpha),
        "The damping factor must be in [0 . . 1), got {}",
        args.alpha
    );
    ensure!(args.workers > 0, "The number of workers must be positive");
    // Fail early on a bad threshold
    L1Norm::try_from(args.threshold)?;

    let mut pl = progress_logger![display_memory = true];
    global_args.configure(&mut pl);

    let csr = args
        .stream
        .edge_stream()
        .load_with_logging(&args.file, &mut pl)
        .with_context(|| format!("Could not read edge list {}", args.file.display()))?
        .0;

    let predicate = || {
        let mut predicate = L1Norm::try_from(args.threshold)
            .unwrap_or_default()
            .boxed();
        if let Some(max_iter) = args.max_iter {
            predicate = predicate.or(MaxIter::from(max_iter)).boxed();
        }
        predicate
    };

    let (iterations, rank) = if args.workers == 1 {
        let mut pr = PageRank::new(&csr);
        pr.alpha(args.alpha);
        pr.run_with_logging(predicate(), &mut pl)?;
        log::info!(
            "Completed after {} iteration(s), norm delta = {}",
            pr.iterations(),
            pr.norm_delta()
        );
        (pr.iterations(), pr.into_rank())
    } else {
        run_partitioned(
            &csr,
            args.workers,
            args.strategy.into(),
            args.timeout,
            args.alpha,
            predicate,
        )?
    };
    println!("Iterations: {}", iterations);

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "PageRanks-{}-{}.txt",
            csr.num_rows(),
            csr.num_nonzeros()
        ))
    });
    args.fmt.store(&output, &rank, args.precision)?;

    Ok(())
}
