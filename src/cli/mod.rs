/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command-line interface structs, functions, and methods.
//!
//! Each command is implemented as a submodule.

use crate::edge_stream::EdgeStream;
use crate::Float;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Arg, ArgMatches, Args, Command, ValueEnum};
use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};
use jiff::SpanRound;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

pub mod info;
pub mod order;
pub mod rank;
pub mod zero_based;

/// Arguments shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// How often to log progress.
    pub log_interval: Option<Duration>,
}

impl GlobalArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            log_interval: matches.get_one::<Duration>("log-interval").copied(),
        }
    }

    /// Applies the global options to a progress logger.
    pub fn configure(&self, pl: &mut impl dsi_progress_logger::ProgressLog) {
        if let Some(log_interval) = self.log_interval {
            pl.log_interval(log_interval);
        }
    }
}

#[derive(Args, Debug)]
/// Shared CLI arguments for reading edge lists.
pub struct StreamArgs {
    #[arg(long, default_value_t = '#')]
    /// Ignore lines that start with this symbol.
    pub line_comment_symbol: char,

    #[arg(long)]
    /// Fail if arcs are not grouped by ascending source instead of silently
    /// building a wrong matrix.
    pub strict: bool,

    #[arg(long)]
    /// Fail if the edge list has no "Nodes: … Edges: …" header.
    pub require_header: bool,
}

impl StreamArgs {
    /// Returns an [`EdgeStream`] configured by these arguments.
    pub fn edge_stream(&self) -> EdgeStream {
        let mut edge_stream = EdgeStream::new();
        edge_stream
            .comment(self.line_comment_symbol)
            .strict(self.strict)
            .require_header(self.require_header);
        edge_stream
    }
}

/// How to store vectors of floats.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FloatVectorFormat {
    /// Java-compatible format: a sequence of big-endian floats (32 or 64 bits).
    Java,
    /// ASCII format, one float per line.
    Ascii,
    /// A JSON Array.
    Json,
    /// ASCII format, one `node: value` pair per line, with node zero-padded
    /// to nine digits and value in scientific notation.
    #[default]
    Indexed,
}

impl FloatVectorFormat {
    /// Stores float values in the specified `path` using the format defined by
    /// `self`.
    ///
    /// If the result is a textual format, `precision` will be used to
    /// truncate the float values to the specified number of decimal digits.
    pub fn store(
        &self,
        path: impl AsRef<Path>,
        values: &[Float],
        precision: Option<usize>,
    ) -> Result<()> {
        create_parent_dir(&path)?;
        let path_display = path.as_ref().display();
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create vector at {}", path_display))?;
        let mut file = BufWriter::new(file);

        match self {
            FloatVectorFormat::Java => {
                log::info!("Storing in Java format at {}", path_display);
                for word in values.iter() {
                    file.write_all(word.to_be_bytes().as_ref())
                        .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Ascii => {
                log::info!("Storing in ASCII format at {}", path_display);
                for word in values.iter() {
                    match precision {
                        None => writeln!(file, "{word}"),
                        Some(precision) => writeln!(file, "{word:.precision$}"),
                    }
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Json => {
                log::info!("Storing in JSON format at {}", path_display);
                write!(file, "[")?;
                for word in values.iter().take(values.len().saturating_sub(1)) {
                    match precision {
                        None => write!(file, "{word}, "),
                        Some(precision) => write!(file, "{word:.precision$}, "),
                    }
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
                if let Some(last) = values.last() {
                    match precision {
                        None => write!(file, "{last}"),
                        Some(precision) => write!(file, "{last:.precision$}"),
                    }
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
                write!(file, "]")?;
            }
            FloatVectorFormat::Indexed => {
                log::info!("Storing in indexed format at {}", path_display);
                let precision = precision.unwrap_or(6);
                for (node, word) in values.iter().enumerate() {
                    writeln!(file, "{node:09}: {word:.precision$e}")
                        .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
        }

        file.flush()
            .with_context(|| format!("Could not write vector to {}", path_display))?;
        Ok(())
    }
}

/// Creates all parent directories of the given file path.
pub fn create_parent_dir(file_path: impl AsRef<Path>) -> Result<()> {
    // ensure that the dst directory exists
    if let Some(parent_dir) = file_path.as_ref().parent() {
        std::fs::create_dir_all(parent_dir).with_context(|| {
            format!(
                "Failed to create the directory {:?}",
                parent_dir.to_string_lossy()
            )
        })?;
    }
    Ok(())
}

/// Parse a duration from a string.
/// For compatibility with Java, if no suffix is given, it is assumed to be in milliseconds.
/// You can use suffixes, the available ones are:
/// - `s` for seconds
/// - `m` for minutes
/// - `h` for hours
/// - `d` for days
///
/// Example: `1d2h3m4s567` this is parsed as: 1 day, 2 hours, 3 minutes, 4 seconds, and 567 milliseconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    if value.is_empty() {
        bail!("Empty duration string, if you want every 0 milliseconds use `0`.");
    }
    let mut duration = Duration::from_secs(0);
    let mut acc = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            acc.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            let dur = acc.parse::<u64>()?;
            match c {
                's' => duration += Duration::from_secs(dur),
                'm' => duration += Duration::from_secs(dur * 60),
                'h' => duration += Duration::from_secs(dur * 60 * 60),
                'd' => duration += Duration::from_secs(dur * 60 * 60 * 24),
                _ => return Err(anyhow!("Invalid duration suffix: {}", c)),
            }
            acc.clear();
        }
    }
    if !acc.is_empty() {
        let dur = acc.parse::<u64>()?;
        duration += Duration::from_millis(dur);
    }
    Ok(duration)
}

/// Installs an [`env_logger`] logger printing a timestamp and the time
/// elapsed since installation; the default filter is `info`.
pub fn init_envlogger() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    let printer = SpanPrinter::new()
        .spacing(Spacing::None)
        .designator(Designator::Compact);
    let span_round = SpanRound::new()
        .largest(jiff::Unit::Day)
        .smallest(jiff::Unit::Millisecond)
        .days_are_24_hours();

    builder.format(move |buf, record| {
        let Ok(ts) = jiff::Timestamp::try_from(SystemTime::now()) else {
            return Err(std::io::Error::other("Failed to get timestamp"));
        };
        let style = buf.default_level_style(record.level());
        let elapsed = start.elapsed();
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64);
        let span = span.round(span_round).map_err(std::io::Error::other)?;
        writeln!(
            buf,
            "{} {} {style}{}{style:#} [{}] {} - {}",
            ts.strftime("%F %T%.3f"),
            printer.span_to_string(&span),
            record.level(),
            std::thread::current().name().unwrap_or("main"),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

/// The entry point of the command-line interface.
pub fn main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();

    let command = Command::new("pprank")
        .about("Compute PageRank of large graphs on sparse transition matrices.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-interval")
                .short('l')
                .long("log-interval")
                .value_parser(parse_duration)
                .help(
                    "How often to log progress. Default is 10s. You can use the suffixes `s` for seconds, `m` for minutes, `h` for hours, and `d` for days. If no suffix is provided it is assumed to be in milliseconds. Example: `1d2h3m4s567` is parsed as 1 day + 2 hours + 3 minutes + 4 seconds + 567 milliseconds = 93784567 milliseconds.",)
                .global(true),
        )
        .after_help(
            "Environment (noteworthy environment variables used):
RUST_LOG: configuration for env_logger, pass `info` to see the progress of the
  computation, `debug` to see skipped lines and worker assignments. You can
  also use `RUST_LOG=pprank=debug` to see only the pprank logs.
",
        );

    macro_rules! impl_dispatch {
        ($command:expr, $($module:ident),*) => {{
            let command = $command;
            $(
                let command = $module::cli(command);
            )*
            let command = command.display_order(0); // sort args alphabetically
            let mut help_command = command.clone();
            let matches = command.get_matches_from(args);
            let global_args = GlobalArgs::from_matches(&matches);

            match matches.subcommand() {
                $(
                    Some(($module::COMMAND_NAME, sub_m)) => $module::main(global_args, sub_m),
                )*
                Some((command_name, _)) => {
                    // this shouldn't happen as clap should catch this
                    help_command.print_help()?;
                    bail!("Unknown command: {:?}", command_name);
                }
                None => {
                    help_command.print_help()?;
                    return Ok(());
                }
            }
        }};
    }

    impl_dispatch!(command, info, order, rank, zero_based)?;

    log::info!(
        "The command took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );

    Ok(())
}

/// Pretty prints seconds in a humanly readable format.
fn pretty_print_elapsed(elapsed: f64) -> String {
    let mut result = String::new();
    let mut elapsed_seconds = elapsed as u64;
    let weeks = elapsed_seconds / (60 * 60 * 24 * 7);
    elapsed_seconds %= 60 * 60 * 24 * 7;
    let days = elapsed_seconds / (60 * 60 * 24);
    elapsed_seconds %= 60 * 60 * 24;
    let hours = elapsed_seconds / (60 * 60);
    elapsed_seconds %= 60 * 60;
    let minutes = elapsed_seconds / 60;

    match weeks {
        0 => {}
        1 => result.push_str("1 week "),
        _ => result.push_str(&format!("{} weeks ", weeks)),
    }
    match days {
        0 => {}
        1 => result.push_str("1 day "),
        _ => result.push_str(&format!("{} days ", days)),
    }
    match hours {
        0 => {}
        1 => result.push_str("1 hour "),
        _ => result.push_str(&format!("{} hours ", hours)),
    }
    match minutes {
        0 => {}
        1 => result.push_str("1 minute "),
        _ => result.push_str(&format!("{} minutes ", minutes)),
    }

    result.push_str(&format!("{:.3} seconds ({}s)", elapsed % 60.0, elapsed));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() -> Result<()> {
        assert_eq!(parse_duration("250")?, Duration::from_millis(250));
        assert_eq!(
            parse_duration("1m30s")?,
            Duration::from_secs(90)
        );
        assert_eq!(
            parse_duration("1d2h3m4s567")?,
            Duration::from_millis(93784567)
        );
        assert!(parse_duration("").is_err());
        assert!(parse_duration("3x").is_err());
        Ok(())
    }

    #[test]
    fn test_pretty_print_elapsed() {
        assert_eq!(pretty_print_elapsed(1.5), "1.500 seconds (1.5s)");
        assert_eq!(
            pretty_print_elapsed(3661.0),
            "1 hour 1 minute 1.000 seconds (3661s)"
        );
    }
}
