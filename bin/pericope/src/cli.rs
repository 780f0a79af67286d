//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pericope_wire::Testament;

/// Pericope - scripture browser over a lossy single-message link
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Configuration file, created with defaults if missing.
    #[arg(long, global = true, default_value = "pericope.toml", value_name = "PATH")]
    pub(crate) config: PathBuf,

    /// Link and companion overrides.
    #[command(flatten)]
    pub(crate) link: LinkArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// List the books of a testament.
    Books {
        /// `old` or `new`.
        testament: Testament,
    },
    /// List the verse ranges of a chapter.
    Ranges { book: String, chapter: u8 },
    /// Read a passage.
    Read {
        book: String,
        chapter: u8,
        /// Verse range such as `1-15`.
        range: String,
    },
    /// List the favorites.
    Favorites,
    /// Add or remove a favorite, then list the favorites.
    ToggleFavorite {
        book: String,
        chapter: u8,
        range: String,
    },
    /// Print the effective configuration.
    Config,
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "pericope_delivery=trace").
    #[arg(long = "log.filter", global = true, value_name = "DIRECTIVE")]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub(crate) json: bool,
}

/// Overrides for the link and companion sections of the configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Link")]
pub(crate) struct LinkArgs {
    /// Probability that an outbound transmission fails.
    #[arg(long = "link.failure-rate", global = true, value_name = "RATE")]
    pub(crate) failure_rate: Option<f64>,

    /// Probability that one attempt at sending a response fails.
    #[arg(long = "link.inbound-failure-rate", global = true, value_name = "RATE")]
    pub(crate) inbound_failure_rate: Option<f64>,

    /// One-way link latency in milliseconds.
    #[arg(long = "link.latency-ms", global = true, value_name = "MS")]
    pub(crate) latency_ms: Option<u64>,

    /// Seed for failure simulation.
    #[arg(long = "link.seed", global = true, value_name = "SEED")]
    pub(crate) seed: Option<u64>,

    /// JSON verse file served by the companion.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) verses: Option<PathBuf>,

    /// Favorites file kept by the companion.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) favorites: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_read() {
        let cli = Cli::parse_from([
            "pericope",
            "-vv",
            "--link.failure-rate",
            "0.5",
            "--link.inbound-failure-rate",
            "0.25",
            "read",
            "John",
            "11",
            "31-45",
        ]);
        assert_eq!(cli.logs.verbosity, 2);
        assert_eq!(cli.link.failure_rate, Some(0.5));
        assert_eq!(cli.link.inbound_failure_rate, Some(0.25));
        assert!(matches!(
            cli.command,
            Commands::Read { ref book, chapter: 11, ref range } if book == "John" && range == "31-45"
        ));
    }

    #[test]
    fn test_parse_testament() {
        let cli = Cli::parse_from(["pericope", "books", "new"]);
        assert!(matches!(
            cli.command,
            Commands::Books {
                testament: Testament::New
            }
        ));
    }
}
