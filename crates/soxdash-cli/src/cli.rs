//! CLI argument definitions for soxdash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `refresh` | Run the price fallback chain once and print the dashboard |
//! | `narrative` | Fetch the AI weekly focus, calendar and news |
//! | `watch` | Refresh periodically with a ticking clock |
//! | `tiers` | List the configured price tiers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Never touch the network; demo data only |
//! | `--tier-timeout-ms` | env or `5000` | Budget for each price tier |
//! | `--ai-tier-timeout-ms` | env or `30000` | Budget for the AI search tier |
//! | `--model` | env or `gemini-2.5-flash` | Gemini model name |
//!
//! # Examples
//!
//! ```bash
//! soxdash refresh --format table
//! soxdash refresh --narrative --pretty
//! soxdash watch --interval-secs 30 --format table
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Semiconductor market dashboard: SOXL, its index, macro gauges and an AI
/// weekly briefing.
#[derive(Debug, Parser)]
#[command(
    name = "soxdash",
    author,
    version,
    about = "Semiconductor market dashboard",
    long_about = "soxdash pulls eight market instruments and a semiconductor heatmap through \
a fallback chain:\n\
\n\
  • primary quotes API (Yahoo Finance)\n\
  • AI search (Gemini with Google Search grounding)\n\
  • bundled demo data\n\
\n\
Configure the AI key with SOXDASH_GEMINI_API_KEY or GEMINI_API_KEY (a .env file works)."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Skip every network call; the chain settles on demo data.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Per-tier timeout budget in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub tier_timeout_ms: Option<u64>,

    /// Timeout budget of the AI search tier in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub ai_tier_timeout_ms: Option<u64>,

    /// Gemini model used for AI search and the narrative.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the price fallback chain once and print the dashboard.
    Refresh(RefreshArgs),
    /// Fetch a fresh AI narrative.
    Narrative,
    /// Refresh on an interval until interrupted.
    Watch(WatchArgs),
    /// List the price tiers in fallback order.
    Tiers,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Also refresh the AI narrative alongside prices.
    #[arg(long, default_value_t = false)]
    pub narrative: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between price refreshes.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// Stop after this many refreshes.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Fetch the AI narrative once at start.
    #[arg(long, default_value_t = false)]
    pub narrative: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "soxdash",
            "refresh",
            "--format",
            "table",
            "--offline",
            "--tier-timeout-ms",
            "250",
            "--ai-tier-timeout-ms",
            "45000",
        ])
        .expect("parses");
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.offline);
        assert_eq!(cli.tier_timeout_ms, Some(250));
        assert_eq!(cli.ai_tier_timeout_ms, Some(45_000));
        assert!(matches!(cli.command, Command::Refresh(RefreshArgs { narrative: false })));
    }

    #[test]
    fn watch_defaults_to_one_minute() {
        let cli = Cli::try_parse_from(["soxdash", "watch"]).expect("parses");
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.interval_secs, 60);
        assert_eq!(args.cycles, None);
    }

    #[test]
    fn zero_timeout_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["soxdash", "tiers", "--tier-timeout-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["soxdash", "tiers", "--ai-tier-timeout-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["soxdash", "watch", "--interval-secs", "0"]).is_err());
    }
}
