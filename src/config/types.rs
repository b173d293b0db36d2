//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{DB_PATH, DB_PATH_ENV};
use crate::filter::TargetingFilter;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the importer treats population and coordinate cells it cannot parse.
///
/// `Lenient` keeps the historical behavior (population becomes 0, coordinates
/// stay unset). `Strict` turns them into record errors so bad source data is
/// visible in the import result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum NumericParsing {
    /// Unparsable numbers are treated as absent
    #[default]
    Lenient,
    /// Unparsable numbers fail the record
    Strict,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Import a semicolon-separated mairie file and create subscribers
/// commune_targeting import mairies.csv --create-subscribers
///
/// # Count enabled subscribers in two departments
/// commune_targeting count --department-codes 75,92
///
/// # Use a custom database
/// commune_targeting --db-path ./custom.db stats
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "commune_targeting",
    about = "Targets subscribers by French geography and imports mairie contacts from CSV."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, value_parser, env = DB_PATH_ENV, default_value = DB_PATH, global = true)]
    pub db_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import communes (and optionally subscribers) from a semicolon-separated CSV file
    Import {
        /// CSV file to read
        #[arg(value_parser)]
        file: PathBuf,

        /// Create or link a subscriber for every record carrying an email
        #[arg(long)]
        create_subscribers: bool,

        /// Treatment of unparsable population/coordinate values
        #[arg(long, value_enum, default_value_t = NumericParsing::Lenient)]
        numeric_parsing: NumericParsing,

        /// Run the whole import, then roll it back
        #[arg(long)]
        dry_run: bool,
    },

    /// List past imports, most recent first
    ImportHistory {
        /// Maximum number of runs to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List all departments
    Departments,

    /// Show one department by code
    Department {
        /// Department code (e.g. 75, 2A, 971)
        code: String,
    },

    /// List communes matching a filter
    Communes {
        #[command(flatten)]
        filter: FilterArgs,

        /// Page size (default 50, at most 1000)
        #[arg(long)]
        limit: Option<String>,

        /// Number of communes to skip
        #[arg(long)]
        offset: Option<String>,
    },

    /// Show one commune by INSEE code
    Commune {
        /// INSEE code (5 characters)
        insee_code: String,
    },

    /// Search communes by name
    Search {
        /// Name fragment (case and accent insensitive)
        query: String,

        /// Page size (default 20, at most 100)
        #[arg(long)]
        limit: Option<String>,
    },

    /// Count enabled subscribers reachable through matching communes
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Preview a targeting filter: count, sample communes and statistics
    Preview {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Statistics for the communes matching a filter
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Coverage and population statistics over all communes
    Overview,

    /// Communes linked to a subscriber
    SubscriberCommunes {
        /// Subscriber id
        subscriber_id: i64,
    },

    /// Link a subscriber to a commune
    Link {
        /// Subscriber id
        subscriber_id: i64,
        /// Commune id
        commune_id: i64,
    },

    /// Remove the link between a subscriber and a commune
    Unlink {
        /// Subscriber id
        subscriber_id: i64,
        /// Commune id
        commune_id: i64,
    },

    /// Export matching communes as semicolon-separated CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Targeting filter as received from the command line.
///
/// Every list is a comma-separated string; see
/// [`crate::filter::TargetingFilter::from_params`] for the parsing rules.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Comma-separated department codes
    #[arg(long)]
    pub department_codes: Option<String>,

    /// Comma-separated region names
    #[arg(long)]
    pub regions: Option<String>,

    /// Comma-separated commune name fragments
    #[arg(long)]
    pub commune_names: Option<String>,

    /// Comma-separated postal codes
    #[arg(long)]
    pub postal_codes: Option<String>,

    /// Minimum population (inclusive)
    #[arg(long)]
    pub population_min: Option<String>,

    /// Maximum population (inclusive)
    #[arg(long)]
    pub population_max: Option<String>,

    /// Whole filter as a JSON object; takes precedence over the other flags
    #[arg(long)]
    pub filter_json: Option<String>,
}

impl FilterArgs {
    /// Converts the arguments into a [`TargetingFilter`].
    ///
    /// `--filter-json` wins over the individual flags when present; it is the
    /// only input that can be rejected.
    pub fn to_filter(&self) -> anyhow::Result<TargetingFilter> {
        if let Some(json) = &self.filter_json {
            return serde_json::from_str(json).context("Invalid --filter-json value");
        }
        Ok(TargetingFilter::from_params(
            self.department_codes.as_deref(),
            self.regions.as_deref(),
            self.commune_names.as_deref(),
            self.postal_codes.as_deref(),
            self.population_min.as_deref(),
            self.population_max.as_deref(),
        ))
    }
}
