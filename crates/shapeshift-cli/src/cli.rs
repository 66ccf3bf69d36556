//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Shapeshift - map object graphs between types described in a model file
#[derive(Parser, Debug)]
#[command(
    name = "shapeshift",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Model file declaring classes, enums and pair options (JSON or YAML)
    #[arg(short, long, global = true, env = "SHAPESHIFT_SCHEMA", value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Adapt a JSON instance of one type into another
    Map(MapArgs),

    /// Show the compiled mapping plan for a type pair
    Plan(PairArgs),

    /// Show the projection expression for a type pair, optionally applying it
    Project(ProjectArgs),
}

/// Source and destination type names
#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    /// Source type (e.g. `Customer`, `List<Customer>`)
    #[arg(long, value_name = "TYPE")]
    pub from: String,

    /// Destination type (e.g. `CustomerDto`, `CustomerDto[]`)
    #[arg(long, value_name = "TYPE")]
    pub to: String,
}

#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// JSON input file; reads stdin when omitted or `-`
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// JSON array of source instances to project in memory
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// YAML output
    Yaml,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
