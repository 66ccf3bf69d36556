//! Shapeshift CLI - map JSON instances between types declared in a model file
//!
//! This is the main entry point for the `shapeshift` binary, providing
//! commands for adapting instances, inspecting compiled plans, and
//! previewing projections.

mod cli;
mod error;
mod handlers;
mod logging;
mod output;
mod schema;

use cli::{Cli, Commands};
use colored::control;
use error::Result;
use logging::LoggingConfig;
use output::OutputWriter;
use schema::Model;
use shapeshift_core::Mapper;
use std::process;
use tracing::instrument;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli), fields(command = ?cli.command))]
fn run(cli: Cli) -> Result<()> {
    let mapper = load_mapper(&cli)?;
    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Map(args) => handlers::handle_map(args, &mapper, &mut output),
        Commands::Plan(args) => handlers::handle_plan(args, &mapper, &mut output),
        Commands::Project(args) => handlers::handle_project(args, &mapper, &mut output),
    }
}

/// Build a mapper holding the model file's types, if one was given
fn load_mapper(cli: &Cli) -> Result<Mapper> {
    let mapper = Mapper::new();
    match &cli.schema {
        Some(path) => {
            tracing::info!("Loading model {}", path.display());
            Model::load(path)?.apply(&mapper)?;
        }
        None => tracing::debug!("No model file; only scalar and untyped mappings are available"),
    }
    Ok(mapper)
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
