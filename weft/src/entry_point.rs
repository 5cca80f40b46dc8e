//! Shared entry point for the `weft` binaries.

use crate::cli::{Cli, Commands};
use crate::commands::{self, ApplyRequest};
use crate::config::Config;
use crate::logging;
use anyhow::Result;
use clap::Parser;
use std::path::Path;

/// Run weft with the given arguments (excluding the program name).
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run weft with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if reading inputs or writing output fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["weft".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    match cli.command {
        Commands::Apply(args) => {
            if !input_exists(&args.input) {
                return Ok(1);
            }
            let config = Config::load_from_path(&args.input);
            let mut options = config.options();
            if let Some(prefix) = args.prefix {
                options.shadow_prefix = prefix;
            }
            options.strict_unique |= args.strict_unique;
            options.verbose |= cli.verbose;
            logging::init(options.verbose);
            if let Some(path) = &config.config_file_path {
                tracing::debug!(config = %path.display(), "using config file");
            }

            let request = ApplyRequest {
                mappings: args.mappings.or_else(|| config.mappings_path()),
                input: args.input,
                options,
                json: args.json,
                output: args.output,
            };
            commands::run_apply(&request, writer)
        }
        Commands::Check(args) => {
            if !input_exists(&args.input) {
                return Ok(1);
            }
            let config = Config::load_from_path(&args.input);
            let mut options = config.options();
            if let Some(prefix) = args.prefix {
                options.shadow_prefix = prefix;
            }
            options.verbose |= cli.verbose;
            logging::init(options.verbose);
            commands::run_check(&args.input, &options, args.json, writer)
        }
        Commands::Init => {
            logging::init(cli.verbose);
            commands::run_init(writer)?;
            Ok(0)
        }
    }
}

fn input_exists(path: &Path) -> bool {
    if path.exists() {
        return true;
    }
    eprintln!("Error: The file '{}' does not exist.", path.display());
    false
}
