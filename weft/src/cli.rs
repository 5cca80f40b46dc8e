use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.weft.toml):
  Searched from the input file's directory upward.

  [weft]
  prefix = \"shadow$\"         # Prefix stripped from @Shadow members
  strict-unique = false      # Fail on colliding public @Unique members
  verbose = false            # Log unique renames and @Final mismatches
  mappings = \"maps.json\"     # Name mappings for remapped lookups

  RUST_LOG overrides the log filter (e.g. RUST_LOG=weft=debug).
";

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "weft",
    version,
    about = "Pre-processes mixin fragments for merging into target classes",
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose diagnostics.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare every fragment and merge it into its targets.
    Apply(ApplyArgs),
    /// Prepare fragments only and report validation errors.
    Check(CheckArgs),
    /// Write a default .weft.toml in the current directory.
    Init,
}

/// Arguments for `weft apply`.
#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Input document (classes and fragments, JSON).
    pub input: PathBuf,

    /// Mapping table (JSON or TOML).
    #[arg(short, long)]
    pub mappings: Option<PathBuf>,

    /// Override the @Shadow prefix.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Fail instead of discarding colliding public @Unique members.
    #[arg(long)]
    pub strict_unique: bool,

    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `weft check`.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Input document (classes and fragments, JSON).
    pub input: PathBuf,

    /// Override the @Shadow prefix.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "weft",
            "apply",
            "in.json",
            "--strict-unique",
            "--prefix",
            "s$",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Apply(args) => {
                assert!(args.strict_unique);
                assert_eq!(args.prefix.as_deref(), Some("s$"));
                assert_eq!(args.input, PathBuf::from("in.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
