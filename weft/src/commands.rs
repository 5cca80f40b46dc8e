//! Implementations of the `weft` subcommands.

use crate::config::WeaveOptions;
use crate::constants::CONFIG_FILENAME;
use crate::input::WeaveInput;
use crate::output::{self, CheckRow};
use crate::preprocess::PreProcessor;
use crate::registry::ClassRegistry;
use crate::remap::{MappingTable, NoRemap, Remapper};
use crate::weaver::Weaver;

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default configuration written by `weft init`.
pub const DEFAULT_CONFIG: &str = r#"[weft]
prefix = "shadow$"         # Prefix stripped from @Shadow members
strict-unique = false      # Fail instead of discarding colliding public @Unique members
verbose = false            # Log unique renames and @Final mismatches
# mappings = "mappings.json"  # Name mappings for remapped lookups
"#;

/// Everything `weft apply` needs after CLI and config are merged.
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    /// Input document.
    pub input: PathBuf,
    /// Mapping table, if any.
    pub mappings: Option<PathBuf>,
    /// Engine options.
    pub options: WeaveOptions,
    /// Print JSON instead of tables.
    pub json: bool,
    /// Also write the JSON report here.
    pub output: Option<PathBuf>,
}

fn load_remapper(mappings: Option<&Path>) -> Result<Arc<dyn Remapper>> {
    Ok(match mappings {
        Some(path) => Arc::new(MappingTable::load(path)?),
        None => Arc::new(NoRemap),
    })
}

/// Runs `weft apply`. Returns the process exit code.
pub fn run_apply<W: Write>(request: &ApplyRequest, writer: &mut W) -> Result<i32> {
    let input = WeaveInput::load(&request.input)?;
    let remapper = load_remapper(request.mappings.as_deref())?;
    let registry = Arc::new(ClassRegistry::new(input.source()));
    let weaver = Weaver::new(registry, remapper, request.options.clone());

    let mut fragments = input.fragments;
    let report = weaver.weave(&mut fragments);

    if request.json {
        writeln!(writer, "{}", output::report_json(&report)?)?;
    } else {
        output::print_report(writer, &report)?;
    }
    if let Some(path) = &request.output {
        fs::write(path, output::report_json(&report)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(i32::from(!report.is_success()))
}

/// Runs `weft check`: prepare only. Returns the process exit code.
pub fn run_check<W: Write>(input: &Path, options: &WeaveOptions, json: bool, writer: &mut W) -> Result<i32> {
    let input = WeaveInput::load(input)?;
    let registry = ClassRegistry::new(input.source());
    let processor = PreProcessor::new(&registry, &NoRemap, options);

    let mut rows = Vec::with_capacity(input.fragments.len());
    for mut fragment in input.fragments {
        let error = processor.prepare(&mut fragment).err().map(|e| e.to_string());
        let renames = fragment
            .methods
            .iter()
            .filter(|m| m.declared_name() != m.node.name)
            .map(|m| format!("{} -> {}", m.declared_name(), m.node.name))
            .collect();
        rows.push(CheckRow {
            fragment: fragment.name,
            error,
            renames,
        });
    }

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        output::print_check(writer, &rows)?;
    }
    Ok(i32::from(rows.iter().any(|r| r.error.is_some())))
}

/// Runs `weft init` in the current directory.
pub fn run_init<W: Write>(writer: &mut W) -> Result<()> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    run_init_in(&current_dir, writer)
}

/// Runs `weft init` in `root`.
///
/// This is primarily used for testing.
pub fn run_init_in<W: Write>(root: &Path, writer: &mut W) -> Result<()> {
    let path = root.join(CONFIG_FILENAME);
    if path.exists() {
        writeln!(
            writer,
            "{} {} already exists, leaving it untouched.",
            "[SKIP]".yellow(),
            CONFIG_FILENAME
        )?;
        return Ok(());
    }
    fs::write(&path, DEFAULT_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(writer, "{} Created {}", "[OK]".green(), CONFIG_FILENAME)?;
    Ok(())
}
