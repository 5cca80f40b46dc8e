//! Diagnostics output for the command line.
//!
//! The library only emits `tracing` events; the binary installs a
//! subscriber writing to stderr so stdout stays clean for reports.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for a run.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "weft=info"
    } else {
        "weft=warn"
    }
}

/// Installs the global subscriber. Later calls are ignored.
///
/// `RUST_LOG` overrides the default directive.
pub fn init(verbose: bool) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .compact()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
