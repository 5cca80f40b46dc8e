//! Command-line interface entry point for `weft`.

use anyhow::Result;
use weft::entry_point;

fn main() -> Result<()> {
    let code = entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
