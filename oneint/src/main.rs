//! One-electron integral command-line interface
//!
//! Reads a YAML geometry, evaluates S, T and V and reports them.

use color_eyre::eyre::Result;

mod app;
mod io;

use app::IntegralApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    IntegralApplication::from_cli()?.run()
}
