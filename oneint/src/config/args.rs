//! Command-line argument parsing

use clap::Parser;

/// One-electron integrals (S, T, V) with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Override the basis set name
    #[arg(short, long)]
    pub basis: Option<String>,

    /// Basis data directory (default: config file, then $ONEINT_DATA_PATH)
    #[arg(long)]
    pub data_path: Option<String>,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write S, T and V as JSON to this file
    #[arg(long)]
    pub matrices: Option<String>,

    /// Evaluate shell pairs on the calling thread only
    #[arg(long)]
    pub serial: bool,

    /// Abort the integral build after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}
