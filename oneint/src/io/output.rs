//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use nalgebra::DMatrix;
use oneint::OneBodyIntegrals;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Wall-clock timer printing HH:MM:SS
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;
        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Route log output to `output_path`, or stdout when none is given.
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create output file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
        }
    }
}

#[derive(Serialize)]
struct MatrixDump<'a> {
    basis: &'a str,
    nbf: usize,
    overlap: Vec<Vec<f64>>,
    kinetic: Vec<Vec<f64>>,
    nuclear: Vec<Vec<f64>>,
}

/// Rows of a dense matrix as nested vectors.
pub fn matrix_to_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Write S, T and V as a JSON document of row-major nested arrays.
pub fn write_matrices_json(path: &str, basis: &str, ints: &OneBodyIntegrals) -> Result<()> {
    let dump = MatrixDump {
        basis,
        nbf: ints.overlap.nrows(),
        overlap: matrix_to_rows(&ints.overlap),
        kinetic: matrix_to_rows(&ints.kinetic),
        nuclear: matrix_to_rows(&ints.nuclear),
    };
    let file = File::create(path).wrap_err_with(|| format!("Unable to create {}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &dump)
        .wrap_err_with(|| format!("Failed to write matrices to {}", path))?;
    info!("Matrices written to: {}", path);
    Ok(())
}
