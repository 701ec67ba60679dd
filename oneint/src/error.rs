use basis::BasisError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the integral engine. None of them is transient; each
/// points at configuration or input that the caller has to correct.
#[derive(Debug, Error)]
pub enum IntegralError {
    #[error("basis set '{name}' not found in {}", .search_dir.display())]
    BasisNotFound { name: String, search_dir: PathBuf },

    #[error("failed to parse basis file {}: {source}", .path.display())]
    BasisParse {
        path: PathBuf,
        #[source]
        source: BasisError,
    },

    #[error("atomic number {atomic_number} has no entry in basis set '{basis}'")]
    UnsupportedElement { atomic_number: u32, basis: String },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("numerical instability in shell pair ({shell_a}, {shell_b}): {reason}")]
    NumericalInstability {
        shell_a: usize,
        shell_b: usize,
        reason: String,
    },

    #[error("environment variable {0} is not set; point it at the basis data directory")]
    DataPathUnset(&'static str),

    #[error("basis data directory {} does not exist", .0.display())]
    DataPathNotFound(PathBuf),

    #[error("integral evaluation exceeded its deadline after {completed} of {total} shell pairs")]
    DeadlineExceeded { completed: usize, total: usize },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IntegralError>;
