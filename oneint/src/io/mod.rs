//! Input/Output operations
//!
//! Logging setup and matrix export.

mod output;

pub use output::{setup_output, write_matrices_json};
