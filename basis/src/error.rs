use thiserror::Error;

/// Errors raised while building shells, parsing basis files or evaluating
/// the auxiliary functions of the recurrences.
#[derive(Debug, Error)]
pub enum BasisError {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid shell: {0}")]
    InvalidShell(String),

    #[error("numerical instability: {0}")]
    Numerical(String),
}

impl BasisError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        BasisError::Parse {
            line,
            reason: reason.into(),
        }
    }
}
