//! CLI-level errors (wraps tree and load errors)

use thiserror::Error;

use crate::errors::{LoadError, TreeError};

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Tree(e) => match e {
                TreeError::MissingId { .. }
                | TreeError::CycleDetected { .. }
                | TreeError::Orphan { .. } => crate::exitcode::DATAERR,
                TreeError::UnknownNode(_) | TreeError::Json(_) => crate::exitcode::SOFTWARE,
            },
            CliError::Load(e) => match e {
                LoadError::Io { .. } => crate::exitcode::NOINPUT,
                LoadError::Parse { .. } | LoadError::RootNotFound(_) => crate::exitcode::DATAERR,
                LoadError::Config { .. } => crate::exitcode::CONFIG,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::from(TreeError::MissingId { path: None });
        assert_eq!(missing.exit_code(), crate::exitcode::DATAERR);

        let config = CliError::from(LoadError::Config {
            message: "bad".into(),
        });
        assert_eq!(config.exit_code(), crate::exitcode::CONFIG);

        let args = CliError::InvalidArgs("x".into());
        assert_eq!(args.exit_code(), crate::exitcode::USAGE);
    }
}
