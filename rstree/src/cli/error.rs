//! CLI-level errors (wraps infrastructure errors)

use std::io;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),

    #[error("no node with {0}")]
    NotFound(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Failed reads map to `NOINPUT` only when the file is missing.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::NotFound(_) => crate::exitcode::NOTFOUND,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::MissingRoot => crate::exitcode::USAGE,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Json { .. } => crate::exitcode::DATAERR,
                    ApplicationError::Domain(DomainError::DepthExceeded { .. }) => {
                        crate::exitcode::SOFTWARE
                    }
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::OperationFailed { source, .. } => {
                        match source.downcast_ref::<io::Error>().map(io::Error::kind) {
                            Some(io::ErrorKind::NotFound) => crate::exitcode::NOINPUT,
                            _ => crate::exitcode::IOERR,
                        }
                    }
                },
            },
        }
    }
}
