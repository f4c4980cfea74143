//! Error conversion helpers for I/O and JSON results
//!
//! Extension traits that attach the offending path or input name to errors.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read records", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait naming the JSON input that failed to parse or render.
pub trait JsonResultExt<T> {
    fn with_json_context(self, origin: &str) -> ApplicationResult<T>;
}

impl<T> JsonResultExt<T> for serde_json::Result<T> {
    fn with_json_context(self, origin: &str) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Json {
            context: origin.to_string(),
            source,
        })
    }
}
