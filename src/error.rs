//! Error types for the public interface of the library.
//!
//! Internally the crate works with `anyhow` (see `Res`). Anything that crosses the public API is
//! converted into an `Error` that also carries an `ErrorType`, which lets callers tell a missing
//! transaction apart from a broken config file without string matching.

use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The result type returned by public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The fuel home directory or its `config.json` is missing or invalid.
    Config,
    /// The key-value store could not be read or written.
    Store,
    /// A transaction id was not found.
    NotFound,
    /// User input was rejected, e.g. a non-positive amount.
    Validation,
    /// A spreadsheet file could not be imported.
    Import,
    /// The remote metadata API or another external service failed.
    Remote,
    /// A local file operation failed.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// An error returned from the public interface of this library.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Creates an error from a plain message.
    pub(crate) fn msg<M>(error_type: ErrorType, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(error_type, anyhow::Error::msg(message))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
