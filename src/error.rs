//! Error taxonomy for the analysis pipeline.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while loading or aggregating load profiles.
///
/// Missing and malformed inputs are fatal for the whole run: an incomplete
/// roster would silently skew diversity statistics, so nothing is skipped.
#[derive(Debug)]
pub enum AnalysisError {
    /// An expected per-building output file does not exist.
    MissingInput {
        /// Path of the file that was expected.
        path: PathBuf,
    },
    /// A row in an otherwise readable file could not be parsed.
    MalformedInput {
        /// Path of the offending file.
        path: PathBuf,
        /// 1-based data row number (header excluded).
        row: usize,
        /// What failed to parse.
        message: String,
    },
    /// An I/O failure while reading or writing a file.
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Aggregation was requested over zero customers.
    EmptySelection,
    /// Aggregation named a customer id that was never loaded.
    UnknownCustomer {
        /// Display form of the unknown id.
        id: String,
    },
    /// No diversified-demand interval is positive (all zero, or net export
    /// throughout), so the diversity factor is undefined.
    ZeroDiversifiedDemand,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { path } => {
                write!(f, "missing input file \"{}\"", path.display())
            }
            Self::MalformedInput { path, row, message } => {
                write!(
                    f,
                    "malformed input in \"{}\" at data row {row}: {message}",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "I/O error on \"{}\": {source}", path.display())
            }
            Self::EmptySelection => {
                write!(f, "empty selection: at least one customer is required")
            }
            Self::UnknownCustomer { id } => {
                write!(f, "unknown customer \"{id}\": not part of this run")
            }
            Self::ZeroDiversifiedDemand => {
                write!(
                    f,
                    "diversified demand is nowhere positive; diversity factor is undefined"
                )
            }
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl AnalysisError {
    /// Wraps an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
