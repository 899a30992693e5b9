use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a failure, used for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Data,
    Io,
}

#[derive(Error, Debug)]
pub enum BadgeError {
    /// Bad or missing configuration, including missing CSV columns.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A roster row that cannot become a badge. `row` is 1-based and
    /// excludes the header line.
    #[error("Row {row}: {message} ({raw})")]
    Data {
        row: usize,
        message: String,
        raw: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BadgeError {
    pub fn config(message: impl Into<String>) -> Self {
        BadgeError::Config(message.into())
    }

    pub fn data(row: usize, message: impl Into<String>, raw: impl Into<String>) -> Self {
        BadgeError::Data {
            row,
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BadgeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BadgeError::Config(_) => ErrorKind::Config,
            BadgeError::Data { .. } => ErrorKind::Data,
            BadgeError::Io { .. } => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, BadgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_reports_row_and_raw_fields() {
        let err = BadgeError::data(3, "empty `Code` field", "Jane,Doe,");
        assert_eq!(err.to_string(), "Row 3: empty `Code` field (Jane,Doe,)");
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn io_error_names_the_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = BadgeError::io("/tmp/missing.csv", source);
        assert!(err.to_string().starts_with("/tmp/missing.csv: "));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
