use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ReportStoreError {
    InvalidSymbol(String),
    InvalidFilename(String),
    NotFound {
        path: PathBuf,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ReportStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ReportStoreError::NotFound { path }
        } else {
            ReportStoreError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportStoreError::NotFound { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ReportStoreError::InvalidSymbol(_) | ReportStoreError::InvalidFilename(_)
        )
    }
}

impl fmt::Display for ReportStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStoreError::InvalidSymbol(s) => write!(f, "invalid stock symbol: {s:?}"),
            ReportStoreError::InvalidFilename(s) => write!(f, "invalid report filename: {s:?}"),
            ReportStoreError::NotFound { path } => {
                write!(f, "report not found: {}", path.display())
            }
            ReportStoreError::Parse { path, source } => {
                write!(f, "report is not valid JSON ({}): {source}", path.display())
            }
            ReportStoreError::Io { path, source } => {
                write!(f, "report I/O failed ({}): {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportStoreError::Parse { source, .. } => Some(source),
            ReportStoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
