use std::path::PathBuf;

/// Failures that abort a report build. Recoverable conditions (missing
/// template, unknown header, empty input, chart problems) never reach this
/// type; they are reported as [`crate::ReportNotice`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot write to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Excel writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Invalid xlsx package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Malformed package part: {0}")]
    Xml(String),

    #[error("Chart error: {0}")]
    Chart(String),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
