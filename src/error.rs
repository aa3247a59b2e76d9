//! Structured error types for xlgrid.

use crate::commands::ErrorCode;

/// All errors that can occur while translating, parsing or writing workbooks.
#[derive(Debug, thiserror::Error)]
pub enum XlgridError {
    /// Address or range string that fails the letter+digit or index-pair grammar.
    #[error("Invalid cell reference: {0}")]
    InvalidAddress(String),

    /// A valid address or range that reaches past the engine's grid limits.
    #[error("Range exceeds grid limits: {0}")]
    GridLimit(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A sheet id or index that does not resolve.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// An operation was invoked before the engine surface exists.
    #[error("Spreadsheet editor not initialized")]
    EngineUnavailable,

    /// The operation is well-formed but not allowed in the current state.
    #[error("{0}")]
    InvalidOperation(String),

    /// A command payload that does not match its operation.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A command type with no operation behind it.
    #[error("Unknown command type: {0}")]
    UnknownCommand(String),

    /// Serializing a workbook for export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Recognized but unsupported format or feature.
    #[error("{0}")]
    Unsupported(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

impl XlgridError {
    /// The command-layer error code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidAddress(_) | Self::GridLimit(_) => ErrorCode::InvalidRange,
            Self::UnknownCommand(_) => ErrorCode::InvalidCommand,
            Self::SheetNotFound(_) => ErrorCode::SheetNotFound,
            Self::EngineUnavailable => ErrorCode::NotInitialized,
            Self::InvalidPayload(_) | Self::Json(_) => ErrorCode::InvalidPayload,
            Self::Unsupported(_) | Self::Export(_) => ErrorCode::ExportFailed,
            Self::Xml(_) | Self::Zip(_) | Self::Parse(_) => ErrorCode::ImportFailed,
            Self::InvalidOperation(_) | Self::Io(_) | Self::Other(_) => ErrorCode::InternalError,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlgridError>;

impl From<String> for XlgridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for XlgridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
