//! Error types for KazeDB.
//!
//! One error enum covers the whole engine. Every variant maps to a
//! [`StatusCode`] whose numeric value sits in a contiguous per-category
//! range, so category membership is a range check.

use thiserror::Error;

/// Status codes for database operations, grouped in contiguous ranges:
/// general 1-99, I/O 100-199, storage 200-299, record 300-399, index
/// 400-499, transaction 500-599, query 600-699, network 700-799.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StatusCode {
    Ok = 0,

    // General errors (1-99)
    UnknownError = 1,
    InvalidArgument = 2,
    NotImplemented = 4,
    InternalError = 5,

    // I/O errors (100-199)
    IoError = 100,
    FileNotFound = 101,
    FileAlreadyExists = 102,
    ReadError = 105,
    WriteError = 106,
    SeekError = 107,

    // Storage errors (200-299)
    PageNotFound = 200,
    PageCorrupted = 201,
    PageFull = 202,
    InvalidPageType = 203,
    CacheFull = 204,
    PageLocked = 207,

    // Record errors (300-399)
    RecordNotFound = 300,
    RecordTooLarge = 301,
    InvalidRecordFormat = 302,
    SchemaMismatch = 305,

    // Index errors (400-499)
    IndexNotFound = 400,

    // Transaction errors (500-599)
    TransactionAborted = 500,

    // Query errors (600-699)
    SyntaxError = 600,
    TypeError = 602,
    TableNotFound = 603,
    ColumnNotFound = 604,
    ConstraintViolation = 605,
    TableExists = 607,

    // Network errors (700-799)
    Timeout = 702,
}

impl StatusCode {
    /// Numeric value of the code.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_io(self) -> bool {
        (100..200).contains(&self.as_u32())
    }

    pub fn is_storage(self) -> bool {
        (200..300).contains(&self.as_u32())
    }

    pub fn is_record(self) -> bool {
        (300..400).contains(&self.as_u32())
    }

    pub fn is_query(self) -> bool {
        (600..700).contains(&self.as_u32())
    }

    /// Recoverable errors may succeed on retry with different input;
    /// everything else is fatal for the current statement.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            StatusCode::PageFull
                | StatusCode::CacheFull
                | StatusCode::FileAlreadyExists
                | StatusCode::Timeout
        )
    }
}

/// The main error type for KazeDB.
#[derive(Error, Debug)]
pub enum Error {
    // ========== Parser Errors ==========
    #[error("Syntax error at position {position}: expected {expected}")]
    SyntaxError { position: usize, expected: String },

    // ========== Query Errors ==========
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Column '{column}' not found in '{table}'")]
    ColumnNotFound { column: String, table: String },

    #[error("Type error in {operation}: expected {expected}, got {actual}")]
    TypeError {
        operation: String,
        expected: String,
        actual: String,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // ========== Storage Errors ==========
    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Page {page_id} corrupted: {details}")]
    PageCorrupted { page_id: u32, details: String },

    #[error("Page full ({0})")]
    PageFull(String),

    #[error("Invalid page type on page {page_id}: {found}")]
    InvalidPageType { page_id: u32, found: u8 },

    #[error("Buffer pool full: no unpinned page to evict")]
    CacheFull,

    #[error("Page {0} is not pinned")]
    PageLocked(u32),

    // ========== Record Errors ==========
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record too large: {0} bytes")]
    RecordTooLarge(usize),

    #[error("Invalid record format: {0}")]
    InvalidRecordFormat(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    // ========== I/O Errors ==========
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Seek error: {0}")]
    SeekError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ========== General Errors ==========
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Status code of this error.
    pub fn code(&self) -> StatusCode {
        match self {
            Error::SyntaxError { .. } => StatusCode::SyntaxError,
            Error::TableNotFound(_) => StatusCode::TableNotFound,
            Error::TableExists(_) => StatusCode::TableExists,
            Error::ColumnNotFound { .. } => StatusCode::ColumnNotFound,
            Error::TypeError { .. } => StatusCode::TypeError,
            Error::ConstraintViolation(_) => StatusCode::ConstraintViolation,
            Error::PageNotFound(_) => StatusCode::PageNotFound,
            Error::PageCorrupted { .. } => StatusCode::PageCorrupted,
            Error::PageFull(_) => StatusCode::PageFull,
            Error::InvalidPageType { .. } => StatusCode::InvalidPageType,
            Error::CacheFull => StatusCode::CacheFull,
            Error::PageLocked(_) => StatusCode::PageLocked,
            Error::RecordNotFound(_) => StatusCode::RecordNotFound,
            Error::RecordTooLarge(_) => StatusCode::RecordTooLarge,
            Error::InvalidRecordFormat(_) => StatusCode::InvalidRecordFormat,
            Error::SchemaMismatch(_) => StatusCode::SchemaMismatch,
            Error::FileNotFound(_) => StatusCode::FileNotFound,
            Error::ReadError(_) => StatusCode::ReadError,
            Error::WriteError(_) => StatusCode::WriteError,
            Error::SeekError(_) => StatusCode::SeekError,
            Error::Io(_) => StatusCode::IoError,
            Error::InvalidArgument(_) => StatusCode::InvalidArgument,
            Error::Internal(_) => StatusCode::InternalError,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }
}

/// Result type alias for KazeDB operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Table 'users' not found");

        let err = Error::SyntaxError {
            position: 7,
            expected: "FROM".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error at position 7: expected FROM");
    }

    #[test]
    fn test_status_code_categories() {
        assert!(StatusCode::PageFull.is_storage());
        assert!(StatusCode::ReadError.is_io());
        assert!(StatusCode::TypeError.is_query());
        assert!(StatusCode::RecordTooLarge.is_record());
        assert!(!StatusCode::TypeError.is_storage());
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::PageFull("catalog".into()).is_recoverable());
        assert!(Error::CacheFull.is_recoverable());
        assert!(!Error::TableNotFound("t".into()).is_recoverable());
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(Error::CacheFull.code().as_u32(), 204);
        assert_eq!(Error::ConstraintViolation("x".into()).code().as_u32(), 605);
    }
}
