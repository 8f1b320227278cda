//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Roster Errors ===
    /// A student with this ID is already on the roster.
    #[error("student ID already exists: {id}")]
    DuplicateId {
        /// The conflicting student ID.
        id: String,
    },

    /// A required student field was empty after trimming.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// No student with this ID is on the roster.
    #[error("student not found: {id}")]
    StudentNotFound {
        /// The requested student ID.
        id: String,
    },

    // === Scan Errors ===
    /// A scanned payload was not well-formed or lacked a student ID.
    #[error("invalid QR code format: {message}")]
    DecodeFormat {
        /// Description of what was wrong with the payload.
        message: String,
    },

    /// The frame source (camera) could not be acquired.
    #[error("error accessing camera: {message}")]
    DeviceAccess {
        /// Description of what went wrong.
        message: String,
    },

    // === Export Errors ===
    /// A daily export was requested for a date without records.
    #[error("no attendance records for {date}")]
    NothingToExport {
        /// The requested date.
        date: NaiveDate,
    },

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new duplicate ID error.
    #[must_use]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create a new student-not-found error.
    #[must_use]
    pub fn student_not_found(id: impl Into<String>) -> Self {
        Self::StudentNotFound { id: id.into() }
    }

    /// Create a new decode format error.
    #[must_use]
    pub fn decode_format(message: impl Into<String>) -> Self {
        Self::DecodeFormat {
            message: message.into(),
        }
    }

    /// Create a new device access error.
    #[must_use]
    pub fn device_access(message: impl Into<String>) -> Self {
        Self::DeviceAccess {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a duplicate student ID.
    #[must_use]
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }

    /// Check if this error is a malformed scan payload.
    #[must_use]
    pub fn is_decode_format(&self) -> bool {
        matches!(self, Self::DecodeFormat { .. })
    }

    /// Check if this error is a camera/device access failure.
    #[must_use]
    pub fn is_device_access(&self) -> bool {
        matches!(self, Self::DeviceAccess { .. })
    }
}
