//! Error types for the notedeck application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while building, persisting and rendering records.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the notedeck application.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Errors related to storage I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field the selected record type requires was left empty.
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Submitted content was empty after trimming.
    #[error("Content must not be empty")]
    EmptyContent,

    /// Attachment exceeds the configured size ceiling.
    #[error("File {file_name} is too large ({size} bytes). Please select a file smaller than {limit} bytes")]
    FileTooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },

    /// The attachment could not be read.
    #[error("Could not read the selected file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No record matched the given id.
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// An id prefix matched more than one record.
    #[error("Id prefix {prefix} matches more than one record")]
    AmbiguousId { prefix: String },

    /// A date argument was not in YYYY-MM-DD form.
    #[error("Invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
