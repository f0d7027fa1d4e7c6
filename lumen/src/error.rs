//! Error types for work result transport, configuration and export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration, moving work results
/// through a byte stream, or exporting diagnostic images.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {what} from stream: {source}")]
    StreamRead {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {what} to stream: {source}")]
    StreamWrite {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("Payload length mismatch: expected {expected} bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("Failed to read config file '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported config file: {0}")]
    ConfigFormat(#[from] common::FileExtensionError),

    #[error("Failed to parse config: {0}")]
    ParseConfig(#[from] common::SerdeFormatError),

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create export directory '{path}': {source}")]
    CreateExportDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write image '{path}': {source}")]
    ExportImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
