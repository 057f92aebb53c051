//! Error types for unwiki library.

use std::io;
use thiserror::Error;

/// Result type alias for unwiki operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for unwiki library.
///
/// The cleaning passes themselves never fail; errors come from I/O, the dump
/// stream, configuration, or pattern compilation at startup.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a dump or writing records.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error in the dump stream.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// A configurable pattern failed to compile.
    #[error("Invalid pattern for {name}: {message}")]
    Pattern { name: &'static str, message: String },

    /// Configuration file could not be read or decoded.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Parquet output could not be encoded or written.
    #[error("Parquet error: {0}")]
    Parquet(String),

    /// Worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Text encoding error.
    #[error("Text encoding error: {0}")]
    Encoding(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Error::Parquet(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(err: arrow::error::ArrowError) -> Self {
        Error::Parquet(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Encoding(err.to_string())
    }
}
