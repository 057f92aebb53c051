//! Compression detection for dump files.

use crate::error::Result;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Magic bytes for bzip2 streams ("BZh")
const BZIP2_MAGIC: [u8; 3] = [0x42, 0x5A, 0x68];

/// Magic bytes for gzip streams
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Dump compression types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// `pages-articles.xml.bz2` as published
    Bzip2,
    /// Recompressed with gzip
    Gzip,
    /// Uncompressed XML
    Plain,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Plain => write!(f, "plain XML"),
        }
    }
}

/// Detect dump compression from a file path.
pub fn detect_compression_from_path(path: impl AsRef<Path>) -> Result<Compression> {
    let mut file = std::fs::File::open(path)?;
    detect_compression_from_reader(&mut file)
}

/// Detect dump compression from a reader, leaving it rewound.
pub fn detect_compression_from_reader<R: Read + Seek>(reader: &mut R) -> Result<Compression> {
    let mut buffer = [0u8; 4];

    reader.seek(SeekFrom::Start(0))?;
    let bytes_read = reader.read(&mut buffer)?;
    reader.seek(SeekFrom::Start(0))?;

    Ok(detect_compression(&buffer[..bytes_read]))
}

/// Detect dump compression from leading bytes.
///
/// Anything without a known magic number is treated as plain XML.
pub fn detect_compression(data: &[u8]) -> Compression {
    if data.starts_with(&BZIP2_MAGIC) {
        return Compression::Bzip2;
    }

    if data.starts_with(&GZIP_MAGIC) {
        return Compression::Gzip;
    }

    Compression::Plain
}
