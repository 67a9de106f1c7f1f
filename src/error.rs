//! Error types for both pipelines

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or unreadable map archive
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Archive is missing {0}")]
    MissingEntry(&'static str),

    #[error("Invalid SMF file: {0}")]
    Smf(String),

    #[error("Invalid SMD file at line {line}: {message}")]
    Smd { line: usize, message: String },

    #[error("Invalid mapinfo.lua at line {line}: {message}")]
    MapInfo { line: usize, message: String },
}

/// Image encode or write failure
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Persistence failure on lookup, insert or update
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt JSON in column {column}: {source}")]
    Json {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Spreadsheet unreachable or credentials rejected
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Spreadsheet credentials rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("Spreadsheet request failed with HTTP {status}")]
    Status { status: u16 },

    #[error("Spreadsheet request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected spreadsheet response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Spreadsheet has no sheets")]
    NoSheets,
}

/// Required spreadsheet headers that were not found
#[derive(Debug, Error)]
#[error("Spreadsheet header row is missing required columns: {}", missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// A map name that would corrupt the generated config
#[derive(Debug, Error)]
#[error("Map name {name:?} in pool [{pool}] contains a reserved character")]
pub struct SerializeError {
    pub pool: String,
    pub name: String,
}

/// Any failure while ingesting a single archive
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Any failure while generating map pools
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}
