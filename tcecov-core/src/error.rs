//! Error types for coverage operations

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CovError {
    /// Malformed record, counter header or summary table.
    #[error("Format error at {location}: {message}")]
    Format { location: String, message: String },

    /// Recorded checksum no longer matches the file on disk.
    #[error("Checksum mismatch for {}: expected {expected}, found {found}", .path.display())]
    Checksum {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Cannot resolve {}: {message}", .path.display())]
    Resolution { path: PathBuf, message: String },

    #[error("Merge failed for {source_path}: {message}")]
    Merge {
        source_path: String,
        message: String,
    },

    #[error("Merge command '{command}' did not finish within {timeout:?}")]
    MergeTimeout { command: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CovError {
    pub fn format(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn merge(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Merge {
            source_path: source_path.into(),
            message: message.into(),
        }
    }

    /// Prefix the location of a format error, e.g. with the file and line it came from.
    pub fn at(self, location: impl std::fmt::Display) -> Self {
        match self {
            Self::Format {
                location: inner,
                message,
            } => Self::Format {
                location: format!("{}: {}", location, inner),
                message,
            },
            other => other,
        }
    }

    /// Short machine-readable code, used for `--json` error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Format { .. } => "format_error",
            Self::Checksum { .. } => "checksum_error",
            Self::Resolution { .. } => "resolution_error",
            Self::Merge { .. } | Self::MergeTimeout { .. } => "merge_error",
            Self::Io(_) | Self::FileNotFound(_) => "io_error",
            Self::ConfigExists(_) | Self::ConfigParse(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}
