//! Error types for SSH host synchronization.
//!
//! Validation errors carry their message verbatim so the CLI can print them
//! as-is. Every error aborts the sync before the target file is replaced.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, merging, or writing SSH hosts.
#[derive(Debug, Error)]
pub enum Error {
    /// A host definition failed validation
    #[error("{0}")]
    Validation(String),

    /// Two desired hosts share a name
    #[error("duplicate host name '{name}' found in {first} and {second}")]
    DuplicateHost {
        /// The repeated host name
        name: String,
        /// Source of the first occurrence
        first: String,
        /// Source of the second occurrence
        second: String,
    },

    /// Two entries in the merged config share a name
    #[error("host '{name}' would be written twice ({first} and {second})")]
    DuplicateEntry {
        /// The repeated host name
        name: String,
        /// Tag of the first entry
        first: String,
        /// Tag of the second entry
        second: String,
    },

    /// A host source is misconfigured
    #[error("source {name}: {message}")]
    InvalidSource {
        /// Name of the host source
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// Reading a file failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The SSH config is not valid UTF-8
    #[error("{} is not valid UTF-8 (line {line})", path.display())]
    Encoding {
        /// File that could not be decoded
        path: PathBuf,
        /// First line containing invalid bytes
        line: usize,
    },

    /// Writing the SSH config or a backup failed
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that could not be written
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The encryption backend rejected an operation
    #[error("{operation} failed for {}: {message}", path.display())]
    Crypto {
        /// "encryption" or "decryption"
        operation: &'static str,
        /// File being processed
        path: PathBuf,
        /// Output of the backend
        message: String,
    },

    /// A source could not be decrypted
    #[error("failed to decrypt hosts for source {source_name}: {message}")]
    Decrypt {
        /// Name of the host source
        source_name: String,
        /// Decryption failure details
        message: String,
    },

    /// A hosts file is not valid TOML
    #[error("failed to parse hosts file for source {source_name}: {message}")]
    HostsFileParse {
        /// Name of the host source
        source_name: String,
        /// Parser error message
        message: String,
    },

    /// The `age` binary is not installed
    #[error("age not found. Install it from https://age-encryption.org")]
    AgeNotFound,
}

impl Error {
    /// Whether this error comes from host or config validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateHost { .. }
                | Self::DuplicateEntry { .. }
                | Self::InvalidSource { .. }
        )
    }
}

/// Result type for SSH host operations.
pub type Result<T> = std::result::Result<T, Error>;
