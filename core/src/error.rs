//! Error kinds the caller needs to tell apart.
//!
//! Format and integrity failures in a catalog file are [`CodecError`]s; they
//! are recovered by quarantining the file and never abort a load. Failing to
//! read or write a file for any other reason is a [`StoreError`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A catalog file could not be decoded. Line numbers are 1-based and count
/// the header line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("line {line}: continuation line outside of any record")]
    OrphanContinuation { line: u64 },

    #[error("record starting at line {line} has no trailer line")]
    UnterminatedRecord { line: u64 },

    #[error("line {line}: ingredient references unknown food '{name}'")]
    UnknownFood { line: u64, name: String },

    #[error("line {line}: meal references unknown menu item '{name}'")]
    UnknownMenuItem { line: u64, name: String },

    #[error("line {line}: '{value}' is not a valid meal type")]
    InvalidMealType { line: u64, value: String },

    #[error("line {line}: meal record is missing its meal type")]
    MissingMealType { line: u64 },

    #[error("line {line}: '{value}' is not a MM/DD/YYYY date")]
    InvalidDate { line: u64, value: String },

    #[error("line {line}: menu item '{name}' has no ingredients")]
    EmptyMenuItem { line: u64, name: String },

    #[error("line {line}: duplicate entry '{name}'")]
    DuplicateName { line: u64, name: String },
}

impl CodecError {
    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
        CodecError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
