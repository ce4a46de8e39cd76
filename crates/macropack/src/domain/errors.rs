//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid build configuration, detected before any file is read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("folder '{0}' is listed more than once in the bundle folder order")]
    DuplicateFolder(String),
    #[error("bundle folder '{0}' must be a single directory name")]
    InvalidFolder(String),
    #[error("bundle folder list is empty")]
    NoFolders,
    #[error("setting '{0}' must not be empty")]
    EmptySetting(&'static str),
    #[error("begin and end markers must differ (both are '{0}')")]
    IdenticalMarkers(String),
    #[error("setting '{setting}' is not a valid glob pattern: {source}")]
    InvalidPattern {
        setting: &'static str,
        source: globset::Error,
    },
}

/// Failure to locate the replaceable region of a splice target or the body of a snippet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpliceError {
    #[error("{}: begin marker '{marker}' not found", path.display())]
    MissingBegin { path: PathBuf, marker: String },
    #[error("{}: region opened at line {begin_line} is never closed by '{marker}'", path.display())]
    MissingEnd {
        path: PathBuf,
        marker: String,
        begin_line: usize,
    },
    #[error("{}: end marker at line {line} does not close an open region", path.display())]
    UnmatchedEnd { path: PathBuf, line: usize },
    #[error("{}: extra begin marker at line {line}; only one region is supported", path.display())]
    RepeatedBegin { path: PathBuf, line: usize },
    #[error("{}: header terminator '{terminator}' not found", path.display())]
    MissingHeaderTerminator { path: PathBuf, terminator: String },
}
