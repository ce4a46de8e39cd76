//! Domain models for sources, generated wrappers, and bundles.

use std::path::PathBuf;

/// A text file read from the build root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the build root.
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Final path component, e.g. `util.lua`.
    pub fn basename(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// Basename without its last extension, e.g. `util`.
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.contents.lines()
    }
}

/// A macro that writes a script file verbatim into the runtime work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperUnit {
    /// Generated macro name, `<prefix><stem>`.
    pub name: String,
    /// Basename of the wrapped script, used as the runtime file name.
    pub basename: String,
    /// One escaped `put` statement per script line.
    pub statements: Vec<String>,
}

/// Raw concatenation of the files of one folder, in file name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleFile {
    pub folder: String,
    pub members: Vec<String>,
    pub contents: String,
}

/// A generated file waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the build root.
    pub path: PathBuf,
    pub contents: String,
}
