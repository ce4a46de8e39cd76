//! Staged filesystem access and atomic writes.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobMatcher;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::domain::model::Artifact;

/// In-memory overlay over the build root.
///
/// Generated files are staged here instead of being written straight away. Reads
/// and directory listings see staged content first, so later stages consume the
/// output of earlier ones while nothing on disk changes until the plan is published.
#[derive(Debug, Clone)]
pub struct Staging {
    root: PathBuf,
    staged: Vec<Artifact>,
}

impl Staging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file relative to the root, preferring staged content.
    pub fn read(&self, rel: &Path) -> Result<String> {
        let rel = normalize(rel);
        if let Some(artifact) = self.staged.iter().find(|artifact| artifact.path == rel) {
            return Ok(artifact.contents.clone());
        }

        let path = self.root.join(rel);
        tracing::debug!(path = %path.display(), "reading");
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    /// Stage `contents` for `rel`, replacing anything staged earlier for the same path.
    pub fn stage(&mut self, rel: impl Into<PathBuf>, contents: String) {
        let path: PathBuf = rel.into();
        let path = normalize(&path);
        match self.staged.iter_mut().find(|artifact| artifact.path == path) {
            Some(existing) => existing.contents = contents,
            None => self.staged.push(Artifact { path, contents }),
        }
    }

    /// File names directly inside `dir` that match `matcher`, on disk or staged,
    /// sorted by plain string comparison.
    pub fn list(&self, dir: &Path, matcher: &GlobMatcher) -> Result<Vec<String>> {
        let dir = normalize(dir);
        let abs = self.root.join(&dir);
        let mut names = BTreeSet::new();

        for entry in WalkDir::new(&abs)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry.with_context(|| format!("failed to list {}", abs.display()))?;
            if !entry.file_type().is_file() {
                tracing::warn!(path = %entry.path().display(), "skipping non-file entry");
                continue;
            }
            if !matcher.is_match(entry.file_name()) {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => {
                    names.insert(name.to_owned());
                }
                None => {
                    tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name")
                }
            }
        }

        for artifact in &self.staged {
            if artifact.path.parent() != Some(dir.as_path()) {
                continue;
            }
            if let Some(name) = artifact.path.file_name().and_then(|name| name.to_str())
                && matcher.is_match(name)
            {
                names.insert(name.to_owned());
            }
        }

        Ok(names.into_iter().collect())
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.staged
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.staged
    }
}

/// Relative path with `.` components and trailing separators dropped, so
/// `./lua/` and `lua` name the same staged directory.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Replace `path` with `contents` via a temporary file in the same directory.
///
/// Readers observe either the previous file or the complete new one. Existing
/// permissions are carried over to the replacement.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {}", path.display()))?;

    match fs::metadata(path) {
        Ok(meta) => temp
            .as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("failed to copy permissions of {}", path.display()))?,
        Err(_) => set_default_permissions(temp.as_file())
            .with_context(|| format!("failed to set permissions for {}", path.display()))?,
    }
    temp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    temp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}
