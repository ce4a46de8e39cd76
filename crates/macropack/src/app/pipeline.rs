//! End-to-end build: wrap, splice, bundle, then publish.
//!
//! Every stage works against a [`Staging`] overlay, so a failure anywhere leaves
//! the build root untouched. Publishing writes each artifact atomically and the
//! aggregate file last. Concurrent runs against the same root are unsupported.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::{bundle, splice, wrap::WrapperGenerator};
use crate::domain::model::Artifact;
use crate::infra::config::Config;
use crate::infra::fs::{Staging, write_atomic};

/// Runtime options for a build invocation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    /// Compare with disk instead of writing.
    pub check: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config_path: None,
            check: false,
        }
    }
}

/// Artifacts computed by a build, in publish order.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    root: PathBuf,
    artifacts: Vec<Artifact>,
}

/// Outcome of [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Published { written: usize },
    UpToDate { checked: usize },
}

impl BuildPlan {
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Write every artifact, replacing existing files. Returns the number written.
    pub fn publish(&self) -> Result<usize> {
        for artifact in &self.artifacts {
            let path = self.root.join(&artifact.path);
            write_atomic(&path, &artifact.contents)?;
            tracing::info!(
                path = %artifact.path.display(),
                bytes = artifact.contents.len(),
                "wrote"
            );
        }
        Ok(self.artifacts.len())
    }

    /// Artifacts whose file is missing or differs from the computed contents.
    pub fn stale(&self) -> Result<Vec<PathBuf>> {
        let mut stale = Vec::new();
        for artifact in &self.artifacts {
            let path = self.root.join(&artifact.path);
            match fs::read_to_string(&path) {
                Ok(current) if current == artifact.contents => {}
                Ok(_) => stale.push(artifact.path.clone()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    stale.push(artifact.path.clone())
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to read {}", path.display()));
                }
            }
        }
        Ok(stale)
    }
}

/// Compute every artifact of a build without touching the filesystem.
pub fn plan(root: &Path, config: &Config) -> Result<BuildPlan> {
    config.validate().context("invalid build configuration")?;
    let mut staging = Staging::new(root);

    let generator = WrapperGenerator::new(config.wrappers.clone())?;
    let wrappers = generator
        .stage_all(&mut staging)
        .context("failed to generate wrapper macros")?;
    tracing::info!(count = wrappers.len(), dir = %config.wrappers.source_dir, "generated wrappers");

    let patched = splice::stage_all(&mut staging, &config.splice, &config.markers)
        .context("failed to splice snippets")?;
    tracing::info!(count = patched.len(), "spliced templates");

    let bundles = bundle::stage_all(&mut staging, &config.bundles)
        .context("failed to concatenate bundles")?;
    tracing::info!(
        count = bundles.len().saturating_sub(1),
        aggregate = %config.bundles.aggregate,
        "bundled folders"
    );

    Ok(BuildPlan {
        root: staging.root().to_path_buf(),
        artifacts: staging.into_artifacts(),
    })
}

/// Load configuration, plan the build, then publish it or check it against disk.
pub fn run(options: &BuildOptions) -> Result<BuildOutcome> {
    let config = Config::load(&options.root, options.config_path.as_deref())?;
    let plan = plan(&options.root, &config)?;

    if options.check {
        let stale = plan.stale()?;
        if !stale.is_empty() {
            let listing: Vec<String> = stale
                .iter()
                .map(|path| path.display().to_string())
                .collect();
            anyhow::bail!(
                "{} generated file(s) out of date: {}",
                stale.len(),
                listing.join(", ")
            );
        }
        tracing::info!(count = plan.artifacts().len(), "all generated files up to date");
        return Ok(BuildOutcome::UpToDate {
            checked: plan.artifacts().len(),
        });
    }

    let written = plan.publish()?;
    Ok(BuildOutcome::Published { written })
}
