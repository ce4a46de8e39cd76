//! Concatenating folders into bundle files and the aggregate file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

use crate::domain::model::BundleFile;
use crate::infra::config::Bundles;
use crate::infra::fs::Staging;

/// Header written once at the top of the aggregate file.
pub const BANNER: &str = r#"
/**
  @file
  @brief Auto-generated file
  @details
    This file contains all the macros in a single file - which means it can be
    'included' in SAS with just 2 lines of code:

      filename mc url
        "https://raw.githubusercontent.com/macropeople/macrocore/master/compileall.sas";
      %inc mc;

    The `macropack` tool in the https://github.com/macropeople/macrocore repo
    is used to create this file.

  @author Allan Bowe
**/
"#;

/// Concatenate the matching files of `folder` in file name order, with nothing
/// inserted between them.
pub fn collect_bundle(
    staging: &Staging,
    folder: &str,
    matcher: &GlobMatcher,
) -> Result<BundleFile> {
    let dir = Path::new(folder);
    let members = staging.list(dir, matcher)?;

    let mut contents = String::new();
    for member in &members {
        contents.push_str(&staging.read(&dir.join(member))?);
    }

    Ok(BundleFile {
        folder: folder.to_owned(),
        members,
        contents,
    })
}

/// Stage one bundle per configured folder and the aggregate file, in folder order.
/// Returns the staged bundle paths followed by the aggregate path.
pub fn stage_all(staging: &mut Staging, settings: &Bundles) -> Result<Vec<PathBuf>> {
    let pattern = settings.member_glob();
    let matcher = Glob::new(&pattern)
        .with_context(|| format!("invalid bundle pattern '{pattern}'"))?
        .compile_matcher();

    let mut aggregate = String::from(BANNER);
    let mut staged = Vec::with_capacity(settings.folders.len() + 1);
    for folder in &settings.folders {
        let bundle = collect_bundle(staging, folder, &matcher)
            .with_context(|| format!("failed to bundle folder '{folder}'"))?;
        tracing::debug!(
            folder = %bundle.folder,
            files = bundle.members.len(),
            bytes = bundle.contents.len(),
            "bundled folder"
        );
        aggregate.push_str(&bundle.contents);

        let path = PathBuf::from(settings.bundle_file_name(folder));
        staging.stage(path.clone(), bundle.contents);
        staged.push(path);
    }

    let path = PathBuf::from(&settings.aggregate);
    staging.stage(path.clone(), aggregate);
    staged.push(path);
    Ok(staged)
}
