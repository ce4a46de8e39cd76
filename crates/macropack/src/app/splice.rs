//! Replacing a marked region of a macro with the escaped body of a snippet.
//!
//! The target is scanned line by line through [`RegionState`]. Lines before the
//! begin marker and after the end marker are copied (right-trimmed), both markers
//! are kept, and everything between them is replaced with one `put` statement per
//! line of the snippet body.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::errors::SpliceError;
use crate::domain::literal;
use crate::infra::config::{Markers, SplicePair};
use crate::infra::fs::Staging;

/// Position of the scan relative to the replaceable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    BeforeRegion,
    InRegion { begin_line: usize },
    AfterRegion,
}

/// Lines of `contents` after the first line equal to `terminator`.
pub fn snippet_body<'a>(
    path: &Path,
    contents: &'a str,
    terminator: &str,
) -> Result<Vec<&'a str>, SpliceError> {
    let mut lines = contents.lines();
    if !lines.by_ref().any(|line| line.trim_end() == terminator) {
        return Err(SpliceError::MissingHeaderTerminator {
            path: path.to_path_buf(),
            terminator: terminator.to_owned(),
        });
    }
    Ok(lines.collect())
}

/// Rewrite `target`, replacing the lines between the markers with `statements`.
pub fn splice_region(
    path: &Path,
    target: &str,
    statements: &[String],
    markers: &Markers,
) -> Result<String, SpliceError> {
    let mut out = String::with_capacity(target.len());
    let mut state = RegionState::BeforeRegion;

    for (index, raw) in target.lines().enumerate() {
        let line = raw.trim_end();
        let number = index + 1;
        let is_begin = line == markers.begin;
        let is_end = line == markers.end;

        state = match state {
            RegionState::BeforeRegion if is_begin => {
                push_line(&mut out, line);
                for statement in statements {
                    push_line(&mut out, statement);
                }
                RegionState::InRegion { begin_line: number }
            }
            RegionState::InRegion { .. } if is_end => {
                push_line(&mut out, line);
                RegionState::AfterRegion
            }
            RegionState::InRegion { .. } | RegionState::AfterRegion if is_begin => {
                return Err(SpliceError::RepeatedBegin {
                    path: path.to_path_buf(),
                    line: number,
                });
            }
            RegionState::BeforeRegion | RegionState::AfterRegion if is_end => {
                return Err(SpliceError::UnmatchedEnd {
                    path: path.to_path_buf(),
                    line: number,
                });
            }
            RegionState::InRegion { .. } => state,
            RegionState::BeforeRegion | RegionState::AfterRegion => {
                push_line(&mut out, line);
                state
            }
        };
    }

    match state {
        RegionState::AfterRegion => Ok(out),
        RegionState::BeforeRegion => Err(SpliceError::MissingBegin {
            path: path.to_path_buf(),
            marker: markers.begin.clone(),
        }),
        RegionState::InRegion { begin_line } => Err(SpliceError::MissingEnd {
            path: path.to_path_buf(),
            marker: markers.end.clone(),
            begin_line,
        }),
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Splice every configured pair into the staging area. Returns the patched targets.
pub fn stage_all(
    staging: &mut Staging,
    pairs: &[SplicePair],
    markers: &Markers,
) -> Result<Vec<PathBuf>> {
    let mut patched = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let snippet = staging.read(&pair.snippet)?;
        let body = snippet_body(&pair.snippet, &snippet, &markers.header_end)?;
        let statements = literal::put_statements(body);

        let target = staging.read(&pair.target)?;
        let rewritten = splice_region(&pair.target, &target, &statements, markers)?;
        tracing::debug!(
            target = %pair.target.display(),
            snippet = %pair.snippet.display(),
            lines = statements.len(),
            "spliced region"
        );
        staging.stage(pair.target.clone(), rewritten);
        patched.push(pair.target.clone());
    }
    Ok(patched)
}
