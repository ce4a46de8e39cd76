//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::Glob;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
pub const WORKSPACE_CONFIG_FILE: &str = "macropack.toml";
const FOLDERS_ENV: &str = "MACROPACK_FOLDERS";

/// Build layout: built-in defaults overlaid by an optional workspace file and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub wrappers: Wrappers,
    pub bundles: Bundles,
    pub markers: Markers,
    #[serde(default)]
    pub splice: Vec<SplicePair>,
}

/// Where scripts live and how their wrapper macros are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wrappers {
    pub source_dir: String,
    pub script_glob: String,
    pub prefix: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bundles {
    pub extension: String,
    pub file_prefix: String,
    pub aggregate: String,
    /// Concatenation order of the aggregate file.
    pub folders: Vec<String>,
}

impl Bundles {
    /// Pattern selecting the files of a folder that go into its bundle.
    pub fn member_glob(&self) -> String {
        format!("*.{}", self.extension)
    }

    /// Name of the per-folder bundle, written at the build root.
    pub fn bundle_file_name(&self, folder: &str) -> String {
        format!("{}{}.{}", self.file_prefix, folder, self.extension)
    }
}

/// Sentinel lines recognised by the splice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Markers {
    pub begin: String,
    pub end: String,
    /// Line closing the documentation header of a snippet.
    pub header_end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplicePair {
    pub target: PathBuf,
    pub snippet: PathBuf,
}

/// Environment overrides for the folder order.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    folders: Option<Vec<String>>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            folders: env::var(FOLDERS_ENV).ok().map(|raw| parse_folder_list(&raw)),
        }
    }

    #[cfg(test)]
    fn for_tests(folders: &str) -> Self {
        Self {
            folders: Some(parse_folder_list(folders)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_str(&DEFAULT_CONFIG).expect("built-in configuration is valid")
    }
}

impl Config {
    /// Load the defaults, then `explicit` (which must exist) or `<root>/macropack.toml`
    /// if present, then environment overrides.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let workspace = match explicit {
            Some(path) => {
                anyhow::ensure!(path.exists(), "config file {} does not exist", path.display());
                Some(path.to_path_buf())
            }
            None => Some(root.join(WORKSPACE_CONFIG_FILE)).filter(|path| path.exists()),
        };
        Self::load_with_layers(workspace, EnvOverrides::from_env())
    }

    fn load_with_layers(workspace: Option<PathBuf>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(&DEFAULT_CONFIG).context("failed to parse built-in config")?;

        if let Some(path) = workspace {
            tracing::debug!(path = %path.display(), "loading workspace config");
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let overlay: toml::Table = toml::from_str(&data)
                .with_context(|| format!("failed to parse TOML config {}", path.display()))?;
            merge_tables(&mut table, overlay);
        }

        let config =
            Config::deserialize(toml::Value::Table(table)).context("invalid configuration")?;
        Ok(apply_env_overrides(config, env_overrides))
    }

    fn from_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse TOML config")
    }

    /// Reject layouts that would produce ambiguous or duplicated output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("wrappers.source_dir", &self.wrappers.source_dir),
            ("wrappers.script_glob", &self.wrappers.script_glob),
            ("wrappers.prefix", &self.wrappers.prefix),
            ("wrappers.extension", &self.wrappers.extension),
            ("bundles.extension", &self.bundles.extension),
            ("bundles.aggregate", &self.bundles.aggregate),
            ("markers.begin", &self.markers.begin),
            ("markers.end", &self.markers.end),
            ("markers.header_end", &self.markers.header_end),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::EmptySetting(*name));
        }

        if self.markers.begin == self.markers.end {
            return Err(ConfigError::IdenticalMarkers(self.markers.begin.clone()));
        }

        let patterns = [
            ("wrappers.script_glob", self.wrappers.script_glob.clone()),
            ("bundles.extension", self.bundles.member_glob()),
        ];
        for (setting, pattern) in patterns {
            Glob::new(&pattern)
                .map_err(|source| ConfigError::InvalidPattern { setting, source })?;
        }

        if self.bundles.folders.is_empty() {
            return Err(ConfigError::NoFolders);
        }
        let mut seen = BTreeSet::new();
        for folder in &self.bundles.folders {
            if !is_single_dir_name(folder) {
                return Err(ConfigError::InvalidFolder(folder.clone()));
            }
            if !seen.insert(folder.as_str()) {
                return Err(ConfigError::DuplicateFolder(folder.clone()));
            }
        }
        Ok(())
    }
}

/// `lua` passes; `lua/`, `./lua`, `a/b`, and `..` do not, so every folder
/// has exactly one spelling.
fn is_single_dir_name(folder: &str) -> bool {
    let mut components = Path::new(folder).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == folder
    )
}

/// Overlay tables merge key by key; any other value, arrays included, replaces the base.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn parse_folder_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|folder| !folder.is_empty())
        .map(str::to_owned)
        .collect()
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(folders) = env.folders {
        config.bundles.folders = folders;
    }
    config
}
