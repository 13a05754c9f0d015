//! Importer configuration.
//!
//! Values are merged from three layers, highest precedence first: command line
//! (or its environment fallbacks), the optional `.tfstate-import.yaml` file in
//! the working directory, and built-in defaults.

use crate::error::{ImportError, ImportResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = ".tfstate-import.yaml";
pub const DEFAULT_PROFILE: &str = "mfa";
pub const DEFAULT_BINARY: &str = "terraform";
pub const DEFAULT_PROJECT_NAME: &str = "terraform-core";
pub const DEFAULT_PROJECT_VARIABLE: &str = "project_name";
pub const DEFAULT_IMPORT_FLAG_VARIABLE: &str = "import_existing_resources";

/// Contents of the optional YAML config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub project_variable: Option<String>,
    #[serde(default)]
    pub import_flag_variable: Option<String>,
    #[serde(default)]
    pub default_project: Option<String>,
}

impl ConfigFile {
    /// Parse a config file from YAML text
    pub fn parse(content: &str) -> ImportResult<Self> {
        // An empty document deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a config file. A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> ImportResult<Option<Self>> {
        if !path.exists() {
            if required {
                return Err(ImportError::ConfigParse(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let parsed = Self::parse(&content).map_err(|e| match e {
            ImportError::ConfigParse(msg) => {
                ImportError::ConfigParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Some(parsed))
    }
}

/// Values supplied on the command line (or through their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub binary: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved configuration for one run.
///
/// Passed explicitly to the discoverer and the state tool instead of relying
/// on the ambient profile or current directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ImporterConfig {
    /// Workspace override; `None` means ask the state tool
    pub workspace: Option<String>,
    /// AWS shared-config profile
    pub profile: String,
    /// AWS region override; `None` means use the profile's region
    pub region: Option<String>,
    /// State tool binary (`terraform`, `tofu`, or a path)
    pub binary: String,
    /// Directory the state tool runs in
    pub working_dir: PathBuf,
    pub project_variable: String,
    pub import_flag_variable: String,
    pub default_project: String,
}

impl ImporterConfig {
    /// Merge overrides over an optional config file over defaults
    pub fn merge(overrides: ConfigOverrides, file: Option<ConfigFile>, working_dir: PathBuf) -> Self {
        let file = file.unwrap_or_default();

        Self {
            workspace: overrides.workspace.filter(|w| !w.trim().is_empty()),
            profile: overrides
                .profile
                .or(file.profile)
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            region: overrides.region.or(file.region),
            binary: overrides
                .binary
                .or(file.binary)
                .unwrap_or_else(|| DEFAULT_BINARY.to_string()),
            working_dir,
            project_variable: file
                .project_variable
                .unwrap_or_else(|| DEFAULT_PROJECT_VARIABLE.to_string()),
            import_flag_variable: file
                .import_flag_variable
                .unwrap_or_else(|| DEFAULT_IMPORT_FLAG_VARIABLE.to_string()),
            default_project: file
                .default_project
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
        }
    }

    /// Resolve the working directory, read the config file, and merge
    pub fn load(overrides: ConfigOverrides) -> ImportResult<Self> {
        let working_dir = match &overrides.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let file = match &overrides.config_path {
            Some(path) => ConfigFile::load(path, true)?,
            None => ConfigFile::load(&working_dir.join(DEFAULT_CONFIG_FILE), false)?,
        };

        Ok(Self::merge(overrides, file, working_dir))
    }
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self::merge(ConfigOverrides::default(), None, PathBuf::from("."))
    }
}
