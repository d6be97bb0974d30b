//! Immutable settings snapshot read once per query.
//!
//! Sources, lowest precedence first:
//!   1. Built-in defaults
//!   2. `<root>/.vscode/settings.json`, keys prefixed with `cmake-llvm-coverage.`
//!   3. Explicit overrides (CLI flags)
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Prefix of every key in the workspace settings file.
pub const SETTINGS_SECTION: &str = "cmake-llvm-coverage";

pub const BUILD_TREE_DIRECTORY_LABEL: &str = "Cmake Llvm Coverage: Build Tree Directory";
pub const BUILD_COMMAND_LABEL: &str = "Cmake Llvm Coverage: Build Command";
pub const BUILD_TARGET_LABEL: &str = "Cmake Llvm Coverage: Build Target";
pub const REPORT_FILE_NAME_LABEL: &str = "Cmake Llvm Coverage: Report File Name";

pub const DEFAULT_BUILD_TREE_DIRECTORY: &str = "build";
pub const DEFAULT_BUILD_COMMAND: &str = "cmake";
pub const DEFAULT_BUILD_TARGET: &str = "coverage";
pub const DEFAULT_REPORT_FILE_NAME: &str = "coverage.json";

/// Location of the workspace settings file, relative to the root directory.
pub const WORKSPACE_SETTINGS_FILE: &str = ".vscode/settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute workspace root.
    pub root_directory: PathBuf,
    /// Relative to `root_directory`.
    pub build_tree_directory: PathBuf,
    pub build_command: String,
    pub build_target: String,
    /// File name (or glob fragment) of the coverage report.
    pub report_file_name: String,
}

impl Settings {
    /// Settings for `root_directory` with every other value defaulted.
    pub fn with_defaults(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            build_tree_directory: PathBuf::from(DEFAULT_BUILD_TREE_DIRECTORY),
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            build_target: DEFAULT_BUILD_TARGET.to_string(),
            report_file_name: DEFAULT_REPORT_FILE_NAME.to_string(),
        }
    }
}

/// Values that take precedence over the workspace settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub build_tree_directory: Option<PathBuf>,
    pub build_command: Option<String>,
    pub build_target: Option<String>,
    pub report_file_name: Option<String>,
}

/// Build the settings snapshot for `root_directory`.
pub fn load(root_directory: &Path, overrides: &SettingsOverrides) -> Result<Settings> {
    if !root_directory.is_absolute() {
        return Err(Error::InvalidConfiguration(format!(
            "The workspace root directory '{}' must be an absolute path.",
            root_directory.display()
        )));
    }

    let mut settings = Settings::with_defaults(root_directory);

    let settings_path = root_directory.join(WORKSPACE_SETTINGS_FILE);
    if let Some(values) = read_workspace_settings(&settings_path)? {
        apply_workspace_settings(&mut settings, &values, &settings_path)?;
    }

    if let Some(v) = &overrides.build_tree_directory {
        settings.build_tree_directory = v.clone();
    }
    if let Some(v) = &overrides.build_command {
        settings.build_command = v.clone();
    }
    if let Some(v) = &overrides.build_target {
        settings.build_target = v.clone();
    }
    if let Some(v) = &overrides.report_file_name {
        settings.report_file_name = v.clone();
    }

    tracing::debug!(?settings, "settings loaded");
    Ok(settings)
}

/// A missing file yields `None`; anything unreadable or malformed is an error.
fn read_workspace_settings(path: &Path) -> Result<Option<Map<String, Value>>> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::InvalidConfiguration(format!(
                "Cannot read the workspace settings file {}: {e}",
                path.display()
            )))
        }
    };

    match serde_json::from_slice::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(Error::InvalidConfiguration(format!(
            "The workspace settings file {} must contain a JSON object.",
            path.display()
        ))),
        Err(e) => Err(Error::InvalidConfiguration(format!(
            "Invalid JSON in the workspace settings file {}: {e}",
            path.display()
        ))),
    }
}

fn apply_workspace_settings(
    settings: &mut Settings,
    values: &Map<String, Value>,
    path: &Path,
) -> Result<()> {
    if let Some(v) = string_setting(values, "buildTreeDirectory", path)? {
        settings.build_tree_directory = PathBuf::from(v);
    }
    if let Some(v) = string_setting(values, "cmakeCommand", path)? {
        settings.build_command = v;
    }
    if let Some(v) = string_setting(values, "cmakeTarget", path)? {
        settings.build_target = v;
    }
    if let Some(v) = string_setting(values, "coverageInfoFileName", path)? {
        settings.report_file_name = v;
    }
    Ok(())
}

fn string_setting(values: &Map<String, Value>, key: &str, path: &Path) -> Result<Option<String>> {
    let full_key = format!("{SETTINGS_SECTION}.{key}");
    match values.get(&full_key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidConfiguration(format!(
            "The '{full_key}' setting in {} must be a string.",
            path.display()
        ))),
    }
}
