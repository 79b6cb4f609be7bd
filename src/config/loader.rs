// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::RawSettings;
use crate::errors::{MailbuildError, Result};
use crate::types::BuildEnv;

/// File stem shared by every settings file (`mailbuild.yml`, `mailbuild.prod.json`, ...).
pub const SETTINGS_STEM: &str = "mailbuild";

/// Extensions tried during discovery, in order.
pub const SETTINGS_EXTENSIONS: [&str; 4] = ["json", "yml", "yaml", "toml"];

/// Load a settings file and return the raw `RawSettings`.
///
/// The format is picked from the extension. This only deserializes; values
/// are resolved against CLI flags and defaults in
/// [`crate::config::Settings::resolve`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        MailbuildError::ConfigError(format!("cannot read settings file {:?}: {e}", path))
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let raw = match ext.as_deref() {
        Some("json") => serde_json::from_str(&contents)?,
        Some("yml") | Some("yaml") => {
            // An empty YAML document deserializes to unit, not a map.
            if contents.trim().is_empty() {
                RawSettings::default()
            } else {
                serde_yaml::from_str(&contents)?
            }
        }
        Some("toml") => toml::from_str(&contents)?,
        _ => return Err(MailbuildError::UnsupportedSettingsFormat(path.to_path_buf())),
    };

    debug!(path = %path.display(), "loaded settings file");
    Ok(raw)
}

/// Find the settings file for `env` inside `workspace`.
///
/// Environment-specific files (`mailbuild.<env>.<ext>`) win over generic
/// ones (`mailbuild.<ext>`). Two candidates at the same level are an error.
pub fn discover_settings_file(workspace: &Path, env: BuildEnv) -> Result<Option<PathBuf>> {
    let env_specific = candidates(workspace, &format!("{SETTINGS_STEM}.{env}"));
    if let Some(found) = single_candidate(env_specific)? {
        return Ok(Some(found));
    }

    let generic = candidates(workspace, SETTINGS_STEM);
    single_candidate(generic)
}

fn candidates(workspace: &Path, stem: &str) -> Vec<PathBuf> {
    SETTINGS_EXTENSIONS
        .iter()
        .map(|ext| workspace.join(format!("{stem}.{ext}")))
        .filter(|p| p.is_file())
        .collect()
}

fn single_candidate(mut found: Vec<PathBuf>) -> Result<Option<PathBuf>> {
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(MailbuildError::AmbiguousSettings(found)),
    }
}
