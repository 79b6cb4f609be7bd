use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Key-value map used for templating contexts and options.
///
/// Values are arbitrary JSON-like data; merging is shallow (top-level keys
/// only), see [`crate::resolve::expand::merge_maps`].
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

/// The build environment a run was started in.
///
/// `Dev` is the interactive default (watch + preview); `Prod` is the publish
/// build (minified output, optional uploads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildEnv {
    Dev,
    Prod,
}

impl Default for BuildEnv {
    fn default() -> Self {
        BuildEnv::Dev
    }
}

impl fmt::Display for BuildEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildEnv::Dev => f.write_str("dev"),
            BuildEnv::Prod => f.write_str("prod"),
        }
    }
}

impl FromStr for BuildEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(BuildEnv::Dev),
            "prod" => Ok(BuildEnv::Prod),
            other => Err(format!(
                "invalid build environment: {other} (expected \"dev\" or \"prod\")"
            )),
        }
    }
}

/// A boolean setting that may instead name a build environment.
///
/// ```yaml
/// watch: true      # always
/// upload: prod     # only in prod builds
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvBool {
    Flag(bool),
    Env(BuildEnv),
}

impl EnvBool {
    /// Resolve against the active build environment.
    pub fn resolve(self, env: BuildEnv) -> bool {
        match self {
            EnvBool::Flag(value) => value,
            EnvBool::Env(only_in) => only_in == env,
        }
    }
}

impl From<bool> for EnvBool {
    fn from(value: bool) -> Self {
        EnvBool::Flag(value)
    }
}

/// Classification of a source file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputKind {
    /// Rendered through the templating layer and the markup renderer.
    Template,
    /// Copied to the output directory as-is.
    Asset,
}

/// What a task writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    Html,
    /// Same bytes, same extension (empty for extension-less files).
    Passthrough(String),
}

impl OutputKind {
    pub fn extension(&self) -> &str {
        match self {
            OutputKind::Html => "html",
            OutputKind::Passthrough(ext) => ext,
        }
    }
}
