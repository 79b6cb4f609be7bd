// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{BuildEnv, ContextMap, EnvBool};

/// Locale used when neither the settings file nor the CLI names any.
pub const DEFAULT_LOCALE: &str = "en";

/// Context key that receives the public URL of a published email.
pub const DEFAULT_VIEW_IN_BROWSER_TAG: &str = "viewInBrowserLink";

pub const DEFAULT_LIVE_RELOAD_PORT: u16 = 3000;

/// Settings file as read from JSON, YAML or TOML.
///
/// ```yaml
/// base_dir: .
/// source_dir: src
/// output_dir: dist
/// locales: [en, fr]
/// watch: dev
/// upload: prod
/// options:
///   omit_default_locale_from_filename: true
/// storage:
///   bucket: my-emails
///   region: eu-west-1
/// templating:
///   context:
///     company: Acme
/// ```
///
/// Every field is optional; missing values fall back to the compiled
/// defaults during resolution (see [`crate::config::Settings::resolve`]).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    /// Directory that `source_dir` and `output_dir` are relative to.
    pub base_dir: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,

    /// Input globs; unset means "everything under `source_dir`".
    pub input_files: Option<Vec<String>>,
    /// Globs excluded from discovery.
    pub ignore_files: Vec<String>,

    /// Ordered locales, first one is the default.
    pub locales: Option<Vec<String>>,

    pub verbose: Option<EnvBool>,
    pub watch: Option<EnvBool>,
    pub upload: Option<EnvBool>,
    pub force_upload: Option<EnvBool>,

    pub options: OptionsSection,

    pub live_reload: Option<EnvBool>,
    pub live_reload_options: LiveReloadSection,

    pub storage: StorageSection,

    /// Global templating context/options, merged into every task at lowest
    /// priority. `handlebars` is accepted as an alias.
    #[serde(alias = "handlebars")]
    pub templating: TemplatingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionsSection {
    pub delete_output_dir: Option<EnvBool>,
    pub omit_default_locale_from_filename: Option<EnvBool>,
    pub view_in_browser_tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiveReloadSection {
    pub port: Option<u16>,
    pub start_path: Option<String>,
    pub open: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Key prefix prepended to every uploaded file name.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplatingSection {
    pub context: ContextMap,
    pub options: ContextMap,
}

/// Compiled defaults for the environment-dependent booleans.
#[derive(Debug, Clone, Copy)]
pub struct Defaults;

impl Defaults {
    pub const VERBOSE: EnvBool = EnvBool::Env(BuildEnv::Dev);
    pub const WATCH: EnvBool = EnvBool::Env(BuildEnv::Dev);
    pub const LIVE_RELOAD: EnvBool = EnvBool::Env(BuildEnv::Dev);
    pub const UPLOAD: EnvBool = EnvBool::Env(BuildEnv::Prod);
    pub const FORCE_UPLOAD: EnvBool = EnvBool::Flag(false);
    pub const DELETE_OUTPUT_DIR: EnvBool = EnvBool::Env(BuildEnv::Prod);
    pub const OMIT_DEFAULT_LOCALE: EnvBool = EnvBool::Flag(true);

    pub const BASE_DIR: &'static str = ".";
    pub const SOURCE_DIR: &'static str = "src";
    pub const OUTPUT_DIR: &'static str = "dist";
}
