// src/config/mod.rs

//! Settings: file model, discovery/loading, resolution and validation.

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::errors::{MailbuildError, Result};
use crate::fs::path_utils::absolutize;
use crate::types::BuildEnv;

pub use loader::{discover_settings_file, load_from_path};
pub use model::RawSettings;
pub use settings::{
    Credentials, EnvSnapshot, LiveReloadSettings, Overrides, ResolveContext, Settings,
    StorageSettings,
};

/// Everything needed to produce [`Settings`] for one run.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub cwd: PathBuf,
    pub workspace: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
    pub build_env: BuildEnv,
    pub overrides: Overrides,
    pub env: EnvSnapshot,
}

/// Locate, read and resolve the settings for a run.
///
/// - A workspace argument that is not a directory is fatal.
/// - An explicit settings file must exist.
/// - Otherwise the workspace is searched (see [`discover_settings_file`]);
///   no file at all means compiled defaults.
pub fn load_settings(req: LoadRequest) -> Result<Settings> {
    let workspace = match &req.workspace {
        Some(ws) => {
            let ws = absolutize(&req.cwd, ws);
            if !ws.is_dir() {
                return Err(MailbuildError::WorkspaceNotDirectory(ws));
            }
            ws
        }
        None => req.cwd.clone(),
    };

    let settings_file = match &req.settings_file {
        Some(explicit) => {
            let path = absolutize(&req.cwd, explicit);
            if !path.is_file() {
                return Err(MailbuildError::ConfigError(format!(
                    "settings file {:?} does not exist",
                    path
                )));
            }
            Some(path)
        }
        None => discover_settings_file(&workspace, req.build_env)?,
    };

    let raw = match &settings_file {
        Some(path) => {
            info!(path = %path.display(), "using settings file");
            load_from_path(path)?
        }
        None => {
            debug!(workspace = %workspace.display(), "no settings file found, using defaults");
            RawSettings::default()
        }
    };

    let ctx = ResolveContext {
        workspace,
        build_env: req.build_env,
        settings_file,
        env: req.env,
    };
    Settings::resolve(raw, &req.overrides, &ctx)
}

