// src/config/settings.rs

//! Resolved, immutable settings.
//!
//! [`Settings::resolve`] merges three layers, highest priority first:
//! CLI [`Overrides`], the [`RawSettings`] from the settings file, and the
//! compiled [`Defaults`]. Storage values additionally fall back to the
//! process environment captured in an [`EnvSnapshot`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::model::{
    DEFAULT_LIVE_RELOAD_PORT, DEFAULT_LOCALE, DEFAULT_VIEW_IN_BROWSER_TAG, Defaults, RawSettings,
    StorageSection,
};
use crate::config::validate;
use crate::errors::Result;
use crate::fs::path_utils::{absolutize, to_slash};
use crate::types::{BuildEnv, ContextMap, EnvBool};

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_DEFAULT_BUCKET: &str = "AWS_DEFAULT_BUCKET";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Start page of the live-reload preview, also the welcome page file name.
pub const WELCOME_PAGE: &str = "__.html";

/// Values taken from the CLI. `None` leaves the lower layers in charge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub verbose: Option<bool>,
    pub watch: Option<bool>,
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub input_files: Option<Vec<String>>,
    pub locales: Option<Vec<String>>,
    pub delete_output_dir: Option<bool>,
    pub omit_default_locale_from_filename: Option<bool>,
    pub upload: Option<bool>,
    pub force_upload: Option<bool>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub live_reload: Option<bool>,
    pub port: Option<u16>,
    pub start_path: Option<String>,
    pub open: Option<bool>,
}

/// The storage-related environment variables, read once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub default_bucket: Option<String>,
    pub default_region: Option<String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            access_key_id: var(ENV_ACCESS_KEY_ID),
            secret_access_key: var(ENV_SECRET_ACCESS_KEY),
            default_bucket: var(ENV_DEFAULT_BUCKET),
            default_region: var(ENV_DEFAULT_REGION),
        }
    }
}

/// Where and how resolution happens.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Absolute workspace directory; relative `base_dir` is joined onto it.
    pub workspace: PathBuf,
    pub build_env: BuildEnv,
    /// Settings file the raw values came from, if any.
    pub settings_file: Option<PathBuf>,
    pub env: EnvSnapshot,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    /// Key prefix, empty or ending in `/`.
    pub prefix: String,
    pub credentials: Option<Credentials>,
}

impl StorageSettings {
    /// `https://<bucket>.s3.<region>.amazonaws.com/<prefix><file_name>`
    pub fn public_url(&self, file_name: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}{}",
            self.bucket, self.region, self.prefix, file_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveReloadSettings {
    pub port: u16,
    pub start_path: String,
    pub open: bool,
}

/// Fully resolved settings. Built once per process and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub build_env: BuildEnv,
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Absolute input globs; `None` means everything under `source_dir`.
    pub input_selectors: Option<Vec<String>>,
    /// Absolute (or `**`-anchored) ignore globs.
    pub ignore_patterns: Vec<String>,
    /// Non-empty; `locales[0]` is the default locale.
    pub locales: Vec<String>,
    pub omit_default_locale_from_filename: bool,
    pub global_templating_context: ContextMap,
    pub global_templating_options: ContextMap,
    pub watch_enabled: bool,
    pub verbose: bool,
    pub delete_output_dir: bool,
    pub upload: bool,
    pub force_upload: bool,
    pub view_in_browser_tag: String,
    pub storage: Option<StorageSettings>,
    /// `Some` when the live-reload preview is enabled.
    pub live_reload: Option<LiveReloadSettings>,
    pub settings_file: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(raw: RawSettings, overrides: &Overrides, ctx: &ResolveContext) -> Result<Self> {
        let env = ctx.build_env;
        let flag = |cli: Option<bool>, file: Option<EnvBool>, default: EnvBool| -> bool {
            cli.unwrap_or_else(|| file.unwrap_or(default).resolve(env))
        };

        let base_dir = absolutize(
            &ctx.workspace,
            raw.base_dir.as_deref().unwrap_or(Path::new(Defaults::BASE_DIR)),
        );
        let source_dir = absolutize(
            &base_dir,
            overrides
                .source_dir
                .as_deref()
                .or(raw.source_dir.as_deref())
                .unwrap_or(Path::new(Defaults::SOURCE_DIR)),
        );
        let output_dir = absolutize(
            &base_dir,
            overrides
                .output_dir
                .as_deref()
                .or(raw.output_dir.as_deref())
                .unwrap_or(Path::new(Defaults::OUTPUT_DIR)),
        );

        validate::validate_dirs(&source_dir, &output_dir)?;

        let input_selectors = overrides
            .input_files
            .clone()
            .or(raw.input_files)
            .map(|globs| anchor_globs(&base_dir, globs));
        let ignore_patterns = anchor_globs(&base_dir, raw.ignore_files);

        let locales = clean_locales(
            overrides
                .locales
                .clone()
                .or(raw.locales)
                .unwrap_or_else(|| vec![DEFAULT_LOCALE.to_string()]),
        );
        validate::validate_locales(&locales)?;

        let upload = flag(overrides.upload, raw.upload, Defaults::UPLOAD);
        let storage = resolve_storage(&raw.storage, overrides, &ctx.env);
        if upload {
            validate::validate_upload(storage.as_ref(), &ctx.env)?;
        }

        let live_reload = flag(overrides.live_reload, raw.live_reload, Defaults::LIVE_RELOAD).then(|| {
            LiveReloadSettings {
                port: overrides
                    .port
                    .or(raw.live_reload_options.port)
                    .unwrap_or(DEFAULT_LIVE_RELOAD_PORT),
                start_path: overrides
                    .start_path
                    .clone()
                    .or(raw.live_reload_options.start_path.clone())
                    .unwrap_or_else(|| WELCOME_PAGE.to_string()),
                open: overrides
                    .open
                    .or(raw.live_reload_options.open)
                    .unwrap_or(true),
            }
        });

        Ok(Settings {
            build_env: env,
            base_dir,
            source_dir,
            output_dir,
            input_selectors,
            ignore_patterns,
            locales,
            omit_default_locale_from_filename: flag(
                overrides.omit_default_locale_from_filename,
                raw.options.omit_default_locale_from_filename,
                Defaults::OMIT_DEFAULT_LOCALE,
            ),
            global_templating_context: raw.templating.context,
            global_templating_options: raw.templating.options,
            watch_enabled: flag(overrides.watch, raw.watch, Defaults::WATCH),
            verbose: flag(overrides.verbose, raw.verbose, Defaults::VERBOSE),
            delete_output_dir: flag(
                overrides.delete_output_dir,
                raw.options.delete_output_dir,
                Defaults::DELETE_OUTPUT_DIR,
            ),
            upload,
            force_upload: flag(overrides.force_upload, raw.force_upload, Defaults::FORCE_UPLOAD),
            view_in_browser_tag: raw
                .options
                .view_in_browser_tag
                .unwrap_or_else(|| DEFAULT_VIEW_IN_BROWSER_TAG.to_string()),
            storage,
            live_reload,
            settings_file: ctx.settings_file.clone(),
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.locales[0]
    }

    /// Prod build that uploads its outputs: they get a public URL.
    pub fn publishes(&self) -> bool {
        self.build_env == BuildEnv::Prod && self.upload_target().is_some()
    }

    /// Storage to upload to, only when uploads are enabled.
    pub fn upload_target(&self) -> Option<&StorageSettings> {
        if self.upload { self.storage.as_ref() } else { None }
    }
}

fn anchor_globs(base_dir: &Path, globs: Vec<String>) -> Vec<String> {
    globs
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .map(|g| {
            if g.starts_with("**") {
                g
            } else {
                to_slash(&absolutize(base_dir, Path::new(&g)))
            }
        })
        .collect()
}

fn clean_locales(locales: Vec<String>) -> Vec<String> {
    locales
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn resolve_storage(
    file: &StorageSection,
    overrides: &Overrides,
    env: &EnvSnapshot,
) -> Option<StorageSettings> {
    let bucket = overrides
        .bucket
        .clone()
        .or(file.bucket.clone())
        .or(env.default_bucket.clone())?;
    let region = overrides
        .region
        .clone()
        .or(file.region.clone())
        .or(env.default_region.clone())?;

    let prefix = match file.path.as_deref().map(|p| p.trim_matches('/')) {
        Some(p) if !p.is_empty() => format!("{p}/"),
        _ => String::new(),
    };

    let credentials = match (&env.access_key_id, &env.secret_access_key) {
        (Some(id), Some(secret)) => Some(Credentials {
            access_key_id: id.clone(),
            secret_access_key: secret.clone(),
        }),
        _ => None,
    };

    Some(StorageSettings {
        bucket,
        region,
        prefix,
        credentials,
    })
}
