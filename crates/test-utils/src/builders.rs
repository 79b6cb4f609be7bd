#![allow(dead_code)]

use std::path::PathBuf;

use mailbuild::config::{EnvSnapshot, Overrides, ResolveContext, Settings};
use mailbuild::config::RawSettings;
use mailbuild::types::BuildEnv;
use serde_json::Value;

/// Workspace root every builder-made `Settings` resolves under.
pub const WORKSPACE: &str = "/ws";

/// Builder for `Settings` rooted at `/ws` (sources in `/ws/src`, outputs in
/// `/ws/dist`). Watching and live reload are off unless asked for.
pub struct SettingsBuilder {
    raw: RawSettings,
    overrides: Overrides,
    build_env: BuildEnv,
    env: EnvSnapshot,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawSettings::default(),
            overrides: Overrides {
                watch: Some(false),
                live_reload: Some(false),
                upload: Some(false),
                ..Default::default()
            },
            build_env: BuildEnv::Dev,
            env: EnvSnapshot::default(),
        }
    }

    pub fn prod(mut self) -> Self {
        self.build_env = BuildEnv::Prod;
        self
    }

    pub fn locales(mut self, locales: &[&str]) -> Self {
        self.overrides.locales = Some(locales.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn omit_default_locale(mut self, omit: bool) -> Self {
        self.overrides.omit_default_locale_from_filename = Some(omit);
        self
    }

    pub fn input_files(mut self, selectors: &[&str]) -> Self {
        self.overrides.input_files = Some(selectors.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.raw.ignore_files.push(pattern.to_string());
        self
    }

    /// Global templating context; `value` must be a JSON object.
    pub fn context(mut self, value: Value) -> Self {
        if let Value::Object(map) = value {
            self.raw.templating.context = map;
        }
        self
    }

    pub fn options(mut self, value: Value) -> Self {
        if let Value::Object(map) = value {
            self.raw.templating.options = map;
        }
        self
    }

    pub fn live_reload(mut self) -> Self {
        self.overrides.live_reload = Some(true);
        self
    }

    /// Bucket, region and credentials; uploads stay off until `upload()`.
    pub fn storage(mut self, bucket: &str, region: &str) -> Self {
        self.overrides.bucket = Some(bucket.to_string());
        self.overrides.region = Some(region.to_string());
        self.env.access_key_id = Some("test-key".to_string());
        self.env.secret_access_key = Some("test-secret".to_string());
        self
    }

    pub fn storage_path(mut self, path: &str) -> Self {
        self.raw.storage.path = Some(path.to_string());
        self
    }

    pub fn force(mut self) -> Self {
        self.overrides.force_upload = Some(true);
        self
    }

    pub fn upload(mut self) -> Self {
        self.overrides.upload = Some(true);
        self
    }

    pub fn build(self) -> Settings {
        let ctx = ResolveContext {
            workspace: PathBuf::from(WORKSPACE),
            build_env: self.build_env,
            settings_file: None,
            env: self.env,
        };
        Settings::resolve(self.raw, &self.overrides, &ctx)
            .expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
