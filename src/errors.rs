// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailbuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Workspace {0:?} is not a directory. To build specific files, use --files")]
    WorkspaceNotDirectory(PathBuf),

    #[error(
        "Multiple settings files found: {}. Pass one with --settings or narrow the workspace",
        display_paths(.0)
    )]
    AmbiguousSettings(Vec<PathBuf>),

    #[error("Settings file {0:?} must be JSON, YAML or TOML")]
    UnsupportedSettingsFormat(PathBuf),

    #[error("Missing storage settings: {0}")]
    MissingCredentials(String),

    #[error("Path is not part of the task index: {0:?}")]
    UnknownPath(PathBuf),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MailbuildError>;
