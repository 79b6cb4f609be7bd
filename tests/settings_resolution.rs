mod common;

use std::fs;
use std::path::PathBuf;

use mailbuild::config::{EnvSnapshot, LoadRequest, Overrides, load_settings};
use mailbuild::errors::MailbuildError;
use mailbuild::types::BuildEnv;
use tempfile::TempDir;

fn request(dir: &TempDir, build_env: BuildEnv) -> LoadRequest {
    LoadRequest {
        cwd: dir.path().to_path_buf(),
        workspace: None,
        settings_file: None,
        build_env,
        overrides: Overrides::default(),
        env: EnvSnapshot::default(),
    }
}

#[test]
fn no_settings_file_means_defaults() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();

    let settings = load_settings(request(&dir, BuildEnv::Dev)).unwrap();

    assert!(settings.settings_file.is_none());
    assert_eq!(settings.source_dir, dir.path().join("src"));
    assert_eq!(settings.output_dir, dir.path().join("dist"));
    assert_eq!(settings.locales, vec!["en".to_string()]);
}

#[test]
fn env_specific_file_wins_over_generic() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mailbuild.yml"), "locales: [en]\n").unwrap();
    fs::write(dir.path().join("mailbuild.dev.toml"), "locales = [\"de\", \"en\"]\n").unwrap();

    let settings = load_settings(request(&dir, BuildEnv::Dev)).unwrap();

    assert_eq!(settings.locales, vec!["de".to_string(), "en".to_string()]);
    assert_eq!(
        settings.settings_file,
        Some(dir.path().join("mailbuild.dev.toml"))
    );
}

#[test]
fn two_files_at_the_same_level_are_ambiguous() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mailbuild.json"), "{}").unwrap();
    fs::write(dir.path().join("mailbuild.yaml"), "").unwrap();

    let err = load_settings(request(&dir, BuildEnv::Dev)).unwrap_err();
    assert!(matches!(err, MailbuildError::AmbiguousSettings(ref found) if found.len() == 2));
}

#[test]
fn workspace_must_be_a_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("email.mjml"), "<mjml/>").unwrap();

    let mut req = request(&dir, BuildEnv::Dev);
    req.workspace = Some(PathBuf::from("email.mjml"));

    let err = load_settings(req).unwrap_err();
    assert!(matches!(err, MailbuildError::WorkspaceNotDirectory(_)));
    assert!(err.to_string().contains("--files"));
}

#[test]
fn explicit_settings_file_must_exist() {
    let dir = TempDir::new().unwrap();
    let mut req = request(&dir, BuildEnv::Dev);
    req.settings_file = Some(PathBuf::from("missing.yml"));

    assert!(matches!(
        load_settings(req),
        Err(MailbuildError::ConfigError(_))
    ));
}

#[test]
fn prod_upload_without_credentials_fails_early() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("mailbuild.prod.yml"),
        "storage:\n  bucket: mail\n  region: eu-west-1\n",
    )
    .unwrap();

    let err = load_settings(request(&dir, BuildEnv::Prod)).unwrap_err();
    match err {
        MailbuildError::MissingCredentials(msg) => {
            assert!(msg.contains("AWS_ACCESS_KEY_ID"));
            assert!(!msg.contains("bucket and region"));
        }
        other => panic!("expected MissingCredentials, got {other:?}"),
    }

    let mut req = request(&dir, BuildEnv::Prod);
    req.env = EnvSnapshot {
        access_key_id: Some("id".into()),
        secret_access_key: Some("secret".into()),
        ..Default::default()
    };
    let settings = load_settings(req).unwrap();
    assert!(settings.upload);
    assert!(settings.publishes());
    assert!(!settings.watch_enabled);
}

#[test]
fn cli_overrides_beat_the_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("mailbuild.json"),
        r#"{"source_dir": "emails", "locales": ["fr"], "options": {"omit_default_locale_from_filename": true}}"#,
    )
    .unwrap();

    let mut req = request(&dir, BuildEnv::Dev);
    req.overrides = Overrides {
        omit_default_locale_from_filename: Some(false),
        locales: Some(vec!["en".into(), "es".into()]),
        ..Default::default()
    };

    let settings = load_settings(req).unwrap();
    assert_eq!(settings.source_dir, dir.path().join("emails"));
    assert_eq!(settings.locales, vec!["en".to_string(), "es".to_string()]);
    assert!(!settings.omit_default_locale_from_filename);
}
