// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::settings::{
    ENV_ACCESS_KEY_ID, ENV_DEFAULT_BUCKET, ENV_DEFAULT_REGION, ENV_SECRET_ACCESS_KEY, EnvSnapshot,
    StorageSettings,
};
use crate::errors::{MailbuildError, Result};

/// Locales must be non-empty and unique; the first one is the default.
pub fn validate_locales(locales: &[String]) -> Result<()> {
    if locales.is_empty() {
        return Err(MailbuildError::ConfigError(
            "at least one locale is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for locale in locales {
        if !seen.insert(locale.as_str()) {
            return Err(MailbuildError::ConfigError(format!(
                "locale '{}' is listed more than once",
                locale
            )));
        }
        if let Some(problem) = locale_problem(locale) {
            return Err(MailbuildError::ConfigError(format!(
                "locale '{}' {}",
                locale, problem
            )));
        }
    }
    Ok(())
}

/// Why `locale` can't be spliced into an output file name, if it can't.
pub fn locale_problem(locale: &str) -> Option<&'static str> {
    if locale.is_empty() {
        Some("is empty")
    } else if locale.contains(['/', '\\']) {
        Some("cannot contain path separators")
    } else if locale == "." || locale == ".." {
        Some("cannot be a relative path component")
    } else {
        None
    }
}

/// The output dir must not be, or contain, the source dir.
pub fn validate_dirs(source_dir: &Path, output_dir: &Path) -> Result<()> {
    if source_dir.starts_with(output_dir) {
        return Err(MailbuildError::ConfigError(format!(
            "output dir {:?} must not contain the source dir {:?}",
            output_dir, source_dir
        )));
    }
    Ok(())
}

/// Uploading needs credentials, a bucket and a region.
pub fn validate_upload(storage: Option<&StorageSettings>, env: &EnvSnapshot) -> Result<()> {
    let mut missing = Vec::new();

    if env.access_key_id.is_none() {
        missing.push(ENV_ACCESS_KEY_ID.to_string());
    }
    if env.secret_access_key.is_none() {
        missing.push(ENV_SECRET_ACCESS_KEY.to_string());
    }
    if storage.is_none() {
        missing.push(format!(
            "bucket and region (--bucket/--region, storage.bucket/storage.region, {}/{})",
            ENV_DEFAULT_BUCKET, ENV_DEFAULT_REGION
        ));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MailbuildError::MissingCredentials(missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_duplicate_locales_are_rejected() {
        assert!(validate_locales(&[]).is_err());
        assert!(validate_locales(&["en".into(), "en".into()]).is_err());
        assert!(validate_locales(&["en".into(), "es".into()]).is_ok());
        assert!(validate_locales(&["en".into(), "x/../y".into()]).is_err());
        assert!(validate_locales(&["..".into()]).is_err());
    }

    #[test]
    fn output_dir_cannot_wrap_sources() {
        assert!(validate_dirs(Path::new("/ws/src"), Path::new("/ws")).is_err());
        assert!(validate_dirs(Path::new("/ws/src"), Path::new("/ws/src")).is_err());
        assert!(validate_dirs(Path::new("/ws/src"), Path::new("/ws/dist")).is_ok());
        assert!(validate_dirs(Path::new("/ws/src"), Path::new("/ws/src/dist")).is_ok());
    }

    #[test]
    fn upload_reports_every_missing_piece() {
        let err = validate_upload(None, &EnvSnapshot::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("AWS_ACCESS_KEY_ID"));
        assert!(msg.contains("AWS_SECRET_ACCESS_KEY"));
        assert!(msg.contains("bucket and region"));
    }
}
