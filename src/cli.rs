// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Overrides;
use crate::types::BuildEnv;

/// Command-line arguments for `mailbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mailbuild",
    version,
    about = "Build localized HTML emails from templates, with watch and preview.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub flags: BuildFlags,
}

/// Build subcommands. Running without one is the same as `dev`.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compile templates to HTML for local development.
    Dev {
        /// Directory where mailbuild looks for its settings file.
        workspace: Option<PathBuf>,
    },
    /// Compile templates to HTML for publishing (minified, optional upload).
    Prod {
        /// Directory where mailbuild looks for its settings file.
        workspace: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildFlags {
    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, `MAILBUILD_LOG` or a default level is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Watch for changes.
    #[arg(short, long, global = true, conflicts_with = "no_watch")]
    pub watch: bool,

    /// Compile once and exit, even in dev.
    #[arg(long, global = true)]
    pub no_watch: bool,

    /// Settings file to use instead of discovering one in the workspace.
    #[arg(long, value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// Source directory.
    #[arg(short, long = "src", value_name = "DIR", global = true)]
    pub src: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output: Option<PathBuf>,

    /// Comma separated list of input globs.
    #[arg(short, long, value_name = "GLOBS", value_delimiter = ',', global = true)]
    pub files: Option<Vec<String>>,

    /// Comma separated list of locales; the first one is the default.
    #[arg(short, long, value_name = "LOCALES", value_delimiter = ',', global = true)]
    pub locales: Option<Vec<String>>,

    /// Delete the output directory before compiling.
    #[arg(short = 'D', long, global = true)]
    pub delete_output_dir: bool,

    /// Omit the default locale from output file names (true/false).
    #[arg(long, value_name = "BOOL", global = true)]
    pub omit_default_locale: Option<bool>,

    /// Upload outputs and assets to object storage if not already there.
    #[arg(short, long, global = true)]
    pub upload: bool,

    /// Upload assets even if they already exist in object storage.
    #[arg(long, global = true)]
    pub force_upload: bool,

    /// Object storage bucket.
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Object storage region.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Start the live-reload preview.
    #[arg(short = 'b', long, global = true, conflicts_with = "no_live_reload")]
    pub live_reload: bool,

    /// Don't start the live-reload preview.
    #[arg(long, global = true)]
    pub no_live_reload: bool,

    /// Live-reload port.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Live-reload start path.
    #[arg(long, value_name = "PATH", global = true)]
    pub start_path: Option<String>,

    /// Don't open the browser when the preview starts.
    #[arg(long, global = true)]
    pub no_open: bool,

    /// Resolve settings and tasks, print them, but don't compile anything.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    pub fn build_env(&self) -> BuildEnv {
        match self.command {
            Some(Command::Prod { .. }) => BuildEnv::Prod,
            _ => BuildEnv::Dev,
        }
    }

    pub fn workspace(&self) -> Option<&PathBuf> {
        match &self.command {
            Some(Command::Dev { workspace }) | Some(Command::Prod { workspace }) => {
                workspace.as_ref()
            }
            None => None,
        }
    }

    /// Translate the flags into settings overrides.
    ///
    /// Switch-style flags only override when they are present; an absent
    /// switch leaves the settings file (or default) in charge.
    pub fn overrides(&self) -> Overrides {
        let f = &self.flags;
        Overrides {
            verbose: f.verbose.then_some(true),
            watch: tri_state(f.watch, f.no_watch),
            source_dir: f.src.clone(),
            output_dir: f.output.clone(),
            input_files: f.files.clone(),
            locales: f.locales.clone(),
            delete_output_dir: f.delete_output_dir.then_some(true),
            omit_default_locale_from_filename: f.omit_default_locale,
            upload: f.upload.then_some(true),
            force_upload: f.force_upload.then_some(true),
            bucket: f.bucket.clone(),
            region: f.region.clone(),
            live_reload: tri_state(f.live_reload, f.no_live_reload),
            port: f.port,
            start_path: f.start_path.clone(),
            open: f.no_open.then_some(false),
        }
    }
}

fn tri_state(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dev_without_subcommand() {
        let args = CliArgs::parse_from(["mailbuild"]);
        assert_eq!(args.build_env(), BuildEnv::Dev);
        assert!(args.workspace().is_none());
        assert_eq!(args.overrides().watch, None);
    }

    #[test]
    fn prod_with_workspace_and_lists() {
        let args = CliArgs::parse_from([
            "mailbuild",
            "prod",
            "emails",
            "--locales",
            "en,fr",
            "--no-watch",
            "--no-open",
        ]);
        assert_eq!(args.build_env(), BuildEnv::Prod);
        assert_eq!(args.workspace(), Some(&PathBuf::from("emails")));

        let o = args.overrides();
        assert_eq!(o.locales, Some(vec!["en".to_string(), "fr".to_string()]));
        assert_eq!(o.watch, Some(false));
        assert_eq!(o.open, Some(false));
        assert_eq!(o.upload, None);
    }
}
