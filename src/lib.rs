// src/lib.rs

pub mod cli;
pub mod compile;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod render;
pub mod resolve;
pub mod storage;
pub mod types;
pub mod watch;
pub mod welcome;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::compile::{Compiler, TaskCompiler};
use crate::config::{EnvSnapshot, LoadRequest, Settings};
use crate::engine::{RunSummary, Runtime, RuntimeEvent, RuntimeOptions};
use crate::fs::{FileSystem, RealFileSystem};
use crate::render::{MjmlRenderer, TeraEngine};
use crate::resolve::{InputMatcher, RuntimeTaskIndex};
use crate::storage::S3ObjectStore;
use crate::types::BuildEnv;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings resolution and logging
/// - output directory preparation
/// - the task index and compile pipeline
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let settings = config::load_settings(LoadRequest {
        cwd,
        workspace: args.workspace().cloned(),
        settings_file: args.flags.settings.clone(),
        build_env: args.build_env(),
        overrides: args.overrides(),
        env: EnvSnapshot::from_process(),
    })?;

    logging::init_logging(args.flags.log_level, settings.verbose)?;
    log_settings(&settings);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.flags.dry_run {
        let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings)?;
        print_dry_run(&settings, &index);
        return Ok(());
    }

    prepare_dirs(fs.as_ref(), &settings)?;
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings)?;

    let settings = Arc::new(settings);
    let compiler = Arc::new(default_compiler(Arc::clone(&fs), Arc::clone(&settings))?);

    if settings.watch_enabled {
        watch_and_rebuild(compiler, fs, settings, index).await?;
        return Ok(());
    }

    let summary = build_once(compiler, fs, Arc::clone(&settings), index).await?;
    if settings.build_env == BuildEnv::Prod {
        print_summary(&summary);
    }
    Ok(())
}

/// The production compiler: tera templating, MJML rendering and, when
/// uploads are on, the configured S3 bucket.
pub fn default_compiler(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Result<Compiler> {
    let compiler = Compiler::new(
        Arc::clone(&fs),
        Arc::clone(&settings),
        Arc::new(TeraEngine),
        Arc::new(MjmlRenderer),
    );

    match settings.upload_target() {
        Some(storage) => {
            let store = S3ObjectStore::new(storage.clone(), fs)?;
            Ok(compiler.with_store(Arc::new(store)))
        }
        None => Ok(compiler),
    }
}

/// Delete the output dir if asked to, then make sure both dirs exist.
pub fn prepare_dirs(fs: &dyn FileSystem, settings: &Settings) -> Result<()> {
    if settings.delete_output_dir {
        info!(dir = %settings.output_dir.display(), "deleting output directory");
        fs.remove_dir_all(&settings.output_dir)?;
    }
    fs.create_dir_all(&settings.source_dir)?;
    fs.create_dir_all(&settings.output_dir)?;
    Ok(())
}

/// Compile everything once and return when all tasks are done.
pub async fn build_once<C: TaskCompiler>(
    compiler: Arc<C>,
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    index: RuntimeTaskIndex,
) -> Result<RunSummary> {
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(8);
    tx.send(RuntimeEvent::Ready).await?;

    let options = RuntimeOptions {
        skip_unchanged: false,
        exit_when_idle: true,
    };
    let summary = Runtime::new(compiler, fs, settings, index, rx, options)
        .run()
        .await?;

    let failed = summary.report.failure_count();
    if failed > 0 {
        warn!(failed, "some tasks failed");
    }
    Ok(summary)
}

/// Watch the inputs and recompile on change until Ctrl-C.
async fn watch_and_rebuild<C: TaskCompiler>(
    compiler: Arc<C>,
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    index: RuntimeTaskIndex,
) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let matcher = InputMatcher::from_settings(fs.as_ref(), &settings)?;
    let _watcher_handle = watch::spawn_watcher(matcher, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Runtime::new(compiler, fs, settings, index, rt_rx, RuntimeOptions::default());
    runtime.run().await?;
    Ok(())
}

fn log_settings(settings: &Settings) {
    match &settings.settings_file {
        Some(path) => info!(path = %path.display(), "using settings file"),
        None => info!("no settings file found, using defaults"),
    }
    info!(
        env = %settings.build_env,
        source = %settings.source_dir.display(),
        output = %settings.output_dir.display(),
        locales = ?settings.locales,
        watch = settings.watch_enabled,
        upload = settings.upload,
        "settings resolved"
    );
    if let Some(live) = &settings.live_reload {
        info!(
            port = live.port,
            start_path = %live.start_path,
            open = live.open,
            "live-reload preview enabled; serve the output directory with your preview server"
        );
    }
    debug!(?settings, "full settings");
}

/// Dry-run output: resolved settings and every task.
fn print_dry_run(settings: &Settings, index: &RuntimeTaskIndex) {
    println!("mailbuild dry-run ({})", settings.build_env);
    println!("  source_dir = {}", settings.source_dir.display());
    println!("  output_dir = {}", settings.output_dir.display());
    println!("  locales = {:?}", settings.locales);
    println!(
        "  omit_default_locale_from_filename = {}",
        settings.omit_default_locale_from_filename
    );
    println!("  watch = {}", settings.watch_enabled);
    println!("  upload = {}", settings.upload);
    if let Some(storage) = &settings.storage {
        println!("  storage = {} ({})", storage.bucket, storage.region);
    }
    println!();

    println!("inputs ({}):", index.len());
    for path in index.paths() {
        println!("  - {}", path.display());
        for task in index.tasks_for(path).unwrap_or_default() {
            println!("      [{}] -> {}", task.locale, task.output_path.display());
        }
    }

    debug!("dry-run complete (nothing compiled)");
}

/// Compiled HTML outputs with a clickable preview link.
fn print_summary(summary: &RunSummary) {
    let outputs = summary.report.compiled_outputs();
    println!("Compiled {} email(s):", outputs.len());
    for output in outputs {
        println!("  file://{}", output.display());
    }
    for failed in summary.report.failed() {
        println!("  FAILED {} [{}]", failed.input_path.display(), failed.locale);
    }
}
