// src/compile/pipeline.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::assets;
use super::{BoxFuture, CompileReport, TaskCompiler, TaskOutcome, TaskStatus};
use crate::config::Settings;
use crate::fs::FileSystem;
use crate::render::{MarkupOptions, MarkupRenderer, TemplateEngine};
use crate::resolve::{RuntimeTaskIndex, Task, frontmatter};
use crate::storage::ObjectStore;
use crate::types::{BuildEnv, InputKind};
use crate::welcome;

/// The production compile pipeline.
///
/// Template tasks: read → strip front matter → templating → image upload
/// and rewrite → markup render → write → upload output. Asset tasks are
/// copied. Each stage that fails in a recoverable way falls back to its
/// input; a task only fails when its input can't be read or its output
/// can't be written.
#[derive(Debug, Clone)]
pub struct Compiler {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    templates: Arc<dyn TemplateEngine>,
    markup: Arc<dyn MarkupRenderer>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl Compiler {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        settings: Arc<Settings>,
        templates: Arc<dyn TemplateEngine>,
        markup: Arc<dyn MarkupRenderer>,
    ) -> Self {
        Self {
            fs,
            settings,
            templates,
            markup,
            store: None,
        }
    }

    /// Upload images and outputs to `store`. Only used when uploads are on.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn compile_task(&self, task: &Task) -> TaskOutcome {
        let result = match task.input_kind {
            InputKind::Asset => self.copy_asset(task).map(|()| TaskStatus::Copied),
            InputKind::Template => self.compile_template(task).await.map(|()| TaskStatus::Compiled),
        };

        let status = match result {
            Ok(status) => {
                info!(
                    input = %task.input_path.display(),
                    output = %task.output_path.display(),
                    locale = %task.locale,
                    "compiled"
                );
                status
            }
            Err(e) => {
                error!(
                    input = %task.input_path.display(),
                    locale = %task.locale,
                    error = %format!("{e:#}"),
                    "compile failed"
                );
                TaskStatus::Failed(format!("{e:#}"))
            }
        };

        TaskOutcome {
            input_path: task.input_path.clone(),
            output_path: task.output_path.clone(),
            locale: task.locale.clone(),
            status,
        }
    }

    fn copy_asset(&self, task: &Task) -> Result<()> {
        self.fs.copy(&task.input_path, &task.output_path)
    }

    async fn compile_template(&self, task: &Task) -> Result<()> {
        let contents = self
            .fs
            .read_to_string(&task.input_path)
            .context("reading template")?;
        let body = frontmatter::body(&contents);

        let templated = match self.templates.render(body, task) {
            Ok(out) => out,
            Err(e) => {
                warn!(
                    input = %task.input_path.display(),
                    locale = %task.locale,
                    error = %format!("{e:#}"),
                    "templating failed, using raw content"
                );
                body.to_string()
            }
        };

        let upload_target = self.store.as_deref().filter(|_| self.settings.upload);
        let templated = match upload_target {
            Some(store) => {
                assets::upload_and_rewrite(
                    self.fs.as_ref(),
                    store,
                    self.settings.force_upload,
                    &task.input_path,
                    templated,
                )
                .await
            }
            None => {
                assets::warn_missing_images(self.fs.as_ref(), &task.input_path, &templated);
                templated
            }
        };

        let opts = MarkupOptions {
            minify: self.settings.build_env == BuildEnv::Prod,
            source_path: task.input_path.clone(),
        };
        let html = match self.markup.render(&templated, &opts) {
            Ok(html) => html,
            Err(e) => {
                warn!(
                    input = %task.input_path.display(),
                    error = %format!("{e:#}"),
                    "markup render failed, writing templated content"
                );
                templated
            }
        };

        self.fs
            .write(&task.output_path, html.as_bytes())
            .context("writing output")?;

        if let Some(store) = upload_target {
            match store.upload(&task.output_path).await {
                Ok(url) => debug!(output = %task.output_path.display(), url = %url, "uploaded"),
                Err(e) => warn!(
                    output = %task.output_path.display(),
                    error = %format!("{e:#}"),
                    "upload failed"
                ),
            }
        }

        Ok(())
    }
}

impl TaskCompiler for Compiler {
    fn compile<'a>(&'a self, tasks: Vec<Task>) -> BoxFuture<'a, CompileReport> {
        Box::pin(async move {
            let mut report = CompileReport::default();
            for task in &tasks {
                report.outcomes.push(self.compile_task(task).await);
            }
            report
        })
    }

    fn index_updated<'a>(&'a self, index: &'a RuntimeTaskIndex) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if self.settings.live_reload.is_none() {
                return;
            }
            if let Err(e) = welcome::write_welcome_page(self.fs.as_ref(), &self.settings, index) {
                warn!(error = %format!("{e:#}"), "cannot write welcome page");
            }
        })
    }
}
