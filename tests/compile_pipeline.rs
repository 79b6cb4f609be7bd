mod common;

use std::sync::Arc;

use common::{SettingsBuilder, dist, read, src, workspace};
use mailbuild::compile::{Compiler, TaskCompiler, TaskStatus};
use mailbuild::config::Settings;
use mailbuild::fs::FileSystem;
use mailbuild::fs::mock::MockFileSystem;
use mailbuild::render::{PassthroughRenderer, TeraEngine, TemplateEngine};
use mailbuild::resolve::RuntimeTaskIndex;
use mailbuild::storage::MemoryObjectStore;
use mailbuild::{build_once, default_compiler};
use mailbuild_test_utils::recording::FailingEngine;
use mailbuild_test_utils::with_timeout;

fn compiler(
    fs: &Arc<MockFileSystem>,
    settings: &Arc<Settings>,
    templates: Arc<dyn TemplateEngine>,
) -> Compiler {
    let fs: Arc<dyn FileSystem> = fs.clone();
    Compiler::new(fs, Arc::clone(settings), templates, Arc::new(PassthroughRenderer))
}

#[tokio::test]
async fn builds_every_locale_and_copies_assets() {
    common::init_tracing();
    let fs = workspace(&[
        (
            "index.html",
            "<p>{{ t(values=[\"Hello\", \"Hola\"]) }} {{ locale }}</p>",
        ),
        ("logo.png", "PNG"),
    ]);
    let settings = common::settings(SettingsBuilder::new().locales(&["en", "es"]));
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(default_compiler(Arc::clone(&dyn_fs), Arc::clone(&settings)).unwrap());

    let summary = with_timeout(build_once(compiler, dyn_fs, settings, index))
        .await
        .unwrap();

    assert_eq!(summary.report.outcomes.len(), 3);
    assert_eq!(summary.report.failure_count(), 0);
    assert_eq!(read(fs.as_ref(), &dist("index.html")), "<p>Hello en</p>");
    assert_eq!(read(fs.as_ref(), &dist("index_es.html")), "<p>Hola es</p>");
    assert_eq!(read(fs.as_ref(), &dist("logo.png")), "PNG");
    assert_eq!(summary.report.compiled_outputs().len(), 2);
}

#[tokio::test]
async fn mjml_sources_compile_to_email_html() {
    let fs = workspace(&[(
        "welcome.mjml",
        "<mjml><mj-body><mj-section><mj-column><mj-text>{{ t(values=[\"Hi\", \"Hola\"]) }}</mj-text></mj-column></mj-section></mj-body></mjml>",
    )]);
    let settings = common::settings(SettingsBuilder::new().locales(&["en", "es"]));
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = default_compiler(dyn_fs, Arc::clone(&settings)).unwrap();

    let report = compiler.compile(index.all_tasks().cloned().collect()).await;

    assert_eq!(report.failure_count(), 0);
    let es = read(fs.as_ref(), &dist("welcome_es.html"));
    assert!(es.contains("<html"));
    assert!(es.contains("Hola"));
    assert!(!es.contains("<mj-text"));
}

#[tokio::test]
async fn templating_failure_falls_back_to_the_body() {
    let fs = workspace(&[("a.mjml", "---\nlocales: [en]\n---\n<mjml>{{ name }}</mjml>")]);
    let settings = common::settings(SettingsBuilder::new());
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();
    let tasks = index.tasks_for(&src("a.mjml")).unwrap().to_vec();

    let report = compiler(&fs, &settings, Arc::new(FailingEngine))
        .compile(tasks)
        .await;

    assert_eq!(report.outcomes[0].status, TaskStatus::Compiled);
    assert_eq!(read(fs.as_ref(), &dist("a.html")), "<mjml>{{ name }}</mjml>");
}

#[tokio::test]
async fn broken_template_syntax_is_not_fatal() {
    let fs = workspace(&[("a.mjml", "<mjml>{{ unclosed </mjml>")]);
    let settings = common::settings(SettingsBuilder::new());
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();

    let report = compiler(&fs, &settings, Arc::new(TeraEngine))
        .compile(index.all_tasks().cloned().collect())
        .await;

    assert_eq!(report.failure_count(), 0);
    assert_eq!(read(fs.as_ref(), &dist("a.html")), "<mjml>{{ unclosed </mjml>");
}

#[tokio::test]
async fn unreadable_input_fails_only_its_task() {
    let fs = workspace(&[("a.mjml", "<mjml/>"), ("b.mjml", "<mjml/>")]);
    let settings = common::settings(SettingsBuilder::new());
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();
    fs.remove_file(src("a.mjml"));

    let report = compiler(&fs, &settings, Arc::new(TeraEngine))
        .compile(index.all_tasks().cloned().collect())
        .await;

    assert_eq!(report.failure_count(), 1);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed[0].input_path, src("a.mjml"));
    assert!(matches!(failed[0].status, TaskStatus::Failed(_)));
    assert_eq!(read(fs.as_ref(), &dist("b.html")), "<mjml/>");
}

#[tokio::test]
async fn prod_builds_are_minified() {
    let fs = workspace(&[("a.mjml", "<mjml>\n  <!-- note -->\n  <mj-body>\n  </mj-body>\n</mjml>\n")]);
    let settings = common::settings(SettingsBuilder::new().prod());
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();

    compiler(&fs, &settings, Arc::new(TeraEngine))
        .compile(index.all_tasks().cloned().collect())
        .await;

    assert_eq!(
        read(fs.as_ref(), &dist("a.html")),
        "<mjml><mj-body></mj-body></mjml>"
    );
}

fn upload_fixture(force: bool) -> (Arc<MockFileSystem>, Arc<Settings>) {
    let fs = workspace(&[
        (
            "news/index.mjml",
            "<mjml><mj-image src=\"img/logo.png\" /><mj-image src=\"https://cdn.example.com/x.png\" /></mjml>",
        ),
        ("news/img/logo.png", "NEW"),
    ]);
    let mut builder = SettingsBuilder::new()
        .prod()
        .storage("mail-bucket", "eu-west-1")
        .upload()
        .input_files(&["src/**/*.mjml"]);
    if force {
        builder = builder.force();
    }
    (fs, common::settings(builder))
}

#[tokio::test]
async fn local_images_are_uploaded_and_rewritten() {
    let (fs, settings) = upload_fixture(false);
    let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let store = MemoryObjectStore::new(settings.storage.clone().unwrap(), Arc::clone(&dyn_fs));

    let report = compiler(&fs, &settings, Arc::new(TeraEngine))
        .with_store(Arc::new(store.clone()))
        .compile(index.all_tasks().cloned().collect())
        .await;

    assert_eq!(report.failure_count(), 0);
    let html = read(fs.as_ref(), &dist("news/index.html"));
    assert!(html.contains("src=\"https://mail-bucket.s3.eu-west-1.amazonaws.com/logo.png\""));
    assert!(html.contains("src=\"https://cdn.example.com/x.png\""));
    assert_eq!(store.keys(), vec!["index.html".to_string(), "logo.png".to_string()]);
    assert_eq!(store.get("logo.png"), Some(b"NEW".to_vec()));
}

#[tokio::test]
async fn existing_images_are_reused_unless_forced() {
    for (force, expected) in [(false, b"OLD".to_vec()), (true, b"NEW".to_vec())] {
        let (fs, settings) = upload_fixture(force);
        let index = RuntimeTaskIndex::build_full(fs.as_ref(), &settings).unwrap();
        let dyn_fs: Arc<dyn FileSystem> = fs.clone();
        let store = MemoryObjectStore::new(settings.storage.clone().unwrap(), dyn_fs);
        store.insert("logo.png", "OLD");

        compiler(&fs, &settings, Arc::new(TeraEngine))
            .with_store(Arc::new(store.clone()))
            .compile(index.all_tasks().cloned().collect())
            .await;

        assert_eq!(store.get("logo.png"), Some(expected), "force = {force}");
        let html = read(fs.as_ref(), &dist("news/index.html"));
        assert!(html.contains("amazonaws.com/logo.png"));
    }
}

#[tokio::test]
async fn welcome_page_lists_outputs_when_live_reload_is_on() {
    let fs = workspace(&[("index.mjml", "<mjml/>"), ("nested/promo.mjml", "<mjml/>")]);
    let settings = common::settings(
        SettingsBuilder::new()
            .locales(&["en", "es"])
            .live_reload(),
    );
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(default_compiler(Arc::clone(&dyn_fs), Arc::clone(&settings)).unwrap());

    with_timeout(build_once(compiler, dyn_fs, settings, index))
        .await
        .unwrap();

    let page = read(fs.as_ref(), &dist("__.html"));
    for file in [
        "index.html",
        "index_es.html",
        "nested/promo.html",
        "nested/promo_es.html",
    ] {
        let escaped = file.replace('/', "&#x2F;");
        assert!(page.contains(&format!("<a href=\"{escaped}\">")), "missing {file}");
    }
    assert!(page.contains("Locales: en, es"));
}
