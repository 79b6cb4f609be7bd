mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{SettingsBuilder, src, workspace};
use mailbuild::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use mailbuild::fs::FileSystem;
use mailbuild::fs::mock::MockFileSystem;
use mailbuild::resolve::RuntimeTaskIndex;
use mailbuild_test_utils::recording::{Recorded, RecordingCompiler};
use mailbuild_test_utils::with_timeout;
use tokio::sync::mpsc;

async fn wait_for_finished(compiler: &RecordingCompiler, n: usize) {
    with_timeout(async {
        while compiler.finished().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

fn count(compiler: &RecordingCompiler, label: &str) -> usize {
    compiler.finished().iter().filter(|l| *l == label).count()
}

#[tokio::test]
async fn work_on_one_input_never_overlaps() {
    common::init_tracing();
    let fs = workspace(&[("a.mjml", "<mjml/>"), ("b.mjml", "<mjml/>")]);
    let settings = common::settings(SettingsBuilder::new());
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(RecordingCompiler::with_delay(Duration::from_millis(20)));

    let (tx, rx) = mpsc::channel(16);
    tx.send(RuntimeEvent::Ready).await.unwrap();
    tx.send(RuntimeEvent::Changed(src("a.mjml"))).await.unwrap();
    tx.send(RuntimeEvent::Changed(src("a.mjml"))).await.unwrap();
    drop(tx);

    let options = RuntimeOptions {
        skip_unchanged: false,
        exit_when_idle: true,
    };
    let runtime = Runtime::new(Arc::clone(&compiler), dyn_fs, settings, index, rx, options);
    let summary = with_timeout(runtime.run()).await.unwrap();

    assert_eq!(count(&compiler, "a.mjml#en"), 3);
    assert_eq!(count(&compiler, "b.mjml#en"), 1);
    assert_eq!(summary.report.outcomes.len(), 4);

    let mut open = false;
    for entry in compiler.log() {
        match entry {
            Recorded::Start(l) if l == "a.mjml#en" => {
                assert!(!open, "a.mjml compiled concurrently");
                open = true;
            }
            Recorded::End(l) if l == "a.mjml#en" => open = false,
            _ => {}
        }
    }
}

#[tokio::test]
async fn unchanged_content_is_not_recompiled() {
    let fs = workspace(&[("a.mjml", "<mjml/>"), ("b.mjml", "<mjml/>")]);
    let settings = common::settings(SettingsBuilder::new());
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(RecordingCompiler::new());

    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(
        Arc::clone(&compiler),
        dyn_fs,
        settings,
        index,
        rx,
        RuntimeOptions::default(),
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(RuntimeEvent::Ready).await.unwrap();
    wait_for_finished(&compiler, 2).await;

    tx.send(RuntimeEvent::Changed(src("a.mjml"))).await.unwrap();
    fs.add_file(src("a.mjml"), "<mjml><mj-body/></mjml>");
    tx.send(RuntimeEvent::Changed(src("a.mjml"))).await.unwrap();
    wait_for_finished(&compiler, 3).await;

    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    with_timeout(handle).await.unwrap().unwrap();

    // Two change events, one real content change.
    assert_eq!(count(&compiler, "a.mjml#en"), 2);
    assert_eq!(count(&compiler, "b.mjml#en"), 1);
}

#[tokio::test]
async fn new_input_rebuilds_the_whole_index() {
    let fs = workspace(&[("a.mjml", "<mjml/>")]);
    let settings = common::settings(SettingsBuilder::new().locales(&["en", "es"]));
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(RecordingCompiler::new());

    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(
        Arc::clone(&compiler),
        dyn_fs,
        settings,
        index,
        rx,
        RuntimeOptions::default(),
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(RuntimeEvent::Ready).await.unwrap();
    wait_for_finished(&compiler, 2).await;

    fs.add_file(src("c.mjml"), "---\nlocales: [fr]\n---\n<mjml/>");
    tx.send(RuntimeEvent::Added(src("c.mjml"))).await.unwrap();
    wait_for_finished(&compiler, 3).await;

    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let summary = with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(count(&compiler, "c.mjml#fr"), 1);
    assert_eq!(count(&compiler, "a.mjml#en"), 1);
    assert!(summary.index.contains(&src("c.mjml")));
    assert!(compiler.log().contains(&Recorded::IndexUpdated(3)));
}

#[tokio::test]
async fn removed_inputs_keep_their_entry() {
    let fs = workspace(&[("a.mjml", "<mjml/>")]);
    let settings = common::settings(SettingsBuilder::new());
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(RecordingCompiler::new());

    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(
        Arc::clone(&compiler),
        dyn_fs,
        settings,
        index,
        rx,
        RuntimeOptions::default(),
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(RuntimeEvent::Ready).await.unwrap();
    wait_for_finished(&compiler, 1).await;
    fs.remove_file(src("a.mjml"));
    tx.send(RuntimeEvent::Removed(src("a.mjml"))).await.unwrap();
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let summary = with_timeout(handle).await.unwrap().unwrap();
    assert!(summary.index.contains(&src("a.mjml")));
    assert_eq!(compiler.finished().len(), 1);
}

/// Filesystem whose next read of one file returns what was there, but only
/// after a pause. Lets a test change the file while a reader is mid-flight.
#[derive(Debug)]
struct SlowReadFs {
    inner: Arc<MockFileSystem>,
    slow_path: PathBuf,
    armed: AtomicBool,
}

impl FileSystem for SlowReadFs {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        let content = self.inner.read_to_string(path)?;
        if path == self.slow_path && self.armed.swap(false, Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(150));
        }
        Ok(content)
    }
    fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        self.inner.read(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.write(path, contents)
    }
    fn copy(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.inner.copy(from, to)
    }
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
    fn canonicalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.inner.canonicalize(path)
    }
    fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.create_dir_all(path)
    }
    fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.remove_dir_all(path)
    }
    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edit_during_full_rebuild_is_kept() {
    let mock = workspace(&[("a.mjml", "<mjml/>"), ("b.mjml", "<mjml/>")]);
    let fs = Arc::new(SlowReadFs {
        inner: Arc::clone(&mock),
        slow_path: src("a.mjml"),
        armed: AtomicBool::new(false),
    });
    let settings = common::settings(SettingsBuilder::new());
    let dyn_fs: Arc<dyn FileSystem> = fs.clone();
    let index = RuntimeTaskIndex::build_full(dyn_fs.as_ref(), &settings).unwrap();
    let compiler = Arc::new(RecordingCompiler::new());

    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(
        Arc::clone(&compiler),
        dyn_fs,
        settings,
        index,
        rx,
        RuntimeOptions::default(),
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(RuntimeEvent::Ready).await.unwrap();
    wait_for_finished(&compiler, 2).await;

    // The full rebuild for c stalls on its read of a.
    fs.armed.store(true, Ordering::SeqCst);
    mock.add_file(src("c.mjml"), "<mjml/>");
    tx.send(RuntimeEvent::Added(src("c.mjml"))).await.unwrap();
    with_timeout(async {
        while fs.armed.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;

    mock.add_file(src("a.mjml"), "---\nlocales: [it]\n---\n<mjml/>");
    tx.send(RuntimeEvent::Changed(src("a.mjml"))).await.unwrap();
    with_timeout(async {
        while count(&compiler, "a.mjml#it") == 0 || count(&compiler, "c.mjml#en") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let summary = with_timeout(handle).await.unwrap().unwrap();

    let tasks = summary.index.tasks_for(&src("a.mjml")).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].locale, "it");
    assert!(summary.index.contains(&src("c.mjml")));
}
