#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use scanindex_rs::index::{
    AcceptAll, ExclusionFilter, FileMetadata, IndexedFile, MetadataGenerator, ProgressReporter,
};
use scanindex_rs::{IndexerConfig, MetadataError, ModuleContext, ProjectContext};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a debug-level subscriber on the current thread and return
/// what it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

/// A project tree on disk.
pub struct TestTree {
    dir: TempDir,
    root: PathBuf,
}

impl TestTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file (creating parents) and return its absolute path
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn project(&self, scope: Arc<dyn ExclusionFilter>) -> ProjectContext {
        ProjectContext::new("project", &self.root, scope).unwrap()
    }

    pub fn open_project(&self) -> ProjectContext {
        self.project(Arc::new(AcceptAll))
    }

    /// Project with one root module sharing the project scope
    pub fn single_module(&self) -> (Arc<ProjectContext>, Arc<ModuleContext>) {
        let mut project = self.open_project();
        let module = ModuleContext::builder("project", &self.root).build(&project).unwrap();
        let module = project.add_module(module);
        (Arc::new(project), module)
    }
}

/// Languages: `xoo` only
pub fn xoo_config() -> IndexerConfig {
    IndexerConfig::default()
        .without_languages()
        .with_language("xoo", ["xoo"])
}

/// Progress reporter keeping every message
#[derive(Default)]
pub struct RecordingProgress(Mutex<Vec<String>>);

impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn message(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

/// Metadata generator counting its invocations
#[derive(Default)]
pub struct CountingGenerator {
    pub calls: std::sync::atomic::AtomicUsize,
}

impl MetadataGenerator for CountingGenerator {
    fn generate(
        &self,
        module_key_with_branch: &str,
        file: &IndexedFile,
        encoding: &str,
    ) -> Result<FileMetadata, MetadataError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(FileMetadata {
            charset: encoding.to_string(),
            hash: format!("{module_key_with_branch}:{}", file.project_relative_path()),
            lines: 1,
            line_start_offsets: vec![0],
            last_valid_offset: 0,
            empty: true,
        })
    }
}
