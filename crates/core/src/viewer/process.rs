//! Viewer backed by an external annotation engine process.
//!
//! The document is staged inside the mount directory. Annotation export and
//! re-serialization are delegated to the configured engine program, one
//! process per call, each call using its own temporary files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, RwLock as StdRwLock};

use async_trait::async_trait;
use tempfile::{Builder, NamedTempFile, TempPath};
use tokio::process::Command;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::config::EngineConfig;
use crate::document::{DocumentExtension, DocumentHandle};

use super::{
    AnnotationExport, HeaderItem, MountPoint, UiElement, Viewer, ViewerError, ViewerEvent,
    ViewerFactory, ViewerUiState,
};

const EVENT_CAPACITY: usize = 16;

/// Creates [`ProcessViewer`]s.
pub struct ProcessViewerFactory {
    engine: EngineConfig,
}

impl ProcessViewerFactory {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ViewerFactory for ProcessViewerFactory {
    async fn create(&self, mount: &MountPoint) -> Result<Arc<dyn Viewer>, ViewerError> {
        tokio::fs::create_dir_all(mount.dir()).await?;
        Ok(Arc::new(ProcessViewer::new(self.engine.clone(), mount.clone())))
    }
}

#[derive(Debug, Clone)]
struct StagedDocument {
    path: PathBuf,
    extension: DocumentExtension,
}

/// Viewer that drives an external engine program.
pub struct ProcessViewer {
    engine: EngineConfig,
    mount: MountPoint,
    staged: RwLock<Option<StagedDocument>>,
    events: broadcast::Sender<ViewerEvent>,
    ui: StdRwLock<ViewerUiState>,
}

impl ProcessViewer {
    pub fn new(engine: EngineConfig, mount: MountPoint) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            mount,
            staged: RwLock::new(None),
            events,
            ui: StdRwLock::new(ViewerUiState::default()),
        }
    }

    async fn staged(&self) -> Result<StagedDocument, ViewerError> {
        self.staged
            .read()
            .await
            .clone()
            .ok_or(ViewerError::NoDocument)
    }

    fn update_ui(&self, f: impl FnOnce(&mut ViewerUiState)) {
        let mut guard = match self.ui.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }

    /// Run the engine with the given argument template.
    async fn run_engine(
        &self,
        template: &[String],
        vars: &[(&str, &Path)],
    ) -> Result<Vec<u8>, ViewerError> {
        let args = render_args(template, vars);
        debug!(program = %self.engine.program.display(), ?args, "Running viewer engine");

        let mut command = Command::new(&self.engine.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let secs = self.engine.timeout_secs;
        let output = match timeout(Duration::from_secs(secs), command.output()).await {
            Err(_) => return Err(ViewerError::Timeout { secs }),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(ViewerError::EngineNotFound {
                    path: self.engine.program.clone(),
                })
            }
            Ok(Err(e)) => return Err(ViewerError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ViewerError::EngineFailed {
                code: output.status.code(),
                stderr: stderr.trim().chars().take(500).collect(),
            });
        }

        Ok(output.stdout)
    }
}

/// Substitute `{name}` placeholders inside every argument.
fn render_args(template: &[String], vars: &[(&str, &Path)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{}}}", name), &value.to_string_lossy())
            })
        })
        .collect()
}

/// Empty per-call file inside `dir`, deleted when the returned path is dropped.
fn temp_path_in(dir: &Path, suffix: &str) -> Result<TempPath, ViewerError> {
    Builder::new()
        .prefix("redline-")
        .suffix(suffix)
        .tempfile_in(dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(ViewerError::Io)
}

#[async_trait]
impl Viewer for ProcessViewer {
    fn name(&self) -> &str {
        "process"
    }

    async fn load_document(&self, document: DocumentHandle) -> Result<(), ViewerError> {
        if document.is_empty() {
            return Err(ViewerError::EmptyDocument);
        }

        let path = self
            .mount
            .dir()
            .join(format!("document.{}", document.extension));
        tokio::fs::write(&path, &document.bytes).await?;

        *self.staged.write().await = Some(StagedDocument {
            path,
            extension: document.extension,
        });

        let _ = self.events.send(ViewerEvent::DocumentLoaded);
        let _ = self.events.send(ViewerEvent::AnnotationsLoaded);
        Ok(())
    }

    async fn disable_elements(&self, elements: &[UiElement]) -> Result<(), ViewerError> {
        self.update_ui(|ui| {
            for element in elements {
                if !ui.disabled_elements.contains(element) {
                    ui.disabled_elements.push(element.clone());
                }
            }
        });
        Ok(())
    }

    async fn set_header_items(&self, items: Vec<HeaderItem>) -> Result<(), ViewerError> {
        self.update_ui(|ui| ui.header_items = items);
        Ok(())
    }

    async fn export_annotations(&self) -> Result<AnnotationExport, ViewerError> {
        let staged = self.staged().await?;
        let stdout = self
            .run_engine(
                &self.engine.export_args,
                &[
                    ("lib", self.mount.library_path()),
                    ("input", staged.path.as_path()),
                ],
            )
            .await?;

        let xfdf = String::from_utf8(stdout)
            .map_err(|e| ViewerError::InvalidOutput(format!("XFDF is not UTF-8: {}", e)))?;
        Ok(AnnotationExport::new(xfdf))
    }

    async fn file_data(&self, annotations: &AnnotationExport) -> Result<Vec<u8>, ViewerError> {
        let staged = self.staged().await?;
        let xfdf_path = temp_path_in(self.mount.dir(), ".xfdf")?;
        let output_path =
            temp_path_in(self.mount.dir(), &format!(".out.{}", staged.extension))?;

        tokio::fs::write(&xfdf_path, annotations.as_str()).await?;
        self.run_engine(
            &self.engine.merge_args,
            &[
                ("lib", self.mount.library_path()),
                ("input", staged.path.as_path()),
                ("xfdf", &*xfdf_path),
                ("output", &*output_path),
            ],
        )
        .await?;
        let bytes = tokio::fs::read(&output_path).await?;
        if bytes.is_empty() {
            return Err(ViewerError::InvalidOutput(
                "engine produced an empty file".to_string(),
            ));
        }
        Ok(bytes)
    }

    fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }

    fn ui_state(&self) -> ViewerUiState {
        match self.ui.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
