//! Recording session controller
//!
//! A [`Session`] exclusively owns the codegen process and the artifact
//! watcher and releases both on every terminal transition. All state changes
//! happen on the task driving the session; the code buffer has one writer
//! (the change path) and is read by the observer, `stop` and `finish`.

use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use uirec_common::persist;
use uirec_common::{
    CredentialStore, Error, ExtensionClient, Prompter, RecorderConfig, Result, ScriptTransformer,
    TransformedScript,
};

use crate::codegen::{CodegenOptions, CodegenProcess};
use crate::editor::{self, EditOutcome};
use crate::watcher::ArtifactWatcher;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    Stopped,
    Prompt,
    Save,
    Edit,
    Extend,
    Done,
}

/// Remote extension collaborators
#[derive(Clone, Copy)]
pub struct Extension<'a> {
    pub client: &'a ExtensionClient,
    pub store: &'a CredentialStore,
}

/// Inputs to the post-recording sequence
#[derive(Default)]
pub struct FinishOptions<'a> {
    /// Name offered when the filename prompt is answered empty
    pub default_name: Option<String>,

    /// Extension step; `None` skips it
    pub extension: Option<Extension<'a>>,
}

/// How the extension step ended
#[derive(Debug)]
pub enum ExtendOutcome {
    Skipped,
    Extended,
    /// The saved script is unchanged
    Failed(Error),
}

/// Result of the post-recording sequence
#[derive(Debug)]
pub struct FinishedRecording {
    pub path: PathBuf,
    pub edit: EditOutcome,
    pub extension: ExtendOutcome,
}

enum SessionEvent {
    Changed(String),
    Exited(std::io::Result<ExitStatus>),
}

/// One recording session
pub struct Session {
    config: RecorderConfig,
    transformer: ScriptTransformer,
    phase: Phase,
    process: Option<CodegenProcess>,
    watcher: Option<ArtifactWatcher>,
    changes: Option<mpsc::Receiver<String>>,
    raw: String,
    transformed: Option<TransformedScript>,
    observer: Option<mpsc::UnboundedSender<TransformedScript>>,
}

impl Session {
    pub fn new(config: RecorderConfig, transformer: ScriptTransformer) -> Self {
        Self {
            config,
            transformer,
            phase: Phase::Idle,
            process: None,
            watcher: None,
            changes: None,
            raw: String::new(),
            transformed: None,
            observer: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.process.is_some()
    }

    /// Last transformed code, empty before the first change
    pub fn code(&self) -> &str {
        self.transformed
            .as_ref()
            .map(|t| t.code.as_str())
            .unwrap_or_default()
    }

    /// Subscribe to transformed code. Only the latest subscriber receives
    /// updates; the channel closes once the recording stops.
    pub fn on_update(&mut self) -> mpsc::UnboundedReceiver<TransformedScript> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }

    /// Launch codegen and start watching its artifact.
    ///
    /// Resolves after the configured settle delay. On launch failure the
    /// session stays idle and no watcher is started.
    pub async fn start(&mut self, options: &CodegenOptions) -> Result<()> {
        if self.process.is_some() {
            return Err(Error::SessionState("a recording is already running".to_string()));
        }

        std::fs::create_dir_all(&self.config.recordings_dir)?;
        let artifact = self.config.artifact_path();
        match std::fs::remove_file(&artifact) {
            Ok(()) => debug!("Removed stale artifact {}", artifact.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.raw.clear();
        self.transformed = None;

        let process = CodegenProcess::spawn(&self.config.codegen, options, &artifact)?;
        self.process = Some(process);

        let (watcher, changes) = ArtifactWatcher::spawn(artifact, self.config.poll_interval());
        self.watcher = Some(watcher);
        self.changes = Some(changes);
        self.phase = Phase::Recording;

        tokio::time::sleep(self.config.settle_delay()).await;
        Ok(())
    }

    /// Process changes until codegen exits.
    ///
    /// The watcher and the update channel are torn down before this returns,
    /// so no change is handled after the exit.
    pub async fn wait_for_exit(&mut self) -> Result<ExitStatus> {
        loop {
            let Some(process) = self.process.as_mut() else {
                return Err(Error::SessionState("no recording is running".to_string()));
            };

            let event = tokio::select! {
                biased;
                Some(raw) = next_change(self.changes.as_mut()) => SessionEvent::Changed(raw),
                status = process.wait() => SessionEvent::Exited(status),
            };

            match event {
                SessionEvent::Changed(raw) => self.handle_change(raw),
                SessionEvent::Exited(status) => {
                    let program = self
                        .process
                        .take()
                        .map(|process| process.program().to_string())
                        .unwrap_or_default();
                    self.close_watcher();
                    self.phase = Phase::Stopped;
                    let status = status?;
                    info!("{} exited ({})", program, status);
                    return Ok(status);
                }
            }
        }
    }

    /// Kill codegen, close the watcher and return the best available code.
    ///
    /// Safe to call repeatedly and never prompts.
    pub fn stop(&mut self) -> String {
        if let Some(mut process) = self.process.take() {
            process.kill();
        }
        self.close_watcher();
        if self.phase == Phase::Recording {
            self.phase = Phase::Stopped;
        }
        self.final_code()
    }

    /// Buffered code, or the transformed on-disk artifact when it has moved
    /// past the buffer
    pub fn final_code(&self) -> String {
        match std::fs::read_to_string(self.config.artifact_path()) {
            Ok(raw) if !raw.trim().is_empty() && raw != self.raw => {
                debug!("Buffer is stale, using artifact on disk");
                self.transformer.transform(&raw).code
            }
            _ => self.code().to_string(),
        }
    }

    /// Prompt for a name, save, edit and optionally extend.
    ///
    /// Returns `None` when nothing was recorded.
    pub async fn finish(
        &mut self,
        prompter: &mut dyn Prompter,
        options: FinishOptions<'_>,
    ) -> Result<Option<FinishedRecording>> {
        if self.process.is_some() {
            return Err(Error::SessionState("recording is still running".to_string()));
        }

        let code = self.final_code();
        if code.trim().is_empty() {
            info!("Nothing was recorded");
            self.phase = Phase::Done;
            return Ok(None);
        }

        self.phase = Phase::Prompt;
        let default_name = options
            .default_name
            .unwrap_or_else(persist::default_script_name);
        let answer = prompter
            .ask(&format!("Save recording as [{}]:", default_name))
            .await?;
        let name = if answer.is_empty() { default_name } else { answer };

        self.phase = Phase::Save;
        let path = persist::save_script(&self.config.recordings_dir, &name, &code)?;

        self.phase = Phase::Edit;
        let edit = editor::open_in_editor(&path, &self.config.editors).await;

        let extension = match (&edit, options.extension) {
            (EditOutcome::Clean { .. }, Some(ext)) => {
                self.phase = Phase::Extend;
                match ext.client.extend_file(&path, ext.store, prompter).await {
                    Ok(()) => ExtendOutcome::Extended,
                    Err(e) => {
                        warn!("Extension failed, keeping {}: {}", path.display(), e);
                        ExtendOutcome::Failed(e)
                    }
                }
            }
            _ => ExtendOutcome::Skipped,
        };

        self.phase = Phase::Done;
        Ok(Some(FinishedRecording {
            path,
            edit,
            extension,
        }))
    }

    fn handle_change(&mut self, raw: String) {
        let transformed = self.transformer.transform(&raw);
        self.raw = raw;

        let delivered = self
            .observer
            .as_ref()
            .map(|observer| observer.send(transformed.clone()).is_ok());
        if delivered == Some(false) {
            debug!("Update observer went away");
            self.observer = None;
        }

        self.transformed = Some(transformed);
    }

    fn close_watcher(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.close();
        }
        self.changes = None;
        self.observer = None;
    }
}

async fn next_change(changes: Option<&mut mpsc::Receiver<String>>) -> Option<String> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
