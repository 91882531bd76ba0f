use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use storybook_logging::{story_debug, story_info, story_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::artifact::ArtifactStore;
use crate::payload::ResponsePayload;
use crate::persist::PersistError;
use crate::submit::{FormSubmitter, ReqwestSubmitter, SubmitSettings};
use crate::{
    ArtifactId, EngineEvent, FailureKind, FormRequest, SubmissionId, SubmissionResult, SubmitError,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub submit: SubmitSettings,
    /// Where downloaded stories are saved.
    pub download_dir: PathBuf,
}

impl EngineConfig {
    pub fn default_with_download_dir(download_dir: PathBuf) -> Self {
        Self {
            submit: SubmitSettings::default(),
            download_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to prepare artifact store: {0}")]
    Artifacts(#[from] PersistError),
    #[error("failed to build http client: {0}")]
    Client(#[from] SubmitError),
    #[error("engine worker stopped")]
    Stopped,
}

enum EngineCommand {
    Submit {
        submission_id: SubmissionId,
        request: FormRequest,
    },
    Cancel {
        submission_id: SubmissionId,
    },
    Revoke {
        artifact_id: ArtifactId,
    },
    Save {
        artifact_id: ArtifactId,
        file_name: String,
    },
}

type PendingMap = Arc<Mutex<HashMap<SubmissionId, CancellationToken>>>;

/// Runs submissions on a background tokio runtime and reports back through
/// [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
    artifacts: Arc<ArtifactStore>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let submitter = ReqwestSubmitter::new(config.submit.clone())?;
        Self::with_submitter(config, Arc::new(submitter))
    }

    /// Build an engine around any submitter; used to swap the HTTP layer out.
    pub fn with_submitter(
        config: EngineConfig,
        submitter: Arc<dyn FormSubmitter>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("storybook-engine")
            .build()?;
        let artifacts = Arc::new(ArtifactStore::new()?);
        story_info!("Artifact scratch directory: {:?}", artifacts.root());

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Worker {
            submitter,
            artifacts: artifacts.clone(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            download_dir: config.download_dir,
            event_tx,
        };

        let join = thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(&runtime, command);
            }
            story_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
            artifacts,
            worker: Some(join),
        })
    }

    pub fn submit(&self, submission_id: SubmissionId, request: FormRequest) {
        self.send(EngineCommand::Submit {
            submission_id,
            request,
        });
    }

    pub fn cancel(&self, submission_id: SubmissionId) {
        self.send(EngineCommand::Cancel { submission_id });
    }

    pub fn revoke(&self, artifact_id: ArtifactId) {
        self.send(EngineCommand::Revoke { artifact_id });
    }

    pub fn save(&self, artifact_id: ArtifactId, file_name: impl Into<String>) {
        self.send(EngineCommand::Save {
            artifact_id,
            file_name: file_name.into(),
        });
    }

    /// Next pending event, if any. Fails once the worker has gone away and
    /// no further events can arrive.
    pub fn try_recv(&self) -> Result<Option<EngineEvent>, EngineError> {
        match self
            .event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv()
        {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            story_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    /// Drains queued commands (pending revokes included) before the scratch
    /// directory goes away.
    fn drop(&mut self) {
        let (closed_tx, _) = mpsc::channel();
        drop(std::mem::replace(&mut self.cmd_tx, closed_tx));
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                story_warn!("Engine worker panicked during shutdown");
            }
        }
    }
}

struct Worker {
    submitter: Arc<dyn FormSubmitter>,
    artifacts: Arc<ArtifactStore>,
    pending: PendingMap,
    download_dir: PathBuf,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn handle(&self, runtime: &tokio::runtime::Runtime, command: EngineCommand) {
        match command {
            EngineCommand::Submit {
                submission_id,
                request,
            } => {
                let token = CancellationToken::new();
                lock_pending(&self.pending).insert(submission_id, token.clone());
                let submitter = self.submitter.clone();
                let artifacts = self.artifacts.clone();
                let pending = self.pending.clone();
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = tokio::select! {
                        () = token.cancelled() => Err(SubmitError::new(
                            FailureKind::Cancelled,
                            "superseded by a newer submission",
                        )),
                        result = submitter.submit(&request) => {
                            result.and_then(|payload| materialize(&artifacts, payload))
                        }
                    };
                    lock_pending(&pending).remove(&submission_id);
                    let _ = event_tx.send(EngineEvent::SubmissionCompleted {
                        submission_id,
                        result,
                    });
                });
            }
            EngineCommand::Cancel { submission_id } => {
                if let Some(token) = lock_pending(&self.pending).remove(&submission_id) {
                    story_debug!("Cancelling submission {}", submission_id);
                    token.cancel();
                }
            }
            EngineCommand::Revoke { artifact_id } => {
                if !self.artifacts.revoke(artifact_id) {
                    story_debug!("Artifact {} was already released", artifact_id);
                }
            }
            EngineCommand::Save {
                artifact_id,
                file_name,
            } => {
                let result = self
                    .artifacts
                    .save_as(artifact_id, &self.download_dir, &file_name)
                    .map_err(|err| err.to_string());
                let _ = self.event_tx.send(EngineEvent::DownloadSaved {
                    artifact_id,
                    result,
                });
            }
        }
    }
}

fn materialize(
    artifacts: &ArtifactStore,
    payload: ResponsePayload,
) -> Result<SubmissionResult, SubmitError> {
    match payload {
        ResponsePayload::Page { html_content } => artifacts
            .create(&html_content)
            .map(SubmissionResult::Page)
            .map_err(|err| SubmitError::new(FailureKind::Storage, err.to_string())),
        ResponsePayload::Story {
            composite_story,
            illustrations,
        } => Ok(SubmissionResult::Story {
            composite_story,
            illustrations,
        }),
    }
}

fn lock_pending(
    pending: &PendingMap,
) -> std::sync::MutexGuard<'_, HashMap<SubmissionId, CancellationToken>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
