use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use storybook_core::{ArtifactRef, Effect, FailureKind, FormSubmission, Msg, SubmissionOutcome};
use storybook_engine::{
    EngineConfig, EngineError, EngineEvent, EngineHandle, FormField, FormRequest,
    SubmissionResult, SubmitError,
};
use storybook_logging::{story_debug, story_error, story_info, story_warn};

pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    stop: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let mut runner = Self {
            engine: Arc::new(EngineHandle::new(config)?),
            stop: Arc::new(AtomicBool::new(false)),
            event_loop: None,
        };
        runner.event_loop = Some(runner.spawn_event_loop(msg_tx));
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PostForm {
                    submission_id,
                    submission,
                } => {
                    story_info!(
                        "PostForm submission_id={} action={} fields={}",
                        submission_id,
                        submission.action,
                        submission.fields.len()
                    );
                    self.engine.submit(submission_id, to_request(submission));
                }
                Effect::CancelSubmission { submission_id } => {
                    story_info!("CancelSubmission submission_id={}", submission_id);
                    self.engine.cancel(submission_id);
                }
                Effect::RevokeArtifact { artifact_id } => {
                    story_debug!("RevokeArtifact artifact_id={}", artifact_id);
                    self.engine.revoke(artifact_id);
                }
                Effect::SaveArtifact {
                    artifact_id,
                    file_name,
                } => {
                    story_info!("SaveArtifact artifact_id={} file={}", artifact_id, file_name);
                    self.engine.save(artifact_id, file_name);
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let stop = self.stop.clone();
        thread::spawn(move || forward_events(|| engine.try_recv(), &stop, msg_tx))
    }
}

/// Forwards engine events as messages until stopped, the inbox goes away, or
/// the engine stops. Returning drops `msg_tx`, which ends any wait on the inbox.
fn forward_events(
    poll: impl Fn() -> Result<Option<EngineEvent>, EngineError>,
    stop: &AtomicBool,
    msg_tx: mpsc::Sender<Msg>,
) {
    while !stop.load(Ordering::Relaxed) {
        match poll() {
            Ok(Some(event)) => {
                if msg_tx.send(map_event(event)).is_err() {
                    break;
                }
            }
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(err) => {
                story_error!("Engine event loop ended: {}", err);
                break;
            }
        }
    }
}

impl Drop for EffectRunner {
    /// Stops forwarding, then lets the engine drain its queue (pending
    /// revokes included) before the process moves on.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(event_loop) = self.event_loop.take() {
            if event_loop.join().is_err() {
                story_warn!("Engine event loop panicked");
            }
        }
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmissionCompleted {
            submission_id,
            result,
        } => {
            if let Err(err) = &result {
                if matches!(err.kind, storybook_engine::FailureKind::Cancelled) {
                    story_debug!("Submission {} cancelled", submission_id);
                } else {
                    story_error!("Submission {} failed: {}", submission_id, err);
                }
            }
            Msg::SubmissionResolved {
                submission_id,
                outcome: map_outcome(result),
            }
        }
        EngineEvent::DownloadSaved {
            artifact_id,
            result,
        } => {
            match &result {
                Ok(path) => story_info!("Saved artifact {} to {:?}", artifact_id, path),
                Err(message) => story_warn!("Saving artifact {} failed: {}", artifact_id, message),
            }
            Msg::DownloadFinished {
                artifact_id,
                result,
            }
        }
    }
}

fn map_outcome(result: Result<SubmissionResult, SubmitError>) -> SubmissionOutcome {
    match result {
        Ok(SubmissionResult::Page(artifact)) => SubmissionOutcome::Page(ArtifactRef {
            id: artifact.id,
            url: artifact.url,
        }),
        Ok(SubmissionResult::Story {
            composite_story,
            illustrations,
        }) => SubmissionOutcome::Story {
            composite_story,
            illustrations,
        },
        Err(err) => SubmissionOutcome::Failed(map_failure(&err.kind)),
    }
}

fn map_failure(kind: &storybook_engine::FailureKind) -> FailureKind {
    use storybook_engine::FailureKind as Engine;
    match kind {
        Engine::Network | Engine::Timeout | Engine::TooLarge { .. } | Engine::Cancelled => {
            FailureKind::Network
        }
        Engine::Parse => FailureKind::Parse,
        Engine::Application { .. } => FailureKind::Application,
        Engine::InvalidRequest | Engine::Storage => FailureKind::Local,
    }
}

fn to_request(submission: FormSubmission) -> FormRequest {
    let fields = submission
        .fields
        .into_iter()
        .map(|field| match field {
            storybook_core::FormField::Text { name, value } => FormField::Text { name, value },
            storybook_core::FormField::File {
                name,
                file_name,
                content_type,
                bytes,
            } => FormField::File {
                name,
                file_name,
                content_type,
                bytes,
            },
        })
        .collect();
    FormRequest::new(submission.action, fields)
}
