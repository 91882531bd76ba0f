use crate::{AppState, DownloadStatus, Effect, Msg, SubmissionOutcome, DOWNLOAD_FILE_NAME};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FormSubmitted(submission) => {
            let (submission_id, superseded) = state.begin_submission();
            let mut effects = Vec::with_capacity(1 + usize::from(superseded.is_some()));
            if let Some(previous) = superseded {
                effects.push(Effect::CancelSubmission {
                    submission_id: previous,
                });
            }
            effects.push(Effect::PostForm {
                submission_id,
                submission,
            });
            effects
        }
        Msg::SubmissionResolved {
            submission_id,
            outcome,
        } => {
            if state.in_flight() != Some(submission_id) {
                // Stale: a newer submit owns the view now.
                return (state, release_stale(outcome));
            }
            state
                .show_outcome(outcome)
                .map(|previous| Effect::RevokeArtifact {
                    artifact_id: previous.id,
                })
                .into_iter()
                .collect()
        }
        Msg::DownloadClicked => match state.active_artifact().map(|artifact| artifact.id) {
            Some(artifact_id) => {
                state.set_download(DownloadStatus::Pending);
                vec![Effect::SaveArtifact {
                    artifact_id,
                    file_name: DOWNLOAD_FILE_NAME.to_string(),
                }]
            }
            None => Vec::new(),
        },
        Msg::DownloadFinished {
            artifact_id,
            result,
        } => {
            if state.active_artifact().map(|artifact| artifact.id) == Some(artifact_id) {
                state.set_download(match result {
                    Ok(path) => DownloadStatus::Saved(path),
                    Err(message) => DownloadStatus::Failed(message),
                });
            }
            Vec::new()
        }
        Msg::TornDown => {
            let (in_flight, artifact) = state.tear_down();
            let mut effects = Vec::with_capacity(2);
            if let Some(submission_id) = in_flight {
                effects.push(Effect::CancelSubmission { submission_id });
            }
            if let Some(artifact) = artifact {
                effects.push(Effect::RevokeArtifact {
                    artifact_id: artifact.id,
                });
            }
            effects
        }
    };

    (state, effects)
}

fn release_stale(outcome: SubmissionOutcome) -> Vec<Effect> {
    match outcome {
        SubmissionOutcome::Page(artifact) => vec![Effect::RevokeArtifact {
            artifact_id: artifact.id,
        }],
        SubmissionOutcome::Story { .. } | SubmissionOutcome::Failed(_) => Vec::new(),
    }
}
