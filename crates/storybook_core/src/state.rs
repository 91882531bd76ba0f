use std::path::PathBuf;

use url::Url;

use crate::view_model::{
    AppViewModel, DownloadControl, IllustrationView, InlineFrame, StoryView, DOWNLOAD_FILE_NAME,
    DOWNLOAD_LABEL, ERROR_MESSAGE, FRAME_BORDER, FRAME_HEIGHT, FRAME_WIDTH,
};
use crate::SubmissionId;

pub type ArtifactId = u64;

/// Handle to a rendered HTML artifact held by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub id: ArtifactId,
    pub url: Url,
}

/// Failure classes the view distinguishes. All of them render the same
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Parse,
    Application,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Page(ArtifactRef),
    Story {
        composite_story: String,
        illustrations: Vec<String>,
    },
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Processing,
    Shown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Pending,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Results {
    #[default]
    Empty,
    Page(ArtifactRef),
    Story {
        composite_story: String,
        illustrations: Vec<String>,
    },
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    view_state: ViewState,
    last_submission_id: SubmissionId,
    in_flight: Option<SubmissionId>,
    results: Results,
    download: Option<DownloadStatus>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    pub fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    /// The artifact currently embedded in the results panel, if any.
    pub fn active_artifact(&self) -> Option<&ArtifactRef> {
        match &self.results {
            Results::Page(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> AppViewModel {
        let (story, illustrations, failure) = match &self.results {
            Results::Empty => (StoryView::Empty, Vec::new(), None),
            Results::Page(artifact) => (
                StoryView::Embedded {
                    frame: InlineFrame {
                        src: artifact.url.clone(),
                        width: FRAME_WIDTH,
                        height: FRAME_HEIGHT,
                        border: FRAME_BORDER,
                    },
                    download: DownloadControl {
                        label: DOWNLOAD_LABEL,
                        file_name: DOWNLOAD_FILE_NAME,
                        artifact_id: artifact.id,
                    },
                },
                Vec::new(),
                None,
            ),
            Results::Story {
                composite_story,
                illustrations,
            } => (
                StoryView::Text(composite_story.clone()),
                illustrations
                    .iter()
                    .enumerate()
                    .map(|(index, src)| IllustrationView {
                        src: src.clone(),
                        alt: format!("Illustration {}", index + 1),
                    })
                    .collect(),
                None,
            ),
            Results::Failed(kind) => (
                StoryView::Text(ERROR_MESSAGE.to_string()),
                Vec::new(),
                Some(*kind),
            ),
        };

        AppViewModel {
            view_state: self.view_state,
            processing_visible: self.view_state == ViewState::Processing,
            results_visible: self.view_state == ViewState::Shown,
            story,
            illustrations,
            failure,
            download: self.download.clone(),
            in_flight: self.in_flight,
            dirty: self.dirty,
        }
    }

    /// Allocates the next submission id and makes it current. Returns the new id
    /// together with the id it superseded, if one was still in flight.
    pub(crate) fn begin_submission(&mut self) -> (SubmissionId, Option<SubmissionId>) {
        self.last_submission_id += 1;
        let submission_id = self.last_submission_id;
        let superseded = self.in_flight.replace(submission_id);
        self.view_state = ViewState::Processing;
        self.dirty = true;
        (submission_id, superseded)
    }

    /// Shows the outcome of the current submission. Returns the previously
    /// embedded artifact when the new results replace it.
    pub(crate) fn show_outcome(&mut self, outcome: SubmissionOutcome) -> Option<ArtifactRef> {
        self.in_flight = None;
        self.view_state = ViewState::Shown;
        self.download = None;
        self.dirty = true;

        let next = match outcome {
            SubmissionOutcome::Page(artifact) => Results::Page(artifact),
            SubmissionOutcome::Story {
                composite_story,
                illustrations,
            } => Results::Story {
                composite_story,
                illustrations,
            },
            SubmissionOutcome::Failed(kind) => Results::Failed(kind),
        };

        match std::mem::replace(&mut self.results, next) {
            Results::Page(previous) if self.active_artifact() != Some(&previous) => Some(previous),
            _ => None,
        }
    }

    pub(crate) fn set_download(&mut self, status: DownloadStatus) {
        self.download = Some(status);
        self.dirty = true;
    }

    /// Returns the view to its initial state and hands back whatever it still held.
    pub(crate) fn tear_down(&mut self) -> (Option<SubmissionId>, Option<ArtifactRef>) {
        let in_flight = self.in_flight.take();
        let artifact = match std::mem::take(&mut self.results) {
            Results::Page(artifact) => Some(artifact),
            _ => None,
        };
        if self.view_state != ViewState::Idle || in_flight.is_some() || artifact.is_some() {
            self.dirty = true;
        }
        self.view_state = ViewState::Idle;
        self.download = None;
        (in_flight, artifact)
    }
}
