//! Storybook core: pure state machine and view-model helpers for the story
//! form controller.
mod effect;
mod msg;
mod state;
mod submission;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, ArtifactId, ArtifactRef, DownloadStatus, FailureKind, SubmissionOutcome, ViewState,
};
pub use submission::{FormField, FormSubmission, SubmissionId};
pub use update::update;
pub use view_model::{
    AppViewModel, DownloadControl, IllustrationView, InlineFrame, StoryView, DOWNLOAD_FILE_NAME,
    DOWNLOAD_LABEL, ERROR_MESSAGE, FRAME_BORDER, FRAME_HEIGHT, FRAME_WIDTH,
};

/// Re-exported so front-ends can build submissions without naming `url` themselves.
pub use url::Url;
