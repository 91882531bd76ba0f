use url::Url;

use crate::{ArtifactId, DownloadStatus, FailureKind, SubmissionId, ViewState};

/// Text shown in the story container for every kind of failure.
pub const ERROR_MESSAGE: &str = "Error generating story. Please try again.";
pub const DOWNLOAD_LABEL: &str = "Download Story";
pub const DOWNLOAD_FILE_NAME: &str = "my-kids-story.html";
pub const FRAME_WIDTH: &str = "100%";
pub const FRAME_HEIGHT: &str = "600px";
pub const FRAME_BORDER: &str = "1px solid #ccc";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub view_state: ViewState,
    pub processing_visible: bool,
    pub results_visible: bool,
    pub story: StoryView,
    pub illustrations: Vec<IllustrationView>,
    pub failure: Option<FailureKind>,
    pub download: Option<DownloadStatus>,
    pub in_flight: Option<SubmissionId>,
    pub dirty: bool,
}

/// Contents of the story container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoryView {
    #[default]
    Empty,
    Text(String),
    Embedded {
        frame: InlineFrame,
        download: DownloadControl,
    },
}

impl StoryView {
    /// Plain text content; empty for an embedded frame.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Empty | Self::Embedded { .. } => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFrame {
    pub src: Url,
    pub width: &'static str,
    pub height: &'static str,
    pub border: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadControl {
    pub label: &'static str,
    pub file_name: &'static str,
    pub artifact_id: ArtifactId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationView {
    pub src: String,
    pub alt: String,
}
