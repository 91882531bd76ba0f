use std::fmt;
use std::path::PathBuf;

use crate::artifact::Artifact;

pub type SubmissionId = u64;
pub type ArtifactId = u64;

/// What a finished submission produced, after any HTML has been materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Page(Artifact),
    Story {
        composite_story: String,
        illustrations: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SubmissionCompleted {
        submission_id: SubmissionId,
        result: Result<SubmissionResult, SubmitError>,
    },
    DownloadSaved {
        artifact_id: ArtifactId,
        result: Result<PathBuf, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitError {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmitError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidRequest,
    Network,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Parse,
    Application { status: Option<String> },
    Cancelled,
    Storage,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Parse => write!(f, "response is not valid json"),
            FailureKind::Application { status: Some(status) } => {
                write!(f, "application error (status {status})")
            }
            FailureKind::Application { status: None } => write!(f, "application error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Storage => write!(f, "artifact storage error"),
        }
    }
}
