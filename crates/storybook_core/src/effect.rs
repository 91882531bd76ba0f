use crate::{ArtifactId, FormSubmission, SubmissionId};

/// Side effects requested by [`crate::update`]. There is no
/// navigation effect: a submitted form is only ever posted in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PostForm {
        submission_id: SubmissionId,
        submission: FormSubmission,
    },
    CancelSubmission {
        submission_id: SubmissionId,
    },
    RevokeArtifact {
        artifact_id: ArtifactId,
    },
    SaveArtifact {
        artifact_id: ArtifactId,
        file_name: String,
    },
}
