use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted the story form.
    FormSubmitted(crate::FormSubmission),
    /// Engine resolved a submission, successfully or not.
    SubmissionResolved {
        submission_id: crate::SubmissionId,
        outcome: crate::SubmissionOutcome,
    },
    /// User activated the "Download Story" control.
    DownloadClicked,
    /// Engine finished saving an artifact to the download location.
    DownloadFinished {
        artifact_id: crate::ArtifactId,
        result: Result<PathBuf, String>,
    },
    /// The view is going away; release everything it holds.
    TornDown,
}
