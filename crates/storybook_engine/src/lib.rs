//! Storybook engine: form submission, payload decoding and artifact IO.
mod artifact;
mod engine;
mod payload;
mod persist;
mod request;
mod submit;
mod types;

pub use artifact::{Artifact, ArtifactStore};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use payload::{decode_payload, ResponsePayload};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use request::{FormField, FormRequest};
pub use submit::{FormSubmitter, ReqwestSubmitter, SubmitSettings, AJAX_HEADER, AJAX_HEADER_VALUE};
pub use types::{
    ArtifactId, EngineEvent, FailureKind, SubmissionId, SubmissionResult, SubmitError,
};
