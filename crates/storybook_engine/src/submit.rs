use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use storybook_logging::{story_debug, story_info};

use crate::payload::{decode_payload, ResponsePayload};
use crate::{FailureKind, FormRequest, SubmitError};

/// Header that marks a request as script-initiated, so the server can answer
/// with JSON instead of a full page.
pub const AJAX_HEADER: &str = "X-Requested-With";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";

#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub connect_timeout: Duration,
    /// `None` waits for the server indefinitely.
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
    pub as_ajax: bool,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            // The backend gives up on its own after five minutes.
            request_timeout: Some(Duration::from_secs(330)),
            max_bytes: 32 * 1024 * 1024,
            as_ajax: false,
        }
    }
}

#[async_trait::async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, request: &FormRequest) -> Result<ResponsePayload, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    settings: SubmitSettings,
    client: reqwest::Client,
}

impl ReqwestSubmitter {
    pub fn new(settings: SubmitSettings) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| SubmitError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &SubmitSettings {
        &self.settings
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<BytesMut, SubmitError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(SubmitError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(SubmitError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl FormSubmitter for ReqwestSubmitter {
    async fn submit(&self, request: &FormRequest) -> Result<ResponsePayload, SubmitError> {
        let form = request.to_multipart()?;
        let mut builder = self.client.post(request.action.clone()).multipart(form);
        if self.settings.as_ajax {
            builder = builder.header(AJAX_HEADER, AJAX_HEADER_VALUE);
        }
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        story_info!(
            "POST {} fields={} ajax={}",
            request.action,
            request.fields.len(),
            self.settings.as_ajax
        );
        let response = builder.send().await.map_err(map_reqwest_error)?;

        // The body decides the outcome; the status code is only logged.
        let status = response.status();
        story_debug!("Response from {}: {}", request.action, status);

        let body = self.read_body(response).await?;
        decode_payload(&body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        return SubmitError::new(FailureKind::Timeout, err.to_string());
    }
    SubmitError::new(FailureKind::Network, err.to_string())
}
