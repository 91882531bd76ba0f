use reqwest::multipart::{Form, Part};
use url::Url;

use crate::{FailureKind, SubmitError};

/// One multipart field of an outgoing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// A form ready to be posted to `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub action: Url,
    pub fields: Vec<FormField>,
}

impl FormRequest {
    pub fn new(action: Url, fields: Vec<FormField>) -> Self {
        Self { action, fields }
    }

    /// Encode the fields the way a browser encodes a `FormData` body.
    pub(crate) fn to_multipart(&self) -> Result<Form, SubmitError> {
        let mut form = Form::new();
        for field in &self.fields {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        part = part.mime_str(mime).map_err(|err| {
                            SubmitError::new(FailureKind::InvalidRequest, err.to_string())
                        })?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}
