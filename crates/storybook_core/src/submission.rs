use url::Url;

pub type SubmissionId = u64;

/// A single form control value, encoded as one multipart part.
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

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Snapshot of the form taken at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub action: Url,
    pub fields: Vec<FormField>,
}

impl FormSubmission {
    pub fn new(action: Url) -> Self {
        Self {
            action,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }
}
