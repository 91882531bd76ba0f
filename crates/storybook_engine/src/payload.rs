use serde_json::Value;

use crate::{FailureKind, SubmitError};

const SUCCESS_STATUS: &str = "success";

/// A response body that can be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// A complete HTML document to embed.
    Page { html_content: String },
    /// Story text plus illustration URLs, in display order.
    Story {
        composite_story: String,
        illustrations: Vec<String>,
    },
}

/// Decode a response body: bytes -> JSON -> one of the renderable shapes.
///
/// Bodies that are not JSON fail with [`FailureKind::Parse`]. Each shape only
/// looks at its own fields, so unrelated extra fields never matter. JSON that
/// matches no shape, or that carries a non-success `status`, fails with
/// [`FailureKind::Application`]; the server's `error` text, when it is a
/// string, becomes the error message.
pub fn decode_payload(bytes: &[u8]) -> Result<ResponsePayload, SubmitError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| SubmitError::new(FailureKind::Parse, err.to_string()))?;

    let Some(fields) = value.as_object() else {
        return Err(SubmitError::new(
            FailureKind::Application { status: None },
            "payload is not a json object",
        ));
    };

    let status = fields.get("status");
    let application_error = |fallback: &str| {
        SubmitError::new(
            FailureKind::Application {
                status: status.map(status_label),
            },
            fields
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(fallback),
        )
    };

    let is_success = status.and_then(Value::as_str) == Some(SUCCESS_STATUS);
    if status.is_some() && !is_success {
        return Err(application_error("server reported failure"));
    }

    if is_success {
        if let Some(html_content) = fields.get("html_content").and_then(Value::as_str) {
            return Ok(ResponsePayload::Page {
                html_content: html_content.to_string(),
            });
        }
    }

    let composite_story = fields.get("composite_story").and_then(Value::as_str);
    let illustrations = fields
        .get("illustrations")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(ToOwned::to_owned))
                .collect::<Option<Vec<_>>>()
        });

    match (composite_story, illustrations) {
        (Some(composite_story), Some(illustrations)) => Ok(ResponsePayload::Story {
            composite_story: composite_story.to_string(),
            illustrations,
        }),
        _ => Err(application_error("payload has no renderable content")),
    }
}

fn status_label(status: &Value) -> String {
    match status {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_html_is_a_page() {
        let payload = decode_payload(br#"{"status":"success","html_content":"<p>Hi</p>"}"#);
        assert_eq!(
            payload,
            Ok(ResponsePayload::Page {
                html_content: "<p>Hi</p>".to_string()
            })
        );
    }

    #[test]
    fn html_without_success_status_is_not_a_page() {
        let err = decode_payload(br#"{"html_content":"<p>Hi</p>"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Application { status: None });
    }

    #[test]
    fn story_shape_is_a_story() {
        let payload = decode_payload(
            br#"{"composite_story":"Once upon a time","illustrations":["/img/1.png","/img/2.png"]}"#,
        );
        assert_eq!(
            payload,
            Ok(ResponsePayload::Story {
                composite_story: "Once upon a time".to_string(),
                illustrations: vec!["/img/1.png".to_string(), "/img/2.png".to_string()],
            })
        );
    }

    #[test]
    fn story_with_success_status_and_extra_fields_is_a_story() {
        let payload = decode_payload(
            br#"{"status":"success","composite_story":"Once","final_story":"x","illustrations":[],"processing_complete":true}"#,
        )
        .unwrap();
        assert_eq!(
            payload,
            ResponsePayload::Story {
                composite_story: "Once".to_string(),
                illustrations: Vec::new(),
            }
        );
    }

    #[test]
    fn error_status_keeps_server_message() {
        let err = decode_payload(
            br#"{"status":"error","error":"Operation timed out","processing_complete":false}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            FailureKind::Application {
                status: Some("error".to_string())
            }
        );
        assert_eq!(err.message, "Operation timed out");
    }

    #[test]
    fn error_status_wins_over_story_fields() {
        let err = decode_payload(
            br#"{"status":"error","composite_story":"Once","illustrations":[]}"#,
        )
        .unwrap_err();
        assert!(matches!(err.kind, FailureKind::Application { .. }));
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = decode_payload(b"<html>Internal Server Error</html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::Parse);
    }

    #[test]
    fn non_object_json_is_an_application_error() {
        let err = decode_payload(b"[1, 2, 3]").unwrap_err();
        assert_eq!(err.kind, FailureKind::Application { status: None });
    }

    #[test]
    fn wrongly_typed_illustrations_are_an_application_error() {
        let err =
            decode_payload(br#"{"composite_story":"Once","illustrations":[1,2]}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Application { status: None });
    }

    #[test]
    fn page_ignores_unrelated_fields_of_any_type() {
        for body in [
            &br#"{"status":"success","html_content":"<p>Hi</p>","illustrations":"n/a"}"#[..],
            &br#"{"status":"success","html_content":"<p>Hi</p>","error":0}"#[..],
            &br#"{"status":"success","html_content":"<p>Hi</p>","composite_story":["x"]}"#[..],
        ] {
            assert_eq!(
                decode_payload(body),
                Ok(ResponsePayload::Page {
                    html_content: "<p>Hi</p>".to_string()
                })
            );
        }
    }

    #[test]
    fn story_ignores_unrelated_fields_of_any_type() {
        let payload = decode_payload(
            br#"{"composite_story":"Once","illustrations":["/img/1.png"],"html_content":5,"error":null}"#,
        );
        assert_eq!(
            payload,
            Ok(ResponsePayload::Story {
                composite_story: "Once".to_string(),
                illustrations: vec!["/img/1.png".to_string()],
            })
        );
    }

    #[test]
    fn non_string_error_falls_back_to_generic_message() {
        let err = decode_payload(br#"{"status":"error","error":{"code":7}}"#).unwrap_err();
        assert_eq!(
            err.kind,
            FailureKind::Application {
                status: Some("error".to_string())
            }
        );
        assert_eq!(err.message, "server reported failure");
    }

    #[test]
    fn non_string_status_is_a_failure() {
        let err = decode_payload(br#"{"status":1,"html_content":"<p>Hi</p>"}"#).unwrap_err();
        assert_eq!(
            err.kind,
            FailureKind::Application {
                status: Some("1".to_string())
            }
        );
    }
}
