//! Blocking HTTP transport for the `generateContent` API.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::{VisionError, VisionRequest, VisionTransport, redact_sensitive};

/// Upper bound on one model call, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Transport that posts requests to the vision service over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds a transport with [`REQUEST_TIMEOUT`].
    ///
    /// # Errors
    /// Returns [`VisionError::Transport`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, VisionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| {
                VisionError::Transport(format!("failed to build http client: {error}"))
            })?;
        Ok(Self { client })
    }
}

impl VisionTransport for HttpTransport {
    fn generate(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &VisionRequest,
    ) -> Result<String, VisionError> {
        let url = generate_content_url(endpoint, &request.model);
        debug!(%url, "sending vision request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&generate_content_body(request))
            .send()
            .map_err(|error| VisionError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(VisionError::Transport(format!(
                "vision service returned {status}: {}",
                redact_sensitive(&body)
            )));
        }

        let payload: Value = response
            .json()
            .map_err(|error| VisionError::Transport(error.without_url().to_string()))?;
        candidate_text(&payload)
    }
}

/// Joins the service base URL and model into the `generateContent` URL.
pub fn generate_content_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model.trim_start_matches('/')
    )
}

/// Builds the JSON body: prompt text, inline image, JSON-only response.
pub fn generate_content_body(request: &VisionRequest) -> Value {
    json!({
        "contents": [{
            "parts": [
                {"text": request.prompt},
                {"inline_data": {"mime_type": request.mime_type, "data": request.image_base64}}
            ]
        }],
        "generationConfig": {"response_mime_type": "application/json"}
    })
}

/// Extracts the first candidate's text from a `generateContent` response.
///
/// # Errors
/// Returns [`VisionError::Transport`] when no candidate exists and
/// [`VisionError::EmptyResponse`] when the candidate carries no text.
pub fn candidate_text(response: &Value) -> Result<String, VisionError> {
    let candidate = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| VisionError::Transport("vision response missing candidates".to_string()))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(VisionError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_endpoint_and_model() {
        assert_eq!(
            generate_content_url("https://v.test/v1beta/", "models/gemini-2.5-pro"),
            "https://v.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn body_carries_prompt_and_inline_image() {
        let request = VisionRequest::new("models/m", b"abc");
        let body = generate_content_body(&request);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], request.prompt.as_str());
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "YWJj");
        assert_eq!(body["generationConfig"]["response_mime_type"], "application/json");
    }

    #[test]
    fn candidate_text_joins_parts_of_first_candidate() {
        let response = json!({"candidates": [
            {"content": {"parts": [{"text": "{\"overall"}, {"text": "_confidence\": 0.8}"}]}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]});
        assert_eq!(
            candidate_text(&response).expect("text should extract"),
            "{\"overall_confidence\": 0.8}"
        );
    }

    #[test]
    fn candidate_text_reports_missing_or_blank_output() {
        assert!(matches!(
            candidate_text(&json!({"candidates": []})),
            Err(VisionError::Transport(_))
        ));
        assert!(matches!(
            candidate_text(&json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]})),
            Err(VisionError::EmptyResponse)
        ));
    }

    #[test]
    fn transport_builds_with_timeout() {
        assert!(HttpTransport::new().is_ok());
    }
}
