//! Client for the hosted Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::retry::{with_backoff, AttemptError, Outcome, RetryPolicy};

#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// `None` puts the assistant in fallback mode.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

pub struct GeminiClient {
    http: Client,
    settings: LlmSettings,
}

impl GeminiClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        if settings.api_key.is_some() {
            info!(model = %settings.model, "Gemini API configured");
        } else {
            warn!("GEMINI_API_KEY is not set, running in fallback mode");
        }
        Ok(Self { http, settings })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// Sends `prompt` and returns the generated text, or
    /// [`Outcome::Unavailable`] when the caller should use canned replies.
    pub async fn generate(&self, prompt: &str) -> Outcome<String> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            debug!("no Gemini API key, skipping request");
            return Outcome::Unavailable;
        };

        let url = self.endpoint();
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        with_backoff(&self.settings.retry, |attempt| {
            let request = self
                .http
                .post(&url)
                .query(&[("key", api_key)])
                .json(&body);
            async move {
                debug!(attempt, "calling Gemini");
                let response = request
                    .send()
                    .await
                    .map_err(|e| AttemptError::Transient(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(classify_status(status));
                }

                let parsed: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| AttemptError::Transient(e.to_string()))?;
                parsed.into_text().ok_or_else(|| {
                    AttemptError::Permanent("response contained no candidate text".into())
                })
            }
        })
        .await
    }
}

fn classify_status(status: StatusCode) -> AttemptError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AttemptError::Permanent(format!("HTTP {status}: API key is invalid or lacks permission"))
        }
        StatusCode::BAD_REQUEST => {
            AttemptError::Permanent(format!("HTTP {status}: invalid request format or model name"))
        }
        _ => AttemptError::Transient(format!("HTTP {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_format() {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn reads_first_candidate_text() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Use neem oil."},{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Use neem oil."));

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.into_text(), None);
    }

    #[test]
    fn auth_and_bad_request_are_permanent() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            AttemptError::Permanent(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            AttemptError::Permanent(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST),
            AttemptError::Permanent(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            AttemptError::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            AttemptError::Transient(_)
        ));
    }
}
