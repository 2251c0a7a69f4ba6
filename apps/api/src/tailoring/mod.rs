//! Tailoring Client: the single point of entry for calls to the remote tailoring service.
//!
//! `tailor` never fails: every error path collapses into the sentinel outcome
//! (fixed text, score 0, no suggestions). The underlying failure kind is kept
//! for logging only.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::history::TailorOutcome;
use crate::tailoring::wire::{WireRequest, WireResponse, CONTRACT_HEADER, CONTRACT_VERSION};

pub mod flow;
pub mod handlers;
pub mod wire;

/// User-facing text substituted whenever the service cannot produce a result.
pub const FAILURE_SENTINEL: &str =
    "We couldn't tailor your resume right now. Please try again later.";
/// Confidence used when the service does not report one.
pub const DEFAULT_MATCH_SCORE: u8 = 94;
/// Improvement notes used when the service does not report any.
pub const DEFAULT_SUGGESTIONS: [&str; 4] = [
    "Added relevant keywords from job description",
    "Emphasized technical skills matching requirements",
    "Restructured experience section for better alignment",
    "Enhanced project descriptions with quantifiable results",
];

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("Tailoring endpoint is not configured")]
    MissingEndpoint,

    #[error("Tailoring endpoint '{url}' is invalid: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Tailoring service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] InvalidResponse),
}

#[derive(Debug, Error)]
pub enum InvalidResponse {
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("tailored_resume is empty")]
    EmptyTailoredText,

    #[error("tailored_resume echoes the failure text")]
    SentinelText,
}

impl TailorError {
    /// Short label for the failure kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TailorError::MissingEndpoint | TailorError::InvalidEndpoint { .. } => "config",
            TailorError::EmptyField(_) => "validation",
            TailorError::Network(_) => "network",
            TailorError::Timeout(_) => "timeout",
            TailorError::InvalidResponse(InvalidResponse::Status { .. }) => "bad_status",
            TailorError::InvalidResponse(InvalidResponse::Malformed(_)) => "malformed_body",
            TailorError::InvalidResponse(InvalidResponse::EmptyTailoredText) => "empty_field",
            TailorError::InvalidResponse(InvalidResponse::SentinelText) => "sentinel_text",
        }
    }
}

/// Resume and job description text, both non-empty.
#[derive(Debug, Clone)]
pub struct TailorRequest {
    resume_text: String,
    job_description_text: String,
}

impl TailorRequest {
    pub fn new(
        resume_text: impl Into<String>,
        job_description_text: impl Into<String>,
    ) -> Result<Self, TailorError> {
        let resume_text = resume_text.into();
        let job_description_text = job_description_text.into();
        if resume_text.trim().is_empty() {
            return Err(TailorError::EmptyField("resume_text"));
        }
        if job_description_text.trim().is_empty() {
            return Err(TailorError::EmptyField("job_description_text"));
        }
        Ok(Self {
            resume_text,
            job_description_text,
        })
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_description_text(&self) -> &str {
        &self.job_description_text
    }
}

/// The client for the remote tailoring service. The endpoint is injected at
/// construction and never read from the environment afterwards.
#[derive(Clone)]
pub struct TailoringClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl TailoringClient {
    pub fn new(endpoint: Option<&str>, timeout: Duration) -> Result<Self, TailorError> {
        let raw = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(TailorError::MissingEndpoint)?;
        let endpoint = Url::parse(raw).map_err(|e| TailorError::InvalidEndpoint {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TailorError::InvalidEndpoint {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Tailors a resume. Always returns a well-formed outcome.
    pub async fn tailor(&self, request: &TailorRequest) -> TailorOutcome {
        match self.call(request).await {
            Ok(response) => {
                let outcome = success_outcome(request, response);
                debug!(
                    match_score = outcome.match_score,
                    chars = outcome.tailored_resume.len(),
                    "Tailoring succeeded"
                );
                outcome
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Tailoring failed, returning sentinel outcome");
                failure_outcome(request)
            }
        }
    }

    /// One request, no retry. The client-level timeout bounds the whole call.
    async fn call(&self, request: &TailorRequest) -> Result<WireResponse, TailorError> {
        let body = WireRequest {
            resume_text: request.resume_text(),
            job_description: request.job_description_text(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTRACT_HEADER, CONTRACT_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvalidResponse::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: WireResponse = serde_json::from_str(&text).map_err(InvalidResponse::from)?;

        let tailored = parsed.tailored_resume.trim();
        if tailored.is_empty() {
            return Err(InvalidResponse::EmptyTailoredText.into());
        }
        // A score of 0 must mean exactly the sentinel, so the service may not return it.
        if tailored == FAILURE_SENTINEL {
            return Err(InvalidResponse::SentinelText.into());
        }
        Ok(parsed)
    }

    fn transport_error(&self, e: reqwest::Error) -> TailorError {
        if e.is_timeout() {
            TailorError::Timeout(self.timeout)
        } else {
            TailorError::Network(e)
        }
    }
}

/// The sentinel outcome: fixed text, score 0, no suggestions.
pub fn failure_outcome(request: &TailorRequest) -> TailorOutcome {
    TailorOutcome {
        original_resume: request.resume_text().to_string(),
        job_description: request.job_description_text().to_string(),
        tailored_resume: FAILURE_SENTINEL.to_string(),
        match_score: 0,
        suggestions: Vec::new(),
        created_at: Utc::now(),
    }
}

fn success_outcome(request: &TailorRequest, response: WireResponse) -> TailorOutcome {
    let suggestions: Vec<String> = response
        .suggestions
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    TailorOutcome {
        original_resume: request.resume_text().to_string(),
        job_description: request.job_description_text().to_string(),
        tailored_resume: response.tailored_resume.trim().to_string(),
        match_score: normalize_score(response.match_score),
        suggestions: if suggestions.is_empty() {
            DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            suggestions
        },
        created_at: Utc::now(),
    }
}

/// Rounds and clamps a reported score into 1..=100. Zero is reserved for the
/// sentinel outcome.
fn normalize_score(reported: Option<f64>) -> u8 {
    match reported {
        Some(score) if score.is_finite() => score.round().clamp(1.0, 100.0) as u8,
        _ => DEFAULT_MATCH_SCORE,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    /// Serves `router` on an ephemeral local port and returns its `/tailor` URL.
    pub(crate) async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/tailor")
    }

    pub(crate) fn fixed_service(status: StatusCode, body: &'static str) -> Router {
        Router::new().route("/tailor", post(move || async move { (status, body) }))
    }

    fn client(url: &str) -> TailoringClient {
        TailoringClient::new(Some(url), Duration::from_secs(5)).unwrap()
    }

    fn request() -> TailorRequest {
        TailorRequest::new("Rust engineer, 5 years", "Senior Rust role").unwrap()
    }

    fn assert_sentinel(outcome: &TailorOutcome) {
        assert_eq!(outcome.tailored_resume, FAILURE_SENTINEL);
        assert_eq!(outcome.match_score, 0);
        assert!(outcome.suggestions.is_empty());
        assert!(outcome.is_failure());
        assert_eq!(outcome.original_resume, "Rust engineer, 5 years");
        assert_eq!(outcome.job_description, "Senior Rust role");
    }

    #[test]
    fn test_missing_endpoint_is_error() {
        assert!(matches!(
            TailoringClient::new(None, Duration::from_secs(1)),
            Err(TailorError::MissingEndpoint)
        ));
        assert!(matches!(
            TailoringClient::new(Some("   "), Duration::from_secs(1)),
            Err(TailorError::MissingEndpoint)
        ));
    }

    #[test]
    fn test_invalid_endpoint_is_error() {
        assert!(matches!(
            TailoringClient::new(Some("not a url"), Duration::from_secs(1)),
            Err(TailorError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            TailoringClient::new(Some("ftp://example.com/tailor"), Duration::from_secs(1)),
            Err(TailorError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_request_rejects_blank_fields() {
        assert!(matches!(
            TailorRequest::new("  ", "jd"),
            Err(TailorError::EmptyField("resume_text"))
        ));
        assert!(matches!(
            TailorRequest::new("resume", "\n"),
            Err(TailorError::EmptyField("job_description_text"))
        ));
    }

    #[test]
    fn test_normalize_score() {
        assert_eq!(normalize_score(None), DEFAULT_MATCH_SCORE);
        assert_eq!(normalize_score(Some(f64::NAN)), DEFAULT_MATCH_SCORE);
        assert_eq!(normalize_score(Some(87.4)), 87);
        assert_eq!(normalize_score(Some(0.0)), 1);
        assert_eq!(normalize_score(Some(-5.0)), 1);
        assert_eq!(normalize_score(Some(250.0)), 100);
    }

    #[tokio::test]
    async fn test_success_uses_reported_fields() {
        let service = Router::new().route(
            "/tailor",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers[CONTRACT_HEADER], CONTRACT_VERSION);
                assert_eq!(body["resume_text"], "Rust engineer, 5 years");
                assert_eq!(body["job_description"], "Senior Rust role");
                assert_eq!(body.as_object().unwrap().len(), 2);
                Json(json!({
                    "tailored_resume": "  JANE DOE\nRust engineer  ",
                    "match_score": 82.6,
                    "suggestions": ["Lead with Tokio work", "  "]
                }))
            }),
        );
        let url = spawn_service(service).await;

        let outcome = client(&url).tailor(&request()).await;
        assert_eq!(outcome.tailored_resume, "JANE DOE\nRust engineer");
        assert_eq!(outcome.match_score, 83);
        assert_eq!(outcome.suggestions, vec!["Lead with Tokio work".to_string()]);
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_success_without_score_uses_defaults() {
        let url = spawn_service(fixed_service(
            StatusCode::OK,
            r#"{"tailored_resume": "Tailored text"}"#,
        ))
        .await;

        let outcome = client(&url).tailor(&request()).await;
        assert_eq!(outcome.tailored_resume, "Tailored text");
        assert_eq!(outcome.match_score, DEFAULT_MATCH_SCORE);
        assert_eq!(outcome.suggestions.len(), DEFAULT_SUGGESTIONS.len());
    }

    #[tokio::test]
    async fn test_empty_tailored_field_is_sentinel() {
        let url = spawn_service(fixed_service(
            StatusCode::OK,
            r#"{"tailored_resume": "   \n ", "match_score": 90}"#,
        ))
        .await;
        assert_sentinel(&client(&url).tailor(&request()).await);
    }

    #[tokio::test]
    async fn test_service_echoing_failure_text_is_sentinel() {
        let body = json!({
            "tailored_resume": format!("  {FAILURE_SENTINEL}\n"),
            "match_score": 90,
            "suggestions": ["Keep going"]
        });
        let service = Router::new().route("/tailor", post(move || async move { Json(body) }));
        let url = spawn_service(service).await;

        let outcome = client(&url).tailor(&request()).await;
        assert_sentinel(&outcome);
        assert_eq!(outcome.match_score == 0, outcome.is_failure());
    }

    #[tokio::test]
    async fn test_error_status_is_sentinel() {
        let url = spawn_service(fixed_service(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"tailored_resume": "ignored"}"#,
        ))
        .await;
        assert_sentinel(&client(&url).tailor(&request()).await);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_sentinel() {
        let url = spawn_service(fixed_service(StatusCode::OK, "<html>oops</html>")).await;
        assert_sentinel(&client(&url).tailor(&request()).await);

        let url = spawn_service(fixed_service(StatusCode::OK, r#"{"resume": "wrong field"}"#)).await;
        assert_sentinel(&client(&url).tailor(&request()).await);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_sentinel() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client(&format!("http://{addr}/tailor"))
            .tailor(&request())
            .await;
        assert_sentinel(&outcome);
    }

    #[tokio::test]
    async fn test_slow_service_times_out_to_sentinel() {
        let service = Router::new().route(
            "/tailor",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"tailored_resume": "too late"}))
            }),
        );
        let url = spawn_service(service).await;

        let client = TailoringClient::new(Some(&url), Duration::from_millis(200)).unwrap();
        assert_sentinel(&client.tailor(&request()).await);
    }
}
