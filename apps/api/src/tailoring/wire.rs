//! Wire contract with the remote tailoring service, version 1.
//!
//! Request:  `{"resume_text": string, "job_description": string}`
//! Response: `{"tailored_resume": string, "match_score"?: number, "suggestions"?: [string]}`
//!
//! Only `tailored_resume` is required. Any other shape is a failure.

use serde::{Deserialize, Serialize};

pub const CONTRACT_HEADER: &str = "x-tailor-contract";
pub const CONTRACT_VERSION: &str = "1";

#[derive(Debug, Serialize)]
pub struct WireRequest<'a> {
    pub resume_text: &'a str,
    pub job_description: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct WireResponse {
    pub tailored_resume: String,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_field_names() {
        let body = serde_json::to_value(WireRequest {
            resume_text: "r",
            job_description: "j",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"resume_text": "r", "job_description": "j"}));
    }

    #[test]
    fn test_response_optional_fields() {
        let parsed: WireResponse = serde_json::from_str(r#"{"tailored_resume": "x"}"#).unwrap();
        assert_eq!(parsed.tailored_resume, "x");
        assert!(parsed.match_score.is_none());
        assert!(parsed.suggestions.is_none());
    }

    #[test]
    fn test_response_requires_tailored_field() {
        assert!(serde_json::from_str::<WireResponse>(r#"{"resume": "x"}"#).is_err());
        assert!(serde_json::from_str::<WireResponse>(r#"{"tailored_resume": null}"#).is_err());
    }
}
