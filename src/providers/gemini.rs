//! Gemini provider implementation using the `generateContent` API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_http_response, GenerationRequest, ProviderError, TextGenerator};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Gemini `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Prompt contents.
    pub contents: Vec<GeminiContent>,
    /// Optional system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Tool capabilities (web-search grounding).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiTool>,
}

/// A content block: an ordered list of parts.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Content parts.
    pub parts: Vec<GeminiPart>,
}

/// A single text part.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// The text content. Absent for non-text parts in responses.
    #[serde(default)]
    pub text: Option<String>,
}

/// A tool declaration. Only the built-in web-search tool is used; its value
/// is an empty object per the API contract.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiTool {
    /// The `google_search` capability marker.
    pub google_search: Value,
}

/// Gemini `generateContent` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Response candidates; the first is used.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One response candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content. May be absent when generation was blocked.
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Gemini API request from a generation request.
#[doc(hidden)]
pub fn build_request(request: &GenerationRequest) -> GeminiRequest {
    let tools = if request.grounding {
        vec![GeminiTool {
            google_search: Value::Object(serde_json::Map::new()),
        }]
    } else {
        Vec::new()
    };

    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        }],
        system_instruction: request.system.as_ref().map(|text| GeminiContent {
            parts: vec![GeminiPart {
                text: Some(text.clone()),
            }],
        }),
        tools,
    }
}

/// Parse a Gemini API response body into the candidate's joined text.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized and
/// `ProviderError::Unavailable` if no candidate carries text (e.g. the
/// request was blocked upstream).
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let text: String = resp
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ProviderError::Unavailable(
            "response contained no text candidates".to_owned(),
        ));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider for `model` authenticated with `api_key`.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API base (integration tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Unavailable(
                "no API key configured".to_owned(),
            ));
        }

        let api_request = build_request(&request);
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
