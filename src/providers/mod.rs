//! Text-generation provider abstraction.
//!
//! Defines the [`TextGenerator`] trait and the shared request type used by
//! the orchestrators. One provider is implemented:
//! [`gemini::GeminiProvider`] — Google `generateContent` API, the endpoint
//! the assistant delegates prospect discovery and email drafting to.
//!
//! The trait seam exists so orchestrators are tested against scripted
//! fakes; nothing above this module knows about HTTP.

use async_trait::async_trait;
use regex::Regex;

pub mod gemini;

/// A request for one text completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Optional system instruction injected ahead of the prompt.
    pub system: Option<String>,
    /// Enable web-search grounding: the model may consult live search
    /// results before answering. A capability flag passed through to the
    /// external service, not something implemented here.
    pub grounding: bool,
}

impl GenerationRequest {
    /// A plain ungrounded request with no system instruction.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            grounding: false,
        }
    }

    /// Enable web-search grounding on this request.
    #[must_use]
    pub fn grounded(mut self) -> Self {
        self.grounding = true;
        self
    }
}

/// Errors returned by text-generation providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized, truncated response body.
        body: String,
    },
    /// Provider cannot satisfy the request with current configuration.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure,
/// `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse, redact, and truncate an upstream error body before it reaches
/// logs or user-visible error text. Credentials must never round-trip
/// through error messages.
fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"AIza[A-Za-z0-9_\-]{30,}",
        r"ya29\.[A-Za-z0-9_\-\.]{20,}",
        r"sk-[A-Za-z0-9]{32,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

/// Core text-generation interface.
///
/// Implementations must be `Send + Sync` for use across async task
/// boundaries. Every call is fallible and potentially slow; no retry is
/// performed at this layer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Request a completion and return its raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or schema failure.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError>;

    /// The model identifier string this provider is instantiated for.
    fn model_id(&self) -> &str;
}
