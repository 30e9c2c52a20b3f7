//! Gmail draft-creation client.
//!
//! Assembles an RFC 2822 message, base64url-encodes it, and submits it to
//! the Gmail drafts endpoint. The access credential is externally obtained
//! and injected; acquisition is out of scope.

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::json;
use tracing::debug;

const GMAIL_DRAFTS_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/drafts";

/// Errors from the mailbox collaborator.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// No access credential is configured.
    #[error("no mailbox access token configured")]
    MissingCredential,
    /// HTTP transport failure.
    #[error("mailbox request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The mailbox API rejected the request.
    #[error("mailbox API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the API.
        message: String,
    },
}

/// Draft-creation seam. The batch drafter talks to this trait so tests can
/// script mailbox outcomes without a network.
#[async_trait]
pub trait DraftMailbox: Send + Sync {
    /// Create a draft addressed to `to` with the given subject and body.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError`] on transport or API failure.
    async fn create_draft(&self, to: &str, subject: &str, body: &str)
        -> Result<(), MailboxError>;
}

/// Gmail-backed [`DraftMailbox`].
#[derive(Debug, Clone)]
pub struct GmailMailbox {
    access_token: String,
    drafts_url: String,
    client: reqwest::Client,
}

impl GmailMailbox {
    /// Create a mailbox client authenticated with `access_token`.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            drafts_url: GMAIL_DRAFTS_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different drafts endpoint (integration tests).
    #[must_use]
    pub fn with_drafts_url(mut self, url: impl Into<String>) -> Self {
        self.drafts_url = url.into();
        self
    }
}

#[async_trait]
impl DraftMailbox for GmailMailbox {
    async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailboxError> {
        if self.access_token.is_empty() {
            return Err(MailboxError::MissingCredential);
        }

        let raw = build_raw_message(to, subject, body);
        let response = self
            .client
            .post(&self.drafts_url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "message": { "raw": raw } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MailboxError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        debug!(to, "gmail draft created");
        Ok(())
    }
}

/// Assemble the RFC 2822 message and encode it as base64url without
/// padding, the form the Gmail API expects in `message.raw`.
///
/// The subject is MIME-encoded (`=?utf-8?B?...?=`) so non-ASCII survives
/// the header; body newlines become `<br>` because the draft is HTML.
fn build_raw_message(to: &str, subject: &str, body: &str) -> String {
    let encoded_subject = format!("=?utf-8?B?{}?=", STANDARD.encode(subject.as_bytes()));
    let html_body = body.replace('\n', "<br>");

    let message = [
        format!("To: {to}"),
        format!("Subject: {encoded_subject}"),
        "Content-Type: text/html; charset=utf-8".to_owned(),
        "MIME-Version: 1.0".to_owned(),
        String::new(),
        html_body,
    ]
    .join("\r\n");

    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// Pull the human-readable message out of a Gmail error body, falling back
/// to a trimmed excerpt of the raw text.
fn api_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_owned();
        }
    }
    body.chars().take(200).collect()
}
