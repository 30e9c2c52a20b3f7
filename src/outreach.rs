//! Outreach-drafting orchestrator.
//!
//! Drafts one personalized email per prospect through the text generator
//! (ungrounded) and coordinates batched generation with per-item failure
//! isolation: one bad prospect never aborts the batch. Successes are
//! persisted as they complete, so an interruption mid-batch loses only the
//! unprocessed tail.
//!
//! The batch loop is strictly sequential by design — the external service
//! is rate-limited and per-item progress reporting stays deterministic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{EmailContent, Profile, Prospect, Service};
use crate::extract::{self, MalformedResponse};
use crate::mailbox::{DraftMailbox, MailboxError};
use crate::providers::{GenerationRequest, ProviderError, TextGenerator};
use crate::repository::Repository;

/// Errors from drafting a single email.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// The profile has no name; drafts cannot be signed.
    #[error("profile name is not set")]
    MissingProfileName,
    /// The generation collaborator failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The model's reply could not be reduced to the expected JSON object.
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),
    /// The reply object lacked a required key.
    #[error("model reply is missing the '{0}' field")]
    MissingField(&'static str),
    /// The connected mailbox rejected the draft.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}

/// Cooperative cancellation flag, checked between batch items.
///
/// Cancelling abandons the unprocessed tail; the item currently in flight
/// still completes and is recorded.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress report emitted after each batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftProgress {
    /// 1-based position of the item just processed.
    pub position: usize,
    /// Total items in the batch.
    pub total: usize,
    /// Company the item targeted.
    pub company: String,
    /// Whether the item succeeded.
    pub succeeded: bool,
}

impl DraftProgress {
    /// Human-readable "N of M" status line.
    pub fn status_line(&self) -> String {
        if self.succeeded {
            format!(
                "{} of {}: drafted email for {}",
                self.position, self.total, self.company
            )
        } else {
            format!(
                "{} of {}: failed for {}",
                self.position, self.total, self.company
            )
        }
    }
}

/// Outcome of a batch drafting run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DraftSummary {
    /// Items drafted and recorded.
    pub succeeded: usize,
    /// Items that failed (generation, parse, or mailbox).
    pub failed: usize,
    /// Items in the input batch, including any cancelled tail.
    pub total: usize,
}

/// Outreach-drafting orchestrator over injected collaborators.
pub struct OutreachDrafter<'a> {
    generator: &'a dyn TextGenerator,
    repository: &'a Repository,
    mailbox: Option<&'a dyn DraftMailbox>,
}

impl<'a> OutreachDrafter<'a> {
    /// Create a drafter that records emails locally only.
    pub fn new(generator: &'a dyn TextGenerator, repository: &'a Repository) -> Self {
        Self {
            generator,
            repository,
            mailbox: None,
        }
    }

    /// Also submit each successful draft to a connected mailbox.
    ///
    /// A mailbox failure counts as an item failure even though the text
    /// generation itself succeeded; nothing is recorded locally either.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: &'a dyn DraftMailbox) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    /// Draft one email for `prospect`.
    ///
    /// # Errors
    ///
    /// Fails fast with [`DraftError::MissingProfileName`] when the profile
    /// has no name; otherwise surfaces provider and parse failures. The
    /// reply must be a JSON object with `subject` and `body` string keys.
    pub async fn draft_email(
        &self,
        prospect: &Prospect,
        service: &Service,
        profile: &Profile,
    ) -> Result<EmailContent, DraftError> {
        if profile.name.trim().is_empty() {
            return Err(DraftError::MissingProfileName);
        }

        let prompt = build_prompt(prospect, service, profile);
        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await?;

        let value = extract::json_object(&raw)?;
        let subject = require_string(&value, "subject")?;
        let body = require_string(&value, "body")?;
        Ok(EmailContent { subject, body })
    }

    /// Draft emails for every prospect in `prospects`, sequentially.
    ///
    /// Items are processed in input order. Each success is submitted to the
    /// mailbox (when configured) and persisted through the repository before
    /// the next item begins. A per-item failure increments the failure count
    /// and the loop continues. After each item, `on_progress` receives a
    /// [`DraftProgress`]. Setting `cancel` abandons the remaining tail.
    pub async fn draft_emails_for(
        &self,
        prospects: &[Prospect],
        service: &Service,
        profile: &Profile,
        cancel: &CancelFlag,
        mut on_progress: impl FnMut(&DraftProgress),
    ) -> DraftSummary {
        let total = prospects.len();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        info!(total, service = %service.name, "starting batch email drafting");

        for (idx, prospect) in prospects.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    processed = idx,
                    total, "batch drafting cancelled, abandoning tail"
                );
                break;
            }

            let outcome = self.draft_and_record(prospect, service, profile).await;
            let ok = match outcome {
                Ok(()) => {
                    succeeded = succeeded.saturating_add(1);
                    true
                }
                Err(e) => {
                    warn!(company = %prospect.company_name, error = %e, "email drafting failed");
                    failed = failed.saturating_add(1);
                    false
                }
            };

            on_progress(&DraftProgress {
                position: idx.saturating_add(1),
                total,
                company: prospect.company_name.clone(),
                succeeded: ok,
            });
        }

        info!(succeeded, failed, total, "batch email drafting finished");
        DraftSummary {
            succeeded,
            failed,
            total,
        }
    }

    async fn draft_and_record(
        &self,
        prospect: &Prospect,
        service: &Service,
        profile: &Profile,
    ) -> Result<(), DraftError> {
        let content = self.draft_email(prospect, service, profile).await?;

        if let Some(mailbox) = self.mailbox {
            mailbox
                .create_draft(&prospect.contact.email, &content.subject, &content.body)
                .await?;
        }

        self.repository
            .add_email(prospect.clone(), service.clone(), content.to_stored())
            .await;
        Ok(())
    }
}

fn require_string(value: &Value, key: &'static str) -> Result<String, DraftError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(DraftError::MissingField(key))
}

fn build_prompt(prospect: &Prospect, service: &Service, profile: &Profile) -> String {
    format!(
        "Act as an expert B2B sales copywriter.\n\
         Your task is to draft a professional, highly personalized outreach email.\n\
         \n\
         **Recipient:**\n\
         - Company: {company}\n\
         - Contact: {contact} ({title})\n\
         - Needs analysis: {needs}\n\
         \n\
         **Sender (my profile):**\n\
         - Name: {sender}\n\
         - Email: {sender_email}\n\
         - Website: {sender_site}\n\
         - My service: {service_name}\n\
         - Service description: {service_description}\n\
         \n\
         **Instructions for the email:**\n\
         1. Subject: short, intriguing, and personalized. For example: \"An idea for \
         {company}\" or \"Potential collaboration with {company}\".\n\
         2. Body:\n\
         \x20  - Open with a personalized greeting to {contact}.\n\
         \x20  - Briefly mention that you know their company, {company}.\n\
         \x20  - Building on the needs analysis, show you understand a challenge or \
         opportunity they have.\n\
         \x20  - Present '{service_name}' as the solution to that challenge, using the \
         service description to explain the key benefit in 1-2 sentences.\n\
         \x20  - Close with a clear, low-commitment call to action, such as \"Would you \
         have 15 minutes next week for a brief call?\".\n\
         \x20  - Add a cordial sign-off such as \"Best regards,\".\n\
         \x20  - Leave a blank line after the sign-off, then sign with the sender's name \
         ({sender}).\n\
         3. Output format: your reply MUST BE exclusively a valid JSON object. Do not \
         include text, explanations, or formatting markers such as ```json before or \
         after the object. The object must have exactly two keys: \"subject\" (string) \
         and \"body\" (string).",
        company = prospect.company_name,
        contact = prospect.contact.name,
        title = prospect.contact.title,
        needs = prospect.needs_analysis,
        sender = profile.name,
        sender_email = profile.contact_email,
        sender_site = profile.website_url,
        service_name = service.name,
        service_description = service.description,
    )
}
