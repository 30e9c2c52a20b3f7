//! Domain entities: profile, services, prospects, generated emails, calls.
//!
//! All types serialize to camelCase JSON so the stored documents match the
//! shape the browser application kept in its storage keys. Emails and calls
//! embed full snapshots of the prospect and service they were created from,
//! so later mutation or deletion of the source never alters history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user's own identity, embedded into outreach prompts as the sender.
///
/// Exactly one instance exists; saving replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Sender name signed at the bottom of drafted emails.
    pub name: String,
    /// Sender contact email.
    pub contact_email: String,
    /// Sender website, mentioned in drafted emails.
    pub website_url: String,
}

/// A service the user offers, selectable when searching for prospects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Unique identifier, assigned at creation and immutable thereafter.
    pub id: String,
    /// Short service name (e.g. "SEO audit").
    pub name: String,
    /// Longer pitch used in prompts to explain the benefit.
    pub description: String,
}

impl Service {
    /// Create a service with a freshly assigned id.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Decision-maker contact at a prospect company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    /// Full name.
    pub name: String,
    /// Job title (e.g. "Marketing Director").
    pub title: String,
    /// Contact email address.
    pub email: String,
}

/// A candidate client company surfaced by a prospect search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    /// Unique identifier; merge identity key.
    pub id: String,
    /// Company name.
    pub company_name: String,
    /// Company website URL.
    pub website_url: String,
    /// Decision-maker contact.
    pub contact: Contact,
    /// Why this company would need the searched service.
    pub needs_analysis: String,
    /// Estimated probability (0–100) the company would hire.
    pub hire_probability: f64,
    /// Sector the search targeted.
    pub sector: String,
    /// Location the search targeted.
    pub location: String,
    /// When this prospect was ingested.
    pub date_added: DateTime<Utc>,
}

/// Clamp a model-reported probability into the valid [0, 100] range.
///
/// Out-of-range values are a data-quality defect in the upstream response
/// and must not propagate; non-finite values clamp to 0.
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// The subject/body pair produced by the drafting orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    /// Email subject line.
    pub subject: String,
    /// Email body text.
    pub body: String,
}

impl EmailContent {
    /// Serialize to the text form stored in [`GeneratedEmail::body`].
    pub fn to_stored(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A drafted outreach email, recorded with full snapshots of its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedEmail {
    /// Unique identifier.
    pub id: String,
    /// Snapshot of the prospect this email targets.
    pub recipient: Prospect,
    /// Snapshot of the service pitched.
    pub service: Service,
    /// Serialized [`EmailContent`] JSON.
    pub body: String,
    /// When this email was drafted.
    pub created_at: DateTime<Utc>,
}

impl GeneratedEmail {
    /// Recover the subject/body pair from the stored `body` text.
    ///
    /// Uses the same lenient parser applied to model output, so a stored
    /// document written by [`EmailContent::to_stored`] round-trips exactly.
    ///
    /// # Errors
    ///
    /// Returns [`crate::extract::MalformedResponse`] if the stored text does
    /// not contain a valid subject/body object.
    pub fn content(&self) -> Result<EmailContent, crate::extract::MalformedResponse> {
        let value = crate::extract::json_object(&self.body)?;
        serde_json::from_value(value)
            .map_err(|e| crate::extract::MalformedResponse::new(&self.body, e.to_string()))
    }
}

/// A logged call against a prospect; same creation/ordering contract as
/// [`GeneratedEmail`] (id and timestamp assigned at creation, newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedCall {
    /// Unique identifier.
    pub id: String,
    /// Snapshot of the prospect called.
    pub prospect: Prospect,
    /// Free-text notes taken during the call.
    pub notes: String,
    /// Call outcome (e.g. "interested", "no answer").
    pub outcome: String,
    /// When the call was logged.
    pub created_at: DateTime<Utc>,
}
