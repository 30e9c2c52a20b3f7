//! Owner of the persisted collections: profile, services, prospects,
//! emails, and logged calls.
//!
//! Every mutating operation updates the in-memory state and immediately
//! writes the full affected collection back to its fixed store key — no
//! batching, no write-ahead log. Write amplification is traded for crash
//! consistency, which is acceptable at user-scale data volumes.
//!
//! The repository takes its store by injection; nothing here is a process
//! singleton, so tests construct repositories over [`MemoryKvStore`]
//! (`crate::store::MemoryKvStore`) doubles.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{GeneratedEmail, LoggedCall, Profile, Prospect, Service};
use crate::store::{self, KvStore};

/// Store key holding the single profile object.
pub const KEY_PROFILE: &str = "profile";
/// Store key holding the service catalog.
pub const KEY_SERVICES: &str = "services";
/// Store key holding the prospect collection.
pub const KEY_PROSPECTS: &str = "prospects";
/// Store key holding the generated-email collection.
pub const KEY_EMAILS: &str = "emails";
/// Store key holding the logged-call collection.
pub const KEY_CALLS: &str = "calls";

#[derive(Default)]
struct State {
    profile: Profile,
    services: Vec<Service>,
    prospects: Vec<Prospect>,
    emails: Vec<GeneratedEmail>,
    calls: Vec<LoggedCall>,
}

/// Collection owner with mutate-then-persist semantics.
pub struct Repository {
    store: Arc<dyn KvStore>,
    state: RwLock<State>,
}

impl Repository {
    /// Open a repository over `store`, loading all collections.
    ///
    /// Missing or unreadable keys degrade to empty defaults — a fresh
    /// database and a corrupted one both start usable.
    pub async fn open(store: Arc<dyn KvStore>) -> Self {
        let state = State {
            profile: store::load(store.as_ref(), KEY_PROFILE, Profile::default()).await,
            services: store::load(store.as_ref(), KEY_SERVICES, Vec::new()).await,
            prospects: store::load(store.as_ref(), KEY_PROSPECTS, Vec::new()).await,
            emails: store::load(store.as_ref(), KEY_EMAILS, Vec::new()).await,
            calls: store::load(store.as_ref(), KEY_CALLS, Vec::new()).await,
        };
        Self {
            store,
            state: RwLock::new(state),
        }
    }

    // -- profile ------------------------------------------------------------

    /// Replace the profile wholesale and persist it.
    pub async fn set_profile(&self, profile: Profile) {
        let mut state = self.state.write().await;
        state.profile = profile;
        store::save(self.store.as_ref(), KEY_PROFILE, &state.profile).await;
    }

    /// Current profile.
    pub async fn profile(&self) -> Profile {
        self.state.read().await.profile.clone()
    }

    // -- services -----------------------------------------------------------

    /// Add a service to the catalog, assigning its id, and persist.
    pub async fn add_service(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Service {
        let service = Service::new(name, description);
        let mut state = self.state.write().await;
        state.services.push(service.clone());
        store::save(self.store.as_ref(), KEY_SERVICES, &state.services).await;
        service
    }

    /// Remove the service with `id`, if present, and persist.
    ///
    /// Emails that embedded this service keep their snapshot untouched.
    pub async fn remove_service(&self, id: &str) {
        let mut state = self.state.write().await;
        state.services.retain(|s| s.id != id);
        store::save(self.store.as_ref(), KEY_SERVICES, &state.services).await;
    }

    /// All services, in insertion order.
    pub async fn services(&self) -> Vec<Service> {
        self.state.read().await.services.clone()
    }

    /// Point lookup of a service by id.
    pub async fn service_by_id(&self, id: &str) -> Option<Service> {
        self.state
            .read()
            .await
            .services
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    // -- prospects ----------------------------------------------------------

    /// Merge a batch of prospects into the collection and persist.
    ///
    /// Union keyed by id: an incoming record replaces any existing record
    /// with the same id (last write wins, batch order defines "newer");
    /// unseen ids append in batch order. Merging the same batch twice is a
    /// no-op the second time.
    pub async fn add_prospects(&self, batch: Vec<Prospect>) {
        let mut state = self.state.write().await;
        for incoming in batch {
            match state.prospects.iter_mut().find(|p| p.id == incoming.id) {
                Some(existing) => *existing = incoming,
                None => state.prospects.push(incoming),
            }
        }
        debug!(count = state.prospects.len(), "prospect collection merged");
        store::save(self.store.as_ref(), KEY_PROSPECTS, &state.prospects).await;
    }

    /// Remove every prospect whose id is in `ids` and persist.
    pub async fn remove_prospects(&self, ids: &HashSet<String>) {
        let mut state = self.state.write().await;
        state.prospects.retain(|p| !ids.contains(&p.id));
        store::save(self.store.as_ref(), KEY_PROSPECTS, &state.prospects).await;
    }

    /// All prospects, in merge order.
    pub async fn prospects(&self) -> Vec<Prospect> {
        self.state.read().await.prospects.clone()
    }

    /// Prospects sorted by hire probability, highest first (stable).
    pub async fn prospects_by_probability(&self) -> Vec<Prospect> {
        let mut prospects = self.state.read().await.prospects.clone();
        prospects.sort_by(|a, b| b.hire_probability.total_cmp(&a.hire_probability));
        prospects
    }

    /// Point lookup of a prospect by id.
    ///
    /// Reads the persisted collection, not the cached view, so a repository
    /// constructed independently over the same store observes the latest
    /// write rather than a stale snapshot.
    pub async fn prospect_by_id(&self, id: &str) -> Option<Prospect> {
        let prospects: Vec<Prospect> =
            store::load(self.store.as_ref(), KEY_PROSPECTS, Vec::new()).await;
        prospects.into_iter().find(|p| p.id == id)
    }

    // -- emails -------------------------------------------------------------

    /// Record a generated email, assigning id and timestamp, and persist.
    ///
    /// `recipient` and `service` are stored as full snapshots; `body` is the
    /// serialized subject/body document. Newest entries come first.
    pub async fn add_email(
        &self,
        recipient: Prospect,
        service: Service,
        body: String,
    ) -> GeneratedEmail {
        let email = GeneratedEmail {
            id: Uuid::new_v4().to_string(),
            recipient,
            service,
            body,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.emails.insert(0, email.clone());
        store::save(self.store.as_ref(), KEY_EMAILS, &state.emails).await;
        email
    }

    /// Remove every email whose id is in `ids` and persist.
    pub async fn remove_emails(&self, ids: &HashSet<String>) {
        let mut state = self.state.write().await;
        state.emails.retain(|e| !ids.contains(&e.id));
        store::save(self.store.as_ref(), KEY_EMAILS, &state.emails).await;
    }

    /// All generated emails, newest first.
    pub async fn emails(&self) -> Vec<GeneratedEmail> {
        self.state.read().await.emails.clone()
    }

    // -- calls --------------------------------------------------------------

    /// Record a logged call, assigning id and timestamp, and persist.
    pub async fn add_call(
        &self,
        prospect: Prospect,
        notes: impl Into<String>,
        outcome: impl Into<String>,
    ) -> LoggedCall {
        let call = LoggedCall {
            id: Uuid::new_v4().to_string(),
            prospect,
            notes: notes.into(),
            outcome: outcome.into(),
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.calls.insert(0, call.clone());
        store::save(self.store.as_ref(), KEY_CALLS, &state.calls).await;
        call
    }

    /// Remove every call whose id is in `ids` and persist.
    pub async fn remove_calls(&self, ids: &HashSet<String>) {
        let mut state = self.state.write().await;
        state.calls.retain(|c| !ids.contains(&c.id));
        store::save(self.store.as_ref(), KEY_CALLS, &state.calls).await;
    }

    /// All logged calls, newest first.
    pub async fn calls(&self) -> Vec<LoggedCall> {
        self.state.read().await.calls.clone()
    }
}
