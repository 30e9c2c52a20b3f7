//! Email/call snapshot semantics and persist-per-mutation behavior.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use prospector::domain::{Contact, EmailContent, Prospect};
use prospector::repository::Repository;
use prospector::store::{KvStore, MemoryKvStore};

fn prospect(id: &str, company: &str) -> Prospect {
    Prospect {
        id: id.to_owned(),
        company_name: company.to_owned(),
        website_url: format!("https://{company}.example"),
        contact: Contact {
            name: "Jo Kim".to_owned(),
            title: "Director".to_owned(),
            email: format!("jo@{company}.example"),
        },
        needs_analysis: "needs visibility".to_owned(),
        hire_probability: 50.0,
        sector: "retail".to_owned(),
        location: "Lima".to_owned(),
        date_added: Utc::now(),
    }
}

fn content(subject: &str) -> EmailContent {
    EmailContent {
        subject: subject.to_owned(),
        body: "Dear Jo:\n\nHello.".to_owned(),
    }
}

#[tokio::test]
async fn emails_prepend_newest_first_with_unique_ids() {
    let repo = Repository::open(Arc::new(MemoryKvStore::new())).await;
    let service = repo.add_service("SEO", "search visibility").await;

    let first = repo
        .add_email(
            prospect("a", "acme"),
            service.clone(),
            content("first").to_stored(),
        )
        .await;
    let second = repo
        .add_email(
            prospect("b", "bravo"),
            service,
            content("second").to_stored(),
        )
        .await;

    assert_ne!(first.id, second.id);
    let emails = repo.emails().await;
    let subjects: Vec<String> = emails
        .iter()
        .map(|e| e.content().expect("stored body parses").subject)
        .collect();
    assert_eq!(subjects, vec!["second", "first"]);
}

#[tokio::test]
async fn email_snapshots_survive_source_deletion() {
    let repo = Repository::open(Arc::new(MemoryKvStore::new())).await;
    let service = repo.add_service("SEO", "search visibility").await;
    let target = prospect("a", "acme");
    repo.add_prospects(vec![target.clone()]).await;

    repo.add_email(target, service.clone(), content("kept").to_stored())
        .await;

    // Delete both sources of the snapshot.
    repo.remove_service(&service.id).await;
    let doomed: HashSet<String> = ["a".to_owned()].into_iter().collect();
    repo.remove_prospects(&doomed).await;

    assert!(repo.services().await.is_empty());
    assert!(repo.prospects().await.is_empty());

    let emails = repo.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].service.name, "SEO");
    assert_eq!(emails[0].recipient.company_name, "acme");
}

#[tokio::test]
async fn remove_emails_by_id_set() {
    let repo = Repository::open(Arc::new(MemoryKvStore::new())).await;
    let service = repo.add_service("SEO", "x").await;

    let keep = repo
        .add_email(prospect("a", "acme"), service.clone(), content("keep").to_stored())
        .await;
    let gone = repo
        .add_email(prospect("b", "bravo"), service, content("drop").to_stored())
        .await;

    let doomed: HashSet<String> = [gone.id].into_iter().collect();
    repo.remove_emails(&doomed).await;

    let emails = repo.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].id, keep.id);
}

#[tokio::test]
async fn calls_follow_the_email_contract() {
    let repo = Repository::open(Arc::new(MemoryKvStore::new())).await;

    let first = repo
        .add_call(prospect("a", "acme"), "left voicemail", "no answer")
        .await;
    let second = repo
        .add_call(prospect("b", "bravo"), "spoke to Jo", "interested")
        .await;
    assert_ne!(first.id, second.id);

    let calls = repo.calls().await;
    let outcomes: Vec<&str> = calls.iter().map(|c| c.outcome.as_str()).collect();
    assert_eq!(outcomes, vec!["interested", "no answer"]);

    let doomed: HashSet<String> = [second.id].into_iter().collect();
    repo.remove_calls(&doomed).await;
    assert_eq!(repo.calls().await.len(), 1);
}

#[tokio::test]
async fn every_mutation_is_immediately_persisted() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    {
        let repo = Repository::open(Arc::clone(&store)).await;
        let service = repo.add_service("SEO", "x").await;
        repo.add_prospects(vec![prospect("a", "acme")]).await;
        repo.add_email(prospect("a", "acme"), service, content("s").to_stored())
            .await;
    }

    // A repository opened later over the same store sees everything.
    let reopened = Repository::open(store).await;
    assert_eq!(reopened.services().await.len(), 1);
    assert_eq!(reopened.prospects().await.len(), 1);
    assert_eq!(reopened.emails().await.len(), 1);
}
