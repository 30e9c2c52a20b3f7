//! Tests for the prospect-search orchestrator against a scripted generator.

use std::sync::Mutex;

use prospector::domain::Service;
use prospector::prospecting::{ProspectSearch, SearchError, SearchTuning};
use prospector::providers::{GenerationRequest, ProviderError, TextGenerator};

/// Generator double that records every request and replies with a fixed text.
struct FakeGenerator {
    reply: String,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_owned(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        self.calls.lock().expect("lock").push(request);
        Ok(self.reply.clone())
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}

fn seo() -> Service {
    Service::new("SEO", "search visibility for local businesses")
}

fn record(company: &str, email: &str, probability: f64) -> String {
    format!(
        r#"{{"companyName": "{company}", "websiteUrl": "https://{company}.example",
           "contact": {{"name": "Jo", "title": "Director", "email": "{email}"}},
           "needsAnalysis": "weak online presence", "hireProbability": {probability}}}"#
    )
}

#[tokio::test]
async fn search_parses_sorts_and_assigns_identity() {
    let reply = format!(
        "Here you go:\n```json\n[{}, {}, {}]\n```",
        record("acme", "jo@acme.example", 60.0),
        record("bravo", "jo@bravo.example", 95.0),
        record("cargo", "jo@cargo.example", 88.0),
    );
    let generator = FakeGenerator::replying(&reply);
    let search = ProspectSearch::new(&generator);

    let prospects = search
        .search(&seo(), "restaurantes", "CDMX")
        .await
        .expect("search should succeed");

    let probabilities: Vec<f64> = prospects.iter().map(|p| p.hire_probability).collect();
    assert_eq!(probabilities, vec![95.0, 88.0, 60.0]);

    // Sector/location backfilled from the inputs; identity assigned locally.
    assert!(prospects.iter().all(|p| p.sector == "restaurantes"));
    assert!(prospects.iter().all(|p| p.location == "CDMX"));
    assert!(prospects.iter().all(|p| !p.id.is_empty()));
    let mut ids: Vec<&str> = prospects.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3, "ids must be unique");
}

#[tokio::test]
async fn ties_keep_model_order() {
    let reply = format!(
        "[{}, {}, {}]",
        record("first", "a@first.example", 70.0),
        record("second", "a@second.example", 70.0),
        record("top", "a@top.example", 90.0),
    );
    let generator = FakeGenerator::replying(&reply);
    let prospects = ProspectSearch::new(&generator)
        .search(&seo(), "retail", "Lima")
        .await
        .expect("search should succeed");

    let companies: Vec<&str> = prospects.iter().map(|p| p.company_name.as_str()).collect();
    assert_eq!(companies, vec!["top", "first", "second"]);
}

#[tokio::test]
async fn out_of_range_probabilities_are_clamped() {
    let reply = format!(
        "[{}, {}]",
        record("hot", "a@hot.example", 140.0),
        record("cold", "a@cold.example", -5.0),
    );
    let generator = FakeGenerator::replying(&reply);
    let prospects = ProspectSearch::new(&generator)
        .search(&seo(), "retail", "Lima")
        .await
        .expect("search should succeed");

    let probabilities: Vec<f64> = prospects.iter().map(|p| p.hire_probability).collect();
    assert_eq!(probabilities, vec![100.0, 0.0]);
}

#[tokio::test]
async fn request_is_grounded_and_embeds_inputs() {
    let generator = FakeGenerator::replying(&format!("[{}]", record("acme", "a@b.c", 10.0)));
    let search = ProspectSearch::new(&generator).with_tuning(SearchTuning {
        result_target: 15,
        min_hire_probability: Some(80.0),
    });

    search
        .search(&seo(), "law firms", "Guatemala")
        .await
        .expect("search should succeed");

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].grounding, "prospect search must request grounding");
    assert!(calls[0].prompt.contains("Find 15 prospective clients"));
    assert!(calls[0].prompt.contains("law firms"));
    assert!(calls[0].prompt.contains("Guatemala"));
    assert!(calls[0].prompt.contains("at least 80"));
}

#[tokio::test]
async fn empty_inputs_fail_before_any_call() {
    let generator = FakeGenerator::replying("[]");
    let search = ProspectSearch::new(&generator);

    let err = search
        .search(&seo(), "  ", "CDMX")
        .await
        .expect_err("empty sector must fail");
    assert!(matches!(err, SearchError::MissingInput("sector")));

    let err = search
        .search(&seo(), "retail", "")
        .await
        .expect_err("empty location must fail");
    assert!(matches!(err, SearchError::MissingInput("location")));

    let unnamed = Service::new("  ", "whatever");
    let err = search
        .search(&unnamed, "retail", "CDMX")
        .await
        .expect_err("unnamed service must fail");
    assert!(matches!(err, SearchError::MissingInput("service")));

    assert!(generator.calls().is_empty(), "no call may be attempted");
}

#[tokio::test]
async fn record_without_contact_email_rejects_whole_batch() {
    let reply = format!(
        "[{}, {}]",
        record("good", "jo@good.example", 50.0),
        record("bad", "", 60.0),
    );
    let generator = FakeGenerator::replying(&reply);

    let err = ProspectSearch::new(&generator)
        .search(&seo(), "retail", "Lima")
        .await
        .expect_err("invalid record must reject the batch");
    assert!(matches!(
        err,
        SearchError::InvalidRecords {
            invalid: 1,
            total: 2
        }
    ));
}

#[tokio::test]
async fn non_json_reply_is_malformed() {
    let generator = FakeGenerator::replying("Sorry, I could not find any companies.");

    let err = ProspectSearch::new(&generator)
        .search(&seo(), "retail", "Lima")
        .await
        .expect_err("prose reply must fail");
    assert!(matches!(err, SearchError::Malformed(_)));
}

#[tokio::test]
async fn object_reply_is_malformed() {
    let generator = FakeGenerator::replying(r#"{"companies": []}"#);

    let err = ProspectSearch::new(&generator)
        .search(&seo(), "retail", "Lima")
        .await
        .expect_err("object reply must fail");
    assert!(matches!(err, SearchError::Malformed(_)));
}
