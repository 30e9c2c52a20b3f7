//! Prospect-search orchestrator.
//!
//! Turns a (service, sector, location) triple into a grounded generation
//! request, recovers the JSON array from the model's reply, and maps it
//! into typed [`Prospect`] records with assigned ids and timestamps. The
//! caller decides whether to persist the batch.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::{clamp_probability, Contact, Prospect, Service};
use crate::extract::{self, MalformedResponse};
use crate::providers::{GenerationRequest, ProviderError, TextGenerator};

/// Tunable search parameters.
///
/// Target count and probability floor varied across revisions of the
/// original prompts; they are configuration, not contract.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTuning {
    /// How many companies to ask the model for.
    pub result_target: u32,
    /// When set, instruct the model to only include companies at or above
    /// this estimated hire probability.
    pub min_hire_probability: Option<f64>,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            result_target: 20,
            min_hire_probability: None,
        }
    }
}

/// Errors from a prospect search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A required input was missing or empty; no call was attempted.
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
    /// The generation collaborator failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The model's reply could not be reduced to the expected JSON array.
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),
    /// The array parsed but some records were unusable. The whole batch is
    /// rejected rather than partially trusted.
    #[error("{invalid} of {total} returned records lack a company name or contact email")]
    InvalidRecords {
        /// Number of rejected records.
        invalid: usize,
        /// Total records in the reply.
        total: usize,
    },
}

/// Per-record shape the model is asked to emit. Ids and ingestion dates are
/// assigned on receipt, never requested from the model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireProspect {
    company_name: String,
    website_url: String,
    contact: Contact,
    needs_analysis: String,
    hire_probability: f64,
    sector: String,
    location: String,
}

impl Default for WireProspect {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            website_url: String::new(),
            contact: Contact::default(),
            needs_analysis: String::new(),
            hire_probability: 0.0,
            sector: String::new(),
            location: String::new(),
        }
    }
}

/// Prospect-search orchestrator over an injected text generator.
pub struct ProspectSearch<'a> {
    generator: &'a dyn TextGenerator,
    tuning: SearchTuning,
}

impl<'a> ProspectSearch<'a> {
    /// Create an orchestrator with default tuning.
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator,
            tuning: SearchTuning::default(),
        }
    }

    /// Override the search tuning.
    #[must_use]
    pub fn with_tuning(mut self, tuning: SearchTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Search for prospective clients of `service` in `sector` / `location`.
    ///
    /// Invokes the generator with web-search grounding, parses the reply,
    /// clamps probabilities, assigns ids and timestamps, and returns the
    /// batch sorted by hire probability descending (stable; ties keep the
    /// model's order).
    ///
    /// # Errors
    ///
    /// Fails fast with [`SearchError::MissingInput`] on empty inputs;
    /// otherwise surfaces provider and parse failures. A reply containing
    /// any record without a company name or contact email is rejected as a
    /// whole with [`SearchError::InvalidRecords`].
    pub async fn search(
        &self,
        service: &Service,
        sector: &str,
        location: &str,
    ) -> Result<Vec<Prospect>, SearchError> {
        if service.name.trim().is_empty() {
            return Err(SearchError::MissingInput("service"));
        }
        let sector = sector.trim();
        if sector.is_empty() {
            return Err(SearchError::MissingInput("sector"));
        }
        let location = location.trim();
        if location.is_empty() {
            return Err(SearchError::MissingInput("location"));
        }

        let prompt = self.build_prompt(service, sector, location);
        info!(
            sector,
            location,
            service = %service.name,
            model = self.generator.model_id(),
            "searching for prospects"
        );

        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt).grounded())
            .await?;

        let value = extract::json_array(&raw)?;
        let records: Vec<WireProspect> = serde_json::from_value(value)
            .map_err(|e| MalformedResponse::new(&raw, e.to_string()))?;

        let total = records.len();
        let invalid = records
            .iter()
            .filter(|r| r.company_name.trim().is_empty() || r.contact.email.trim().is_empty())
            .count();
        if invalid > 0 {
            return Err(SearchError::InvalidRecords { invalid, total });
        }

        let now = Utc::now();
        let mut prospects: Vec<Prospect> = records
            .into_iter()
            .map(|r| Prospect {
                id: Uuid::new_v4().to_string(),
                company_name: r.company_name,
                website_url: r.website_url,
                contact: r.contact,
                needs_analysis: r.needs_analysis,
                hire_probability: clamp_probability(r.hire_probability),
                sector: if r.sector.is_empty() {
                    sector.to_owned()
                } else {
                    r.sector
                },
                location: if r.location.is_empty() {
                    location.to_owned()
                } else {
                    r.location
                },
                date_added: now,
            })
            .collect();

        prospects.sort_by(|a, b| b.hire_probability.total_cmp(&a.hire_probability));
        info!(count = prospects.len(), "prospect search completed");
        Ok(prospects)
    }

    fn build_prompt(&self, service: &Service, sector: &str, location: &str) -> String {
        let floor = match self.tuning.min_hire_probability {
            Some(min) => format!(
                "Only include companies whose estimated hire probability is at least {min:.0}.\n"
            ),
            None => String::new(),
        };
        format!(
            "Find {target} prospective clients. Your goal is to identify real, active \
             companies in the '{sector}' sector in '{location}' that would benefit from my \
             service: '{name}' ({description}).\n\
             \n\
             For each company, use web search to find a manager, director, or other relevant \
             decision-maker, for example on LinkedIn. It is CRITICAL that you obtain this \
             person's contact email address; skip companies where you cannot.\n\
             {floor}\
             \n\
             Return the results exclusively as a valid JSON array with no other text or \
             explanation. Each element must have this structure:\n\
             {{\n\
             \x20 \"companyName\": \"string\",\n\
             \x20 \"websiteUrl\": \"string (company website URL)\",\n\
             \x20 \"contact\": {{\n\
             \x20   \"name\": \"string (full name of the decision-maker)\",\n\
             \x20   \"title\": \"string (exact job title, e.g. 'Marketing Director')\",\n\
             \x20   \"email\": \"string (VALID and REQUIRED contact email)\"\n\
             \x20 }},\n\
             \x20 \"needsAnalysis\": \"string (brief, specific analysis of why this company \
             needs '{name}')\",\n\
             \x20 \"hireProbability\": number (0-100 estimate that they would hire),\n\
             \x20 \"sector\": \"{sector}\",\n\
             \x20 \"location\": \"{location}\"\n\
             }}\n\
             \n\
             Make sure the response is pure JSON. Do not include markers such as ```json.",
            target = self.tuning.result_target,
            name = service.name,
            description = service.description,
        )
    }
}
