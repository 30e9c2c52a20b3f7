//! Prospector CLI — profile and service management, prospect search,
//! outreach drafting, and CSV export over a local SQLite store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use prospector::config::ProspectorConfig;
use prospector::domain::Profile;
use prospector::mailbox::{DraftMailbox, GmailMailbox};
use prospector::outreach::{CancelFlag, OutreachDrafter};
use prospector::prospecting::{ProspectSearch, SearchTuning};
use prospector::providers::gemini::GeminiProvider;
use prospector::repository::Repository;
use prospector::store::SqliteKvStore;

#[derive(Parser)]
#[command(name = "prospector", version, about = "AI-backed B2B prospecting assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or replace the sender profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage the service catalog.
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Search for prospective clients of a service.
    Search {
        /// Id of the service to pitch.
        #[arg(long)]
        service: String,
        /// Target sector (e.g. "restaurants").
        #[arg(long)]
        sector: String,
        /// Target location (e.g. "Mexico City").
        #[arg(long)]
        location: String,
    },
    /// List or remove stored prospects.
    Prospects {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Draft outreach emails for stored prospects.
    Draft {
        /// Id of the service to pitch.
        #[arg(long)]
        service: String,
        /// Draft for a single prospect id.
        #[arg(long, conflicts_with = "all")]
        prospect: Option<String>,
        /// Draft for every stored prospect.
        #[arg(long)]
        all: bool,
        /// Also create a draft in the connected Gmail mailbox.
        #[arg(long)]
        gmail: bool,
    },
    /// List or remove generated emails.
    Emails {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Log or list calls against prospects.
    Calls {
        #[command(subcommand)]
        action: CallsAction,
    },
    /// Export the generated emails as CSV.
    Export {
        /// Output file path.
        #[arg(long, default_value = "emails.csv")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Replace the profile wholesale.
    Set {
        /// Sender name signed at the bottom of drafted emails.
        #[arg(long)]
        name: String,
        /// Sender contact email.
        #[arg(long, default_value = "")]
        email: String,
        /// Sender website.
        #[arg(long, default_value = "")]
        website: String,
    },
    /// Print the current profile.
    Show,
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Add a service to the catalog.
    Add {
        /// Short service name.
        #[arg(long)]
        name: String,
        /// Longer pitch used in prompts.
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List catalog entries.
    List,
    /// Remove a service by id.
    Remove {
        /// Service id.
        id: String,
    },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// List entries.
    List,
    /// Remove entries by id.
    Remove {
        /// Ids to remove.
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CallsAction {
    /// Log a call against a prospect.
    Log {
        /// Prospect id.
        #[arg(long)]
        prospect: String,
        /// Free-text notes.
        #[arg(long, default_value = "")]
        notes: String,
        /// Outcome (e.g. "interested", "no answer").
        #[arg(long, default_value = "")]
        outcome: String,
    },
    /// List logged calls, newest first.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    prospector::logging::init_cli();

    let cli = Cli::parse();
    let config = ProspectorConfig::load().context("failed to load configuration")?;

    let store = SqliteKvStore::open(Path::new(&config.paths.database))
        .await
        .context("failed to open state database")?;
    let repository = Repository::open(Arc::new(store)).await;

    match cli.command {
        Command::Profile { action } => run_profile(&repository, action).await,
        Command::Service { action } => run_service(&repository, action).await,
        Command::Search {
            service,
            sector,
            location,
        } => run_search(&repository, &config, &service, &sector, &location).await,
        Command::Prospects { action } => run_prospects(&repository, action).await,
        Command::Draft {
            service,
            prospect,
            all,
            gmail,
        } => run_draft(&repository, &config, &service, prospect, all, gmail).await,
        Command::Emails { action } => run_emails(&repository, action).await,
        Command::Calls { action } => run_calls(&repository, action).await,
        Command::Export { out } => run_export(&repository, &out).await,
    }
}

async fn run_profile(repository: &Repository, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Set {
            name,
            email,
            website,
        } => {
            repository
                .set_profile(Profile {
                    name,
                    contact_email: email,
                    website_url: website,
                })
                .await;
            println!("Profile saved.");
        }
        ProfileAction::Show => {
            let profile = repository.profile().await;
            if profile.name.is_empty() {
                println!("No profile configured. Run `prospector profile set --name ...`.");
            } else {
                println!("Name:    {}", profile.name);
                println!("Email:   {}", profile.contact_email);
                println!("Website: {}", profile.website_url);
            }
        }
    }
    Ok(())
}

async fn run_service(repository: &Repository, action: ServiceAction) -> Result<()> {
    match action {
        ServiceAction::Add { name, description } => {
            let service = repository.add_service(name, description).await;
            println!("Added service {} ({})", service.name, service.id);
        }
        ServiceAction::List => {
            let services = repository.services().await;
            if services.is_empty() {
                println!("No services configured.");
            }
            for service in services {
                println!("{}  {} — {}", service.id, service.name, service.description);
            }
        }
        ServiceAction::Remove { id } => {
            repository.remove_service(&id).await;
            println!("Removed service {id}.");
        }
    }
    Ok(())
}

async fn run_search(
    repository: &Repository,
    config: &ProspectorConfig,
    service_id: &str,
    sector: &str,
    location: &str,
) -> Result<()> {
    let Some(service) = repository.service_by_id(service_id).await else {
        bail!("unknown service id: {service_id}");
    };

    let generator = GeminiProvider::new(&config.llm.model, &config.llm.api_key);
    let search = ProspectSearch::new(&generator).with_tuning(SearchTuning {
        result_target: config.search.result_target,
        min_hire_probability: config.search.min_hire_probability,
    });

    let prospects = search
        .search(&service, sector, location)
        .await
        .context("prospect search failed")?;

    println!("Found {} prospects:", prospects.len());
    for prospect in &prospects {
        println!(
            "{:>5.1}%  {}  {}  {} <{}>",
            prospect.hire_probability,
            prospect.id,
            prospect.company_name,
            prospect.contact.name,
            prospect.contact.email,
        );
    }

    repository.add_prospects(prospects).await;
    Ok(())
}

async fn run_prospects(repository: &Repository, action: CollectionAction) -> Result<()> {
    match action {
        CollectionAction::List => {
            let prospects = repository.prospects_by_probability().await;
            if prospects.is_empty() {
                println!("No stored prospects.");
            }
            for prospect in prospects {
                println!(
                    "{:>5.1}%  {}  {}  {} <{}>",
                    prospect.hire_probability,
                    prospect.id,
                    prospect.company_name,
                    prospect.contact.name,
                    prospect.contact.email,
                );
            }
        }
        CollectionAction::Remove { ids } => {
            let ids: HashSet<String> = ids.into_iter().collect();
            repository.remove_prospects(&ids).await;
            println!("Removed {} prospect(s).", ids.len());
        }
    }
    Ok(())
}

async fn run_draft(
    repository: &Repository,
    config: &ProspectorConfig,
    service_id: &str,
    prospect_id: Option<String>,
    all: bool,
    gmail: bool,
) -> Result<()> {
    let Some(service) = repository.service_by_id(service_id).await else {
        bail!("unknown service id: {service_id}");
    };
    let profile = repository.profile().await;

    let prospects = if all {
        repository.prospects_by_probability().await
    } else {
        let Some(id) = prospect_id else {
            bail!("pass --prospect <id> or --all");
        };
        match repository.prospect_by_id(&id).await {
            Some(prospect) => vec![prospect],
            None => bail!("unknown prospect id: {id}"),
        }
    };
    if prospects.is_empty() {
        bail!("no prospects to draft for; run `prospector search` first");
    }

    let generator = GeminiProvider::new(&config.llm.model, &config.llm.api_key);
    let gmail_mailbox = if gmail {
        if config.mailbox.access_token.is_empty() {
            bail!("--gmail requires a mailbox access token (PROSPECTOR_GMAIL_TOKEN)");
        }
        Some(GmailMailbox::new(&config.mailbox.access_token))
    } else {
        None
    };

    let mut drafter = OutreachDrafter::new(&generator, repository);
    if let Some(mailbox) = &gmail_mailbox {
        drafter = drafter.with_mailbox(mailbox as &dyn DraftMailbox);
    }

    let summary = drafter
        .draft_emails_for(&prospects, &service, &profile, &CancelFlag::new(), |p| {
            println!("{}", p.status_line());
        })
        .await;

    println!(
        "{} of {} emails drafted and saved. {} failed.",
        summary.succeeded, summary.total, summary.failed
    );
    Ok(())
}

async fn run_emails(repository: &Repository, action: CollectionAction) -> Result<()> {
    match action {
        CollectionAction::List => {
            let emails = repository.emails().await;
            if emails.is_empty() {
                println!("No generated emails.");
            }
            for email in emails {
                let subject = email.content().map(|c| c.subject).unwrap_or_default();
                println!(
                    "{}  {}  {}  {}",
                    email.created_at.format("%Y-%m-%d %H:%M"),
                    email.id,
                    email.recipient.company_name,
                    subject,
                );
            }
        }
        CollectionAction::Remove { ids } => {
            let ids: HashSet<String> = ids.into_iter().collect();
            repository.remove_emails(&ids).await;
            println!("Removed {} email(s).", ids.len());
        }
    }
    Ok(())
}

async fn run_calls(repository: &Repository, action: CallsAction) -> Result<()> {
    match action {
        CallsAction::Log {
            prospect,
            notes,
            outcome,
        } => {
            let Some(prospect) = repository.prospect_by_id(&prospect).await else {
                bail!("unknown prospect id: {prospect}");
            };
            let call = repository.add_call(prospect, notes, outcome).await;
            println!("Logged call {} for {}.", call.id, call.prospect.company_name);
        }
        CallsAction::List => {
            let calls = repository.calls().await;
            if calls.is_empty() {
                println!("No logged calls.");
            }
            for call in calls {
                println!(
                    "{}  {}  {}  {}",
                    call.created_at.format("%Y-%m-%d %H:%M"),
                    call.id,
                    call.prospect.company_name,
                    call.outcome,
                );
            }
        }
    }
    Ok(())
}

async fn run_export(repository: &Repository, out: &Path) -> Result<()> {
    let emails = repository.emails().await;
    let mut file = std::fs::File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    prospector::export::write_emails_csv(&emails, &mut file).context("export failed")?;
    println!("Exported {} email(s) to {}.", emails.len(), out.display());
    Ok(())
}
