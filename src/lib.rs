//! Prospector — an AI-backed B2B prospecting assistant.
//!
//! Discovers prospective client companies through a generative-AI text
//! endpoint with web-search grounding, drafts personalized outreach emails,
//! and keeps all state in a local SQLite key/value store. Optionally pushes
//! drafts into a connected Gmail mailbox.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod export;
pub mod extract;
pub mod logging;
pub mod mailbox;
pub mod outreach;
pub mod prospecting;
pub mod providers;
pub mod repository;
pub mod store;
