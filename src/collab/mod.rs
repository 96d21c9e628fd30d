//! Collaborator seams — the external capabilities the core calls.
//!
//! Each trait is an opaque async capability (LLM generation, claim
//! verification, product-discovery scraping, seed research). Failures
//! surface as `anyhow::Error` and are always recovered at the call site;
//! they never propagate past the stage that made the call. Deterministic
//! in-process implementations live in [`mock`].

pub mod mock;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::model::{AgentRole, Citation};

/// Stream of text chunks from an argument generator.
pub type ArgumentStream = BoxStream<'static, Result<String>>;

/// Inputs for one advocate or critic generation.
#[derive(Debug, Clone)]
pub struct ArgumentRequest {
    /// Which side is arguing.
    pub role: AgentRole,
    pub idea: String,
    pub criteria: Vec<String>,
    /// Bounded rendering of recent debate history.
    pub context: String,
    /// The argument being rebutted (critic only).
    pub opposing_argument: Option<String>,
}

/// Streams an argument for or against an idea.
///
/// Advocate and critic share this shape; the request carries the role and,
/// for the critic, the advocate's text to rebut.
#[async_trait]
pub trait ArgumentGenerator: Send + Sync {
    async fn argue(&self, request: ArgumentRequest) -> Result<ArgumentStream>;

    /// Provenance label recorded in node metadata.
    fn model_name(&self) -> &str;
}

/// A chat message for structured-reasoning calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generic chat capability for extraction, classification, reflection, and
/// verdict synthesis.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send messages and return the model's text. When `json` is true the
    /// caller expects a JSON payload (possibly fenced) in the response.
    async fn chat(&self, messages: &[ChatMessage], json: bool) -> Result<String>;

    /// Provenance label recorded in node metadata.
    fn model_name(&self) -> &str;
}

/// Free-text verification response for a batch of claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub summary: String,
    pub citations: Vec<Citation>,
}

/// External claim-verification service.
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    async fn verify(&self, claims: &[String], context: &str) -> Result<VerificationReport>;
}

/// One hit from a product-discovery source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeEntry {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Evidence returned by one discovery source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// Which source produced this report.
    pub source: String,
    /// Product-style hits.
    #[serde(default)]
    pub results: Vec<ScrapeEntry>,
    /// Code-host-style hits.
    #[serde(default)]
    pub repositories: Vec<ScrapeEntry>,
}

/// A product-discovery source (Product-Hunt-like, code-host-like).
#[async_trait]
pub trait DiscoveryScraper: Send + Sync {
    /// Stable source tag used on citations.
    fn source(&self) -> &str;

    async fn scrape(&self, query: &str) -> Result<ScrapeReport>;
}

/// Result of a seed-research call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub summary: String,
    pub citations: Vec<Citation>,
}

/// Seed research run when a debate is created.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn prior_art(&self, idea: &str) -> Result<ResearchSummary>;

    async fn market_analysis(&self, idea: &str, criteria: &[String]) -> Result<ResearchSummary>;
}

/// The full set of collaborators a round needs.
#[derive(Clone)]
pub struct Collaborators {
    /// Shared by the advocate and critic stages.
    pub arguments: Arc<dyn ArgumentGenerator>,
    pub chat: Arc<dyn ChatModel>,
    pub verifier: Arc<dyn ClaimVerifier>,
    /// Independent discovery sources, queried concurrently.
    pub scrapers: Vec<Arc<dyn DiscoveryScraper>>,
    pub research: Arc<dyn ResearchProvider>,
}
