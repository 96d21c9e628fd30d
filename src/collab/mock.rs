//! Deterministic mock collaborators.
//!
//! Used by tests and by callers with no live providers configured. Each
//! mock produces fixed output and supports failure injection so the
//! degradation paths can be exercised without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;

use super::{
    ArgumentGenerator, ArgumentRequest, ArgumentStream, ChatMessage, ChatModel, ClaimVerifier,
    DiscoveryScraper, ResearchProvider, ResearchSummary, ScrapeEntry, ScrapeReport,
    VerificationReport,
};
use crate::model::Citation;

/// Failure mode for [`MockArgumentGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentFailure {
    /// Generation succeeds.
    None,
    /// `argue` itself fails.
    Immediate,
    /// The stream yields two chunks then an error.
    MidStream,
}

/// Argument generator yielding a fixed three-chunk argument.
pub struct MockArgumentGenerator {
    failure: ArgumentFailure,
}

impl MockArgumentGenerator {
    pub fn new() -> Self {
        Self {
            failure: ArgumentFailure::None,
        }
    }

    pub fn failing() -> Self {
        Self {
            failure: ArgumentFailure::Immediate,
        }
    }

    pub fn failing_mid_stream() -> Self {
        Self {
            failure: ArgumentFailure::MidStream,
        }
    }
}

impl Default for MockArgumentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArgumentGenerator for MockArgumentGenerator {
    async fn argue(&self, request: ArgumentRequest) -> Result<ArgumentStream> {
        match self.failure {
            ArgumentFailure::Immediate => Err(anyhow!("mock generator unavailable")),
            ArgumentFailure::MidStream => {
                let chunks: Vec<Result<String>> = vec![
                    Ok(format!("The {} begins to argue ", request.role)),
                    Ok("but then ".to_string()),
                    Err(anyhow!("mock stream interrupted")),
                ];
                Ok(stream::iter(chunks).boxed())
            }
            ArgumentFailure::None => {
                let chunks: Vec<Result<String>> = vec![
                    Ok(format!("As the {}, ", request.role)),
                    Ok(format!("I assess \"{}\" ", request.idea)),
                    Ok("on its merits.".to_string()),
                ];
                Ok(stream::iter(chunks).boxed())
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock-arguer"
    }
}

/// Chat model that replays a script of responses in order.
///
/// Each `chat` call pops the next entry; an exhausted script fails the
/// call, which exercises the per-step degradation paths.
pub struct MockChatModel {
    script: Mutex<Vec<String>>,
    cursor: AtomicUsize,
    fail_always: bool,
}

impl MockChatModel {
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses),
            cursor: AtomicUsize::new(0),
            fail_always: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            cursor: AtomicUsize::new(0),
            fail_always: true,
        }
    }

    /// Script covering one full judge pass: extraction, classification,
    /// reflection, and a structured verdict.
    pub fn full_judge_script() -> Self {
        Self::scripted(vec![
            r#"[{"claim": "The market for this is growing 20% a year", "source": "advocate"},
                {"claim": "No incumbent offers this feature", "source": "critic"}]"#
                .to_string(),
            r#"[{"claim": "The market for this is growing 20% a year", "category": "factual"},
                {"claim": "No incumbent offers this feature", "category": "vague"}]"#
                .to_string(),
            "The evidence is thin but leans positive; the advocate's growth claim held up."
                .to_string(),
            r#"{"recommendation": "pursue", "score": 72,
                "reasoning": "Growth claim verified and no contradicting evidence.",
                "strengths": ["verified market growth"],
                "weaknesses": ["little competitive data"],
                "risks": ["unvalidated demand"],
                "next_steps": ["build a landing-page test"]}"#
                .to_string(),
        ])
    }

    /// How many chat calls were made.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _messages: &[ChatMessage], _json: bool) -> Result<String> {
        if self.fail_always {
            return Err(anyhow!("mock chat unavailable"));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let script = self.script.lock().expect("mock script lock");
        script
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("mock chat script exhausted at call {}", index))
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Claim verifier returning either a fixed summary or a per-claim canned
/// narration.
pub struct MockClaimVerifier {
    /// Returned verbatim when set; otherwise a canned narration is built
    /// from the submitted claims.
    summary: Option<String>,
    citations: Vec<Citation>,
    fail: bool,
}

impl MockClaimVerifier {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            citations: Vec::new(),
            fail: false,
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn failing() -> Self {
        Self {
            summary: None,
            citations: Vec::new(),
            fail: true,
        }
    }

    /// Deterministic default: every submitted claim reads as verified.
    pub fn canned() -> Self {
        Self {
            summary: None,
            citations: Vec::new(),
            fail: false,
        }
    }
}

#[async_trait]
impl ClaimVerifier for MockClaimVerifier {
    async fn verify(&self, claims: &[String], _context: &str) -> Result<VerificationReport> {
        if self.fail {
            return Err(anyhow!("mock verifier unavailable"));
        }
        let summary = match &self.summary {
            Some(fixed) => fixed.clone(),
            None => claims
                .iter()
                .map(|c| format!("{} — verified against public sources.", c))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Ok(VerificationReport {
            summary,
            citations: self.citations.clone(),
        })
    }
}

/// Discovery scraper returning fixed entries for its source.
pub struct MockScraper {
    source: String,
    results: Vec<ScrapeEntry>,
    repositories: Vec<ScrapeEntry>,
    fail: bool,
}

impl MockScraper {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            results: Vec::new(),
            repositories: Vec::new(),
            fail: false,
        }
    }

    pub fn with_results(mut self, urls: &[&str]) -> Self {
        self.results = urls
            .iter()
            .map(|u| ScrapeEntry {
                url: u.to_string(),
                title: format!("result for {}", u),
                description: None,
            })
            .collect();
        self
    }

    pub fn with_repositories(mut self, urls: &[&str]) -> Self {
        self.repositories = urls
            .iter()
            .map(|u| ScrapeEntry {
                url: u.to_string(),
                title: format!("repository {}", u),
                description: None,
            })
            .collect();
        self
    }

    pub fn failing(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            results: Vec::new(),
            repositories: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DiscoveryScraper for MockScraper {
    fn source(&self) -> &str {
        &self.source
    }

    async fn scrape(&self, _query: &str) -> Result<ScrapeReport> {
        if self.fail {
            return Err(anyhow!("mock scraper {} unavailable", self.source));
        }
        Ok(ScrapeReport {
            source: self.source.clone(),
            results: self.results.clone(),
            repositories: self.repositories.clone(),
        })
    }
}

/// Seed-research provider with per-call failure switches.
pub struct MockResearchProvider {
    fail_prior_art: bool,
    fail_market: bool,
}

impl MockResearchProvider {
    pub fn new() -> Self {
        Self {
            fail_prior_art: false,
            fail_market: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_prior_art: true,
            fail_market: true,
        }
    }

    pub fn prior_art_only() -> Self {
        Self {
            fail_prior_art: false,
            fail_market: true,
        }
    }
}

impl Default for MockResearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResearchProvider for MockResearchProvider {
    async fn prior_art(&self, idea: &str) -> Result<ResearchSummary> {
        if self.fail_prior_art {
            return Err(anyhow!("mock prior-art search unavailable"));
        }
        Ok(ResearchSummary {
            summary: format!("Three comparable products exist for \"{}\".", idea),
            citations: vec![Citation {
                url: "https://example.com/prior-art".to_string(),
                title: "Prior art survey".to_string(),
                snippet: None,
                source: "prior_art".to_string(),
            }],
        })
    }

    async fn market_analysis(&self, idea: &str, _criteria: &[String]) -> Result<ResearchSummary> {
        if self.fail_market {
            return Err(anyhow!("mock market analysis unavailable"));
        }
        Ok(ResearchSummary {
            summary: format!("The addressable market for \"{}\" is modest but growing.", idea),
            citations: vec![Citation {
                url: "https://example.com/market".to_string(),
                title: "Market analysis".to_string(),
                snippet: None,
                source: "market_analysis".to_string(),
            }],
        })
    }
}
