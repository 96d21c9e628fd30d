//! Evidence gathering and rendering for the judge pipeline: concurrent
//! discovery scrapes, prompt digests, and citation aggregation.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::warn;

use crate::collab::{DiscoveryScraper, ScrapeReport};
use crate::model::{preview, Citation, ClaimVerification};

/// Query every discovery source concurrently, settling each outcome
/// independently — one source failing never cancels the other. Only
/// fulfilled reports are returned.
pub async fn settle_scrapes(
    scrapers: &[Arc<dyn DiscoveryScraper>],
    query: &str,
) -> Vec<ScrapeReport> {
    let outcomes: Vec<Result<ScrapeReport>> =
        join_all(scrapers.iter().map(|s| s.scrape(query))).await;

    let mut reports = Vec::new();
    for (scraper, outcome) in scrapers.iter().zip(outcomes) {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => warn!(source = scraper.source(), error = %e, "discovery scrape failed"),
        }
    }
    reports
}

/// Render verification results for the reflection prompt: one
/// `claim → status` line per claim, or a fixed sentence when empty.
pub fn verification_digest(verifications: &[ClaimVerification]) -> String {
    if verifications.is_empty() {
        return "No claims were verified.".to_string();
    }
    verifications
        .iter()
        .map(|v| format!("{} → {}", v.claim, v.status))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render scraped evidence for the reflection prompt: each report
/// serialized and capped, or a fixed sentence when empty.
pub fn scrape_digest(reports: &[ScrapeReport], max_chars: usize) -> String {
    if reports.is_empty() {
        return "No web scraping results.".to_string();
    }
    reports
        .iter()
        .map(|report| {
            let serialized = serde_json::to_string(report).unwrap_or_default();
            preview(&serialized, max_chars)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Aggregate every citation gathered this round: verification citations
/// first, then per report its `results` urls followed by its
/// `repositories` urls, in scrape-source-array order.
pub fn aggregate_citations(
    verification_citations: &[Citation],
    reports: &[ScrapeReport],
) -> Vec<Citation> {
    let mut citations: Vec<Citation> = verification_citations.to_vec();
    for report in reports {
        for entry in report.results.iter().chain(report.repositories.iter()) {
            citations.push(Citation {
                url: entry.url.clone(),
                title: entry.title.clone(),
                snippet: entry.description.clone(),
                source: report.source.clone(),
            });
        }
    }
    citations
}
