//! Parsing for the claim steps: extraction and classification output from
//! the chat model, and the substring heuristic that maps a free-text
//! verification summary back onto individual claims.
//!
//! Every parser here degrades instead of failing: bad extraction JSON means
//! zero claims, bad classification JSON means everything defaults to
//! `vague`, and an unmatchable verification summary leaves claims
//! `unverified`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::model::{
    AgentRole, Claim, ClaimCategory, ClaimVerification, ClassifiedClaim, VerificationStatus,
};

/// How far past the claim's leading text the keyword scan reaches.
const KEYWORD_WINDOW_CHARS: usize = 200;

/// How many leading words of a claim are used to locate it in a summary.
const CLAIM_PREFIX_WORDS: usize = 6;

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex"))
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
pub fn strip_code_fences(raw: &str) -> &str {
    match fence_regex().captures(raw) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(raw).trim(),
        None => raw.trim(),
    }
}

#[derive(Deserialize)]
struct RawClaim {
    claim: String,
    #[serde(default)]
    source: String,
}

/// Parse extraction output into tagged claims; unparseable output yields
/// zero claims.
pub fn parse_extracted_claims(raw: &str) -> Vec<Claim> {
    let stripped = strip_code_fences(raw);
    match serde_json::from_str::<Vec<RawClaim>>(stripped) {
        Ok(raw_claims) => raw_claims
            .into_iter()
            .filter(|r| !r.claim.trim().is_empty())
            .map(|r| Claim {
                text: r.claim,
                speaker: if r.source.eq_ignore_ascii_case("critic") {
                    AgentRole::Critic
                } else {
                    AgentRole::Advocate
                },
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "claim extraction output did not parse; continuing with zero claims");
            Vec::new()
        }
    }
}

#[derive(Deserialize)]
struct RawClassification {
    claim: String,
    category: String,
}

fn parse_category(label: &str) -> Option<ClaimCategory> {
    match label.to_ascii_lowercase().as_str() {
        "factual" => Some(ClaimCategory::Factual),
        "vague" => Some(ClaimCategory::Vague),
        "opinion" => Some(ClaimCategory::Opinion),
        _ => None,
    }
}

/// Parse classification output against the extracted claims.
///
/// Classification always covers *all* extracted claims: any claim the model
/// skipped, mislabeled, or that failed to parse defaults to `vague`.
pub fn parse_classifications(raw: &str, claims: &[Claim]) -> Vec<ClassifiedClaim> {
    let stripped = strip_code_fences(raw);
    let labeled: Vec<RawClassification> =
        serde_json::from_str(stripped).unwrap_or_else(|e| {
            warn!(error = %e, "claim classification output did not parse; defaulting to vague");
            Vec::new()
        });

    claims
        .iter()
        .map(|claim| {
            let category = labeled
                .iter()
                .find(|l| l.claim == claim.text)
                .and_then(|l| parse_category(&l.category))
                .unwrap_or(ClaimCategory::Vague);
            ClassifiedClaim {
                claim: claim.clone(),
                category,
            }
        })
        .collect()
}

/// Map a free-text verification summary onto per-claim statuses.
///
/// The claim's leading words are located case-insensitively in the summary
/// and a bounded window after the match is scanned for explicit keywords.
/// Negative keywords win over positive ones, and "unverified" is checked
/// before "verified" so the substring overlap cannot flip a status. Claims
/// whose leading text never appears stay `unverified`.
pub fn parse_verification_summary(claims: &[String], summary: &str) -> Vec<ClaimVerification> {
    let lowered = summary.to_lowercase();

    claims
        .iter()
        .map(|claim| {
            let prefix: String = claim
                .split_whitespace()
                .take(CLAIM_PREFIX_WORDS)
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();

            let (status, evidence) = match lowered.find(&prefix).filter(|_| !prefix.is_empty()) {
                Some(position) => {
                    let window: String = lowered[position..]
                        .chars()
                        .take(prefix.chars().count() + KEYWORD_WINDOW_CHARS)
                        .collect();
                    (keyword_status(&window), Some(window))
                }
                None => (VerificationStatus::Unverified, None),
            };

            ClaimVerification {
                claim: claim.clone(),
                status,
                evidence,
                citations: Vec::new(),
            }
        })
        .collect()
}

fn keyword_status(window: &str) -> VerificationStatus {
    if window.contains("contradicted") || window.contains("false") || window.contains("inaccurate")
    {
        VerificationStatus::Contradicted
    } else if window.contains("unverified") {
        VerificationStatus::Unverified
    } else if window.contains("verified") {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Unverified
    }
}
