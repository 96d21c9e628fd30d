//! Round evaluator — the six-step judge pipeline.
//!
//! Turns two argument texts into a scored verdict with citations:
//! extract claims → classify → verify factual claims → scrape discovery
//! sources → reflect → synthesize verdict. Every external step tolerates
//! failure independently; zero claims, zero verifications, and zero
//! scraped evidence are all valid (if uninformative) inputs downstream,
//! so the pipeline never aborts for lack of evidence.

pub mod claims;
pub mod evidence;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::collab::{ChatMessage, ChatModel, ClaimVerifier, Collaborators, DiscoveryScraper};
use crate::config::ArbiterConfig;
use crate::events::{JudgeStep, JudgeStepEvent};
use crate::model::{
    preview, Citation, Claim, ClaimCategory, ClaimVerification, ClassifiedClaim, Recommendation,
    Verdict,
};

/// Inputs for one judge evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub idea: String,
    pub advocate_argument: String,
    pub critic_argument: String,
    /// Bounded rendering of recent debate history.
    pub context: String,
}

/// What the pipeline produced.
///
/// `reflection` becomes the judge node's displayed content; `verdict` is
/// `None` when synthesis itself failed (as opposed to merely not parsing,
/// which yields the neutral fallback).
#[derive(Debug, Clone)]
pub struct JudgeOutcome {
    pub reflection: Option<String>,
    pub verdict: Option<Verdict>,
}

/// The judge pipeline over its collaborators.
pub struct JudgePipeline {
    chat: Arc<dyn ChatModel>,
    verifier: Arc<dyn ClaimVerifier>,
    scrapers: Vec<Arc<dyn DiscoveryScraper>>,
    config: ArbiterConfig,
}

impl JudgePipeline {
    pub fn new(collaborators: &Collaborators, config: ArbiterConfig) -> Self {
        Self {
            chat: collaborators.chat.clone(),
            verifier: collaborators.verifier.clone(),
            scrapers: collaborators.scrapers.clone(),
            config,
        }
    }

    /// Run the full pipeline, emitting a started and done/error event per
    /// step. Consumers that dropped their receiver are ignored — evaluation
    /// still runs to completion.
    pub async fn evaluate(
        &self,
        request: EvaluationRequest,
        events: mpsc::Sender<JudgeStepEvent>,
    ) -> JudgeOutcome {
        // Step 1: extract checkable claims from both arguments.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Extract, "Extracting checkable claims"),
        )
        .await;
        let extracted = match self.chat.chat(&extract_messages(&request), true).await {
            Ok(raw) => {
                let extracted = claims::parse_extracted_claims(&raw);
                emit(
                    &events,
                    JudgeStepEvent::done(JudgeStep::Extract, json!({ "claims": &extracted })),
                )
                .await;
                extracted
            }
            Err(e) => {
                warn!(error = %e, "claim extraction call failed");
                emit(&events, JudgeStepEvent::error(JudgeStep::Extract, e.to_string())).await;
                Vec::new()
            }
        };

        // Step 2: classify every extracted claim.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Classify, "Classifying claims"),
        )
        .await;
        let classified = self.classify(&extracted, &events).await;

        // Step 3: verify factual claims, capped.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Verify, "Verifying factual claims"),
        )
        .await;
        let (verifications, verifier_citations) =
            self.verify(&classified, &request.idea, &events).await;

        // Step 4: scrape discovery sources concurrently.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Scrape, "Searching product-discovery sources"),
        )
        .await;
        let reports = evidence::settle_scrapes(&self.scrapers, &request.idea).await;
        if reports.is_empty() && !self.scrapers.is_empty() {
            emit(
                &events,
                JudgeStepEvent::error(JudgeStep::Scrape, "all discovery sources failed"),
            )
            .await;
        } else {
            let hits: usize = reports
                .iter()
                .map(|r| r.results.len() + r.repositories.len())
                .sum();
            emit(
                &events,
                JudgeStepEvent::done(
                    JudgeStep::Scrape,
                    json!({
                        "sources": reports.iter().map(|r| r.source.clone()).collect::<Vec<_>>(),
                        "hits": hits,
                    }),
                ),
            )
            .await;
        }

        // Step 5: reflect on evidence quality.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Reflect, "Reflecting on the evidence"),
        )
        .await;
        let verification_digest = evidence::verification_digest(&verifications);
        let scrape_digest =
            evidence::scrape_digest(&reports, self.config.evidence_preview_chars);
        let reflection = match self
            .chat
            .chat(
                &reflect_messages(
                    &request,
                    &verification_digest,
                    &scrape_digest,
                    self.config.argument_preview_chars,
                ),
                false,
            )
            .await
        {
            Ok(text) => {
                emit(
                    &events,
                    JudgeStepEvent::done(JudgeStep::Reflect, json!({ "chars": text.len() })),
                )
                .await;
                Some(text)
            }
            Err(e) => {
                warn!(error = %e, "reflection call failed");
                emit(&events, JudgeStepEvent::error(JudgeStep::Reflect, e.to_string())).await;
                Some(format!("[Error during reflection: {}]", e))
            }
        };

        // Step 6: synthesize the structured verdict.
        emit(
            &events,
            JudgeStepEvent::started(JudgeStep::Verdict, "Synthesizing verdict"),
        )
        .await;
        let verdict = match self
            .chat
            .chat(
                &verdict_messages(
                    &request,
                    &verification_digest,
                    &scrape_digest,
                    reflection.as_deref().unwrap_or(""),
                ),
                true,
            )
            .await
        {
            Ok(raw) => {
                let mut verdict = parse_verdict(&raw);
                verdict.citations = evidence::aggregate_citations(&verifier_citations, &reports);
                emit(
                    &events,
                    JudgeStepEvent::done(
                        JudgeStep::Verdict,
                        json!({
                            "recommendation": verdict.recommendation.to_string(),
                            "score": verdict.score,
                        }),
                    ),
                )
                .await;
                Some(verdict)
            }
            Err(e) => {
                warn!(error = %e, "verdict synthesis call failed");
                emit(&events, JudgeStepEvent::error(JudgeStep::Verdict, e.to_string())).await;
                None
            }
        };

        debug!(
            claims = extracted.len(),
            verifications = verifications.len(),
            scraped_sources = reports.len(),
            has_verdict = verdict.is_some(),
            "judge pipeline finished"
        );
        JudgeOutcome {
            reflection,
            verdict,
        }
    }

    async fn classify(
        &self,
        extracted: &[Claim],
        events: &mpsc::Sender<JudgeStepEvent>,
    ) -> Vec<ClassifiedClaim> {
        if extracted.is_empty() {
            emit(
                events,
                JudgeStepEvent::done(JudgeStep::Classify, json!({ "claims": 0 })),
            )
            .await;
            return Vec::new();
        }

        let classified = match self.chat.chat(&classify_messages(extracted), true).await {
            Ok(raw) => claims::parse_classifications(&raw, extracted),
            Err(e) => {
                warn!(error = %e, "claim classification call failed; defaulting to vague");
                emit(events, JudgeStepEvent::error(JudgeStep::Classify, e.to_string())).await;
                return extracted
                    .iter()
                    .map(|claim| ClassifiedClaim {
                        claim: claim.clone(),
                        category: ClaimCategory::Vague,
                    })
                    .collect();
            }
        };
        emit(
            events,
            JudgeStepEvent::done(JudgeStep::Classify, json!({ "claims": classified.len() })),
        )
        .await;
        classified
    }

    async fn verify(
        &self,
        classified: &[ClassifiedClaim],
        idea: &str,
        events: &mpsc::Sender<JudgeStepEvent>,
    ) -> (Vec<ClaimVerification>, Vec<Citation>) {
        // Only factual claims reach verification, hard-capped in
        // extraction order.
        let factual: Vec<String> = classified
            .iter()
            .filter(|c| c.category == ClaimCategory::Factual)
            .take(self.config.max_verified_claims)
            .map(|c| c.claim.text.clone())
            .collect();

        if factual.is_empty() {
            emit(
                events,
                JudgeStepEvent::done(JudgeStep::Verify, json!({ "verifications": [] })),
            )
            .await;
            return (Vec::new(), Vec::new());
        }

        match self.verifier.verify(&factual, idea).await {
            Ok(report) => {
                let verifications =
                    claims::parse_verification_summary(&factual, &report.summary);
                emit(
                    events,
                    JudgeStepEvent::done(
                        JudgeStep::Verify,
                        json!({ "verifications": &verifications }),
                    ),
                )
                .await;
                (verifications, report.citations)
            }
            Err(e) => {
                warn!(error = %e, "claim verification failed; continuing without evidence");
                emit(events, JudgeStepEvent::error(JudgeStep::Verify, e.to_string())).await;
                (Vec::new(), Vec::new())
            }
        }
    }
}

/// Send an event, ignoring a dropped receiver — nobody watching is fine.
async fn emit(events: &mpsc::Sender<JudgeStepEvent>, event: JudgeStepEvent) {
    let _ = events.send(event).await;
}

fn extract_messages(request: &EvaluationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You extract specific, checkable claims from debate arguments. Respond with a JSON \
             array of objects with keys \"claim\" and \"source\", where source is \"advocate\" \
             or \"critic\". Only include concrete statements that could be checked against \
             outside evidence.",
        ),
        ChatMessage::user(format!(
            "Idea under debate: {}\n\nAdvocate argument:\n{}\n\nCritic argument:\n{}",
            request.idea, request.advocate_argument, request.critic_argument
        )),
    ]
}

fn classify_messages(extracted: &[Claim]) -> Vec<ChatMessage> {
    let listed = extracted
        .iter()
        .map(|c| format!("- {}", c.text))
        .collect::<Vec<_>>()
        .join("\n");
    vec![
        ChatMessage::system(
            "Classify each claim as \"factual\" (checkable against evidence), \"vague\" \
             (too imprecise to check), or \"opinion\". Respond with a JSON array of objects \
             with keys \"claim\" (verbatim) and \"category\".",
        ),
        ChatMessage::user(listed),
    ]
}

fn reflect_messages(
    request: &EvaluationRequest,
    verification_digest: &str,
    scrape_digest: &str,
    argument_cap: usize,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are the judge in a startup-idea debate. In about 200 words, assess the quality \
             of the evidence below and state a preliminary leaning. Plain prose, no JSON.",
        ),
        ChatMessage::user(format!(
            "Idea: {}\n\nAdvocate (excerpt):\n{}\n\nCritic (excerpt):\n{}\n\n\
             Claim verification results:\n{}\n\nWeb evidence:\n{}",
            request.idea,
            preview(&request.advocate_argument, argument_cap),
            preview(&request.critic_argument, argument_cap),
            verification_digest,
            scrape_digest
        )),
    ]
}

fn verdict_messages(
    request: &EvaluationRequest,
    verification_digest: &str,
    scrape_digest: &str,
    reflection: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "Produce the final verdict for this debate as a JSON object with keys: \
             \"recommendation\" (\"pursue\", \"pivot\", or \"pass\"), \"score\" (0-100), \
             \"reasoning\", \"strengths\", \"weaknesses\", \"risks\", \"next_steps\" \
             (the last four as string arrays).",
        ),
        ChatMessage::user(format!(
            "Idea: {}\n\nAdvocate argument:\n{}\n\nCritic argument:\n{}\n\n\
             Claim verification results:\n{}\n\nWeb evidence:\n{}\n\nYour reflection:\n{}",
            request.idea,
            request.advocate_argument,
            request.critic_argument,
            verification_digest,
            scrape_digest,
            reflection
        )),
    ]
}

#[derive(Deserialize)]
struct RawVerdict {
    recommendation: String,
    score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

/// Parse the synthesis output, substituting the neutral fallback when it
/// does not parse as a well-formed verdict.
fn parse_verdict(raw: &str) -> Verdict {
    let stripped = claims::strip_code_fences(raw);
    let parsed: RawVerdict = match serde_json::from_str(stripped) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "verdict output did not parse; using neutral fallback");
            return Verdict::neutral_fallback();
        }
    };
    let recommendation = match parsed.recommendation.to_ascii_lowercase().as_str() {
        "pursue" => Recommendation::Pursue,
        "pivot" => Recommendation::Pivot,
        "pass" => Recommendation::Pass,
        other => {
            warn!(recommendation = other, "unknown recommendation; using neutral fallback");
            return Verdict::neutral_fallback();
        }
    };
    Verdict {
        recommendation,
        score: parsed.score.clamp(0.0, 100.0).round() as u32,
        reasoning: parsed.reasoning,
        strengths: parsed.strengths,
        weaknesses: parsed.weaknesses,
        risks: parsed.risks,
        next_steps: parsed.next_steps,
        citations: Vec::new(),
    }
}
