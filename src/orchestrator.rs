//! Round orchestrator — runs one advocate → critic → judge round.
//!
//! `run_round` validates up front, then spawns the round and hands back an
//! event receiver. A stage collaborator failing never aborts the round: the
//! failed stage's node records the error text and the round carries on, so
//! a successful round always ends with exactly one `RoundComplete`. A
//! dropped receiver does not stop the round either; the debate still
//! advances in the store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::collab::{ArgumentRequest, Collaborators};
use crate::config::ArbiterConfig;
use crate::events::{JudgeStepEvent, RoundEvent};
use crate::judge::{EvaluationRequest, JudgePipeline};
use crate::model::{preview, AgentRole, Debate, DebateNode, DebateStatus, NodeKind};
use crate::store::{DebateStore, DebateUpdate, StoreError};

/// Capacity of the per-round event channel.
const EVENT_BUFFER: usize = 256;

/// Error type for starting a round.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("a round is already running for debate {0}")]
    RoundInProgress(String),
}

/// Result type for round operations.
pub type RoundResult<T> = Result<T, RoundError>;

/// Drives debate rounds against a store and a set of collaborators.
#[derive(Clone)]
pub struct RoundOrchestrator {
    store: Arc<dyn DebateStore>,
    collaborators: Collaborators,
    config: ArbiterConfig,
    /// Debates with a round currently in flight.
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Removes a debate id from the in-flight set when the round task ends,
/// on any exit path.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    debate_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.debate_id);
        }
    }
}

impl RoundOrchestrator {
    pub fn new(
        store: Arc<dyn DebateStore>,
        collaborators: Collaborators,
        config: ArbiterConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start a round for `debate_id`, returning the event stream.
    ///
    /// Fails fast if the debate does not exist or already has a round in
    /// flight; after that the round runs to completion in the background.
    pub fn run_round(&self, debate_id: &str) -> RoundResult<mpsc::Receiver<RoundEvent>> {
        let debate = self.store.get(debate_id)?;

        {
            let mut set = self
                .in_flight
                .lock()
                .map_err(|_| StoreError::LockPoisoned)?;
            if !set.insert(debate.id.clone()) {
                return Err(RoundError::RoundInProgress(debate.id));
            }
        }
        let guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            debate_id: debate.id.clone(),
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let runner = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let debate_id = debate.id.clone();
            if let Err(e) = runner.drive_round(debate, tx).await {
                warn!(debate_id = %debate_id, error = %e, "round aborted on store failure");
            }
        });
        Ok(rx)
    }

    async fn drive_round(
        &self,
        debate: Debate,
        events: mpsc::Sender<RoundEvent>,
    ) -> RoundResult<()> {
        let debate_id = debate.id.clone();
        let round = debate.round + 1;
        debug!(debate_id = %debate_id, round, "starting round");

        self.store.update(
            &debate_id,
            DebateUpdate::new().status(DebateStatus::Debating).round(round),
        )?;

        let nodes = self.store.current_nodes(&debate_id)?;
        let context = build_context(&nodes, &self.config);
        let mut parent_id = nodes.last().map(|n| n.id.clone());

        // Advocate stage.
        send(
            &events,
            RoundEvent::Status {
                agent: AgentRole::Advocate,
                message: "Advocate is preparing an argument".to_string(),
            },
        )
        .await;
        let advocate_content = self
            .stream_argument(AgentRole::Advocate, &debate, &context, None, &events)
            .await;
        let mut advocate_node =
            DebateNode::new(NodeKind::Advocate, advocate_content.clone(), parent_id);
        advocate_node.metadata.model = self.collaborators.arguments.model_name().to_string();
        self.store.add_node(&debate_id, advocate_node.clone())?;
        parent_id = Some(advocate_node.id.clone());
        send(&events, RoundEvent::Node { node: advocate_node }).await;

        // Critic stage rebuts the advocate's text, error text included.
        send(
            &events,
            RoundEvent::Status {
                agent: AgentRole::Critic,
                message: "Critic is preparing a rebuttal".to_string(),
            },
        )
        .await;
        let critic_content = self
            .stream_argument(
                AgentRole::Critic,
                &debate,
                &context,
                Some(advocate_content.clone()),
                &events,
            )
            .await;
        let mut critic_node = DebateNode::new(NodeKind::Critic, critic_content.clone(), parent_id);
        critic_node.metadata.model = self.collaborators.arguments.model_name().to_string();
        self.store.add_node(&debate_id, critic_node.clone())?;
        parent_id = Some(critic_node.id.clone());
        send(&events, RoundEvent::Node { node: critic_node }).await;

        // Judge stage.
        self.store
            .update(&debate_id, DebateUpdate::new().status(DebateStatus::Judging))?;
        send(
            &events,
            RoundEvent::Status {
                agent: AgentRole::Judge,
                message: "Judge is evaluating the round".to_string(),
            },
        )
        .await;

        let (judge_tx, mut judge_rx) = mpsc::channel::<JudgeStepEvent>(EVENT_BUFFER);
        let forward_to = events.clone();
        let forwarder = async move {
            while let Some(event) = judge_rx.recv().await {
                let _ = forward_to.send(RoundEvent::JudgeStep { event }).await;
            }
        };
        let pipeline = JudgePipeline::new(&self.collaborators, self.config.clone());
        let request = EvaluationRequest {
            idea: debate.idea.clone(),
            advocate_argument: advocate_content,
            critic_argument: critic_content,
            context,
        };
        // The pipeline drops its sender when done, which ends the forwarder.
        let (outcome, ()) = tokio::join!(pipeline.evaluate(request, judge_tx), forwarder);

        let mut judge_node = DebateNode::new(
            NodeKind::Judge,
            outcome
                .reflection
                .unwrap_or_else(|| "Evaluation complete.".to_string()),
            parent_id,
        );
        judge_node.score = Some(outcome.verdict.as_ref().map(|v| v.score).unwrap_or(50));
        if let Some(verdict) = &outcome.verdict {
            judge_node.citations = verdict.citations.clone();
        }
        judge_node.metadata.model = self.collaborators.chat.model_name().to_string();
        self.store.add_node(&debate_id, judge_node.clone())?;
        send(&events, RoundEvent::Node { node: judge_node }).await;

        // Finalize only once the debate has accumulated enough judgment.
        match outcome.verdict {
            Some(verdict) => {
                let judge_nodes = self
                    .store
                    .current_nodes(&debate_id)?
                    .iter()
                    .filter(|n| n.kind == NodeKind::Judge)
                    .count();
                let conclusive = judge_nodes >= self.config.finalize_min_judge_nodes
                    || round >= self.config.finalize_min_rounds;
                if conclusive {
                    self.store.update(
                        &debate_id,
                        DebateUpdate::new()
                            .status(DebateStatus::Complete)
                            .final_verdict(verdict.clone()),
                    )?;
                    send(&events, RoundEvent::Verdict { verdict }).await;
                } else {
                    self.store
                        .update(&debate_id, DebateUpdate::new().status(DebateStatus::Idle))?;
                    send(&events, RoundEvent::Evaluation { verdict }).await;
                }
            }
            None => {
                self.store
                    .update(&debate_id, DebateUpdate::new().status(DebateStatus::Idle))?;
            }
        }

        send(&events, RoundEvent::RoundComplete { round }).await;
        debug!(debate_id = %debate_id, round, "round complete");
        Ok(())
    }

    /// Stream one argument, emitting a `Stream` event per chunk.
    ///
    /// Any generation failure, immediate or mid-stream, replaces the
    /// content with bracketed error text so the round can continue.
    async fn stream_argument(
        &self,
        role: AgentRole,
        debate: &Debate,
        context: &str,
        opposing_argument: Option<String>,
        events: &mpsc::Sender<RoundEvent>,
    ) -> String {
        let request = ArgumentRequest {
            role,
            idea: debate.idea.clone(),
            criteria: debate.criteria.clone(),
            context: context.to_string(),
            opposing_argument,
        };

        let mut stream = match self.collaborators.arguments.argue(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(debate_id = %debate.id, %role, error = %e, "argument generation failed");
                return format!("[Error generating {} argument: {}]", role, e);
            }
        };

        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => {
                    content.push_str(&text);
                    send(
                        events,
                        RoundEvent::Stream {
                            agent: role,
                            chunk: text,
                            full_content: content.clone(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    warn!(debate_id = %debate.id, %role, error = %e, "argument stream failed");
                    return format!("[Error generating {} argument: {}]", role, e);
                }
            }
        }
        content
    }
}

/// Send an event, ignoring a dropped receiver.
async fn send(events: &mpsc::Sender<RoundEvent>, event: RoundEvent) {
    let _ = events.send(event).await;
}

/// Render the trailing window of the live sequence for prompts, one
/// `[KIND]: text` line per node with per-node caps.
fn build_context(nodes: &[DebateNode], config: &ArbiterConfig) -> String {
    let start = nodes.len().saturating_sub(config.context_window_nodes);
    nodes[start..]
        .iter()
        .map(|n| {
            format!(
                "[{}]: {}",
                n.kind.to_string().to_uppercase(),
                preview(&n.content, config.context_preview_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::mock::{
        MockArgumentGenerator, MockChatModel, MockClaimVerifier, MockResearchProvider, MockScraper,
    };
    use crate::store::InMemoryStore;

    fn orchestrator(store: Arc<dyn DebateStore>) -> RoundOrchestrator {
        let collaborators = Collaborators {
            arguments: Arc::new(MockArgumentGenerator::new()),
            chat: Arc::new(MockChatModel::full_judge_script()),
            verifier: Arc::new(MockClaimVerifier::canned()),
            scrapers: vec![Arc::new(MockScraper::new("producthunt"))],
            research: Arc::new(MockResearchProvider::new()),
        };
        RoundOrchestrator::new(store, collaborators, ArbiterConfig::default())
    }

    #[test]
    fn test_build_context_windows_and_caps() {
        let config = ArbiterConfig::default();
        let mut nodes = Vec::new();
        for i in 0..6 {
            nodes.push(DebateNode::new(
                NodeKind::Advocate,
                format!("argument {}", i),
                None,
            ));
        }

        let context = build_context(&nodes, &config);
        // Only the last four nodes are rendered.
        assert!(!context.contains("argument 0"));
        assert!(!context.contains("argument 1"));
        assert!(context.contains("[ADVOCATE]: argument 2"));
        assert!(context.contains("[ADVOCATE]: argument 5"));

        let long = DebateNode::new(NodeKind::Judge, "x".repeat(1000), None);
        let context = build_context(&[long], &config);
        assert_eq!(context, format!("[JUDGE]: {}", "x".repeat(300)));
    }

    #[test]
    fn test_build_context_empty_sequence() {
        assert_eq!(build_context(&[], &ArbiterConfig::default()), "");
    }

    #[tokio::test]
    async fn test_run_round_unknown_debate() {
        let orchestrator = orchestrator(Arc::new(InMemoryStore::new()));
        let result = orchestrator.run_round("missing");
        assert!(matches!(
            result,
            Err(RoundError::Store(StoreError::DebateNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_round_rejects_concurrent_round() {
        let store = Arc::new(InMemoryStore::new());
        let debate = store.create(Debate::new("idea", vec![])).unwrap();
        let orchestrator = orchestrator(store);

        orchestrator
            .in_flight
            .lock()
            .unwrap()
            .insert(debate.id.clone());
        assert!(matches!(
            orchestrator.run_round(&debate.id),
            Err(RoundError::RoundInProgress(_))
        ));

        // Once released, a round can start again.
        orchestrator.in_flight.lock().unwrap().remove(&debate.id);
        assert!(orchestrator.run_round(&debate.id).is_ok());
    }
}
