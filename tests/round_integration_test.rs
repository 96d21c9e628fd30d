//! Mocked round integration test — exercises a full debate round with
//! deterministic mock collaborators (no LLM calls, no network).
//!
//! Covers: lifecycle ↔ orchestrator ↔ judge pipeline ↔ store running
//! together, including the degradation paths under collaborator failure.

use std::sync::Arc;

use arbiter::collab::mock::{
    MockArgumentGenerator, MockChatModel, MockClaimVerifier, MockResearchProvider, MockScraper,
};
use arbiter::{
    AgentRole, ArbiterConfig, Collaborators, DebateService, DebateStatus, DebateStore,
    InMemoryStore, NodeKind, Recommendation, RoundEvent, RoundOrchestrator,
};

/// Helper: full working collaborator set with a fresh judge script.
fn working_collaborators() -> Collaborators {
    Collaborators {
        arguments: Arc::new(MockArgumentGenerator::new()),
        chat: Arc::new(MockChatModel::full_judge_script()),
        verifier: Arc::new(MockClaimVerifier::canned()),
        scrapers: vec![
            Arc::new(MockScraper::new("producthunt").with_results(&["u1"])),
            Arc::new(MockScraper::new("github").with_repositories(&["u2"])),
        ],
        research: Arc::new(MockResearchProvider::new()),
    }
}

/// Helper: every collaborator fails.
fn failing_collaborators() -> Collaborators {
    Collaborators {
        arguments: Arc::new(MockArgumentGenerator::failing()),
        chat: Arc::new(MockChatModel::failing()),
        verifier: Arc::new(MockClaimVerifier::failing()),
        scrapers: vec![
            Arc::new(MockScraper::failing("producthunt")),
            Arc::new(MockScraper::failing("github")),
        ],
        research: Arc::new(MockResearchProvider::failing()),
    }
}

/// Helper: run one round to completion and collect every event.
async fn run_round(
    store: Arc<InMemoryStore>,
    collaborators: Collaborators,
    debate_id: &str,
) -> Vec<RoundEvent> {
    let orchestrator =
        RoundOrchestrator::new(store, collaborators, ArbiterConfig::default());
    let mut rx = orchestrator.run_round(debate_id).unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn round_completes(events: &[RoundEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RoundEvent::RoundComplete { .. }))
        .count()
}

// ── Happy path: two rounds to a final verdict ──────────────────────

#[tokio::test]
async fn test_two_rounds_reach_final_verdict() {
    let store = Arc::new(InMemoryStore::new());
    let service = DebateService::new(store.clone(), Arc::new(MockResearchProvider::new()));
    let debate = service
        .create_debate("AI trip packer", vec!["feasible in 3 months".to_string()])
        .await
        .unwrap();
    assert_eq!(debate.status, DebateStatus::Idle);
    assert_eq!(debate.nodes.len(), 2); // two research nodes

    // Round 1: a verdict is produced but the debate is not conclusive yet.
    let events = run_round(store.clone(), working_collaborators(), &debate.id).await;
    assert_eq!(round_completes(&events), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, RoundEvent::Evaluation { .. })));
    assert!(!events.iter().any(|e| matches!(e, RoundEvent::Verdict { .. })));

    let debate = service.get_debate(&debate.id).unwrap();
    assert_eq!(debate.status, DebateStatus::Idle);
    assert_eq!(debate.round, 1);
    assert_eq!(debate.nodes.len(), 5); // research ×2 + advocate/critic/judge
    assert!(debate.final_verdict.is_none());

    // Round 2: the threshold is met and the verdict finalizes.
    let events = run_round(store.clone(), working_collaborators(), &debate.id).await;
    assert_eq!(round_completes(&events), 1);
    assert!(events.iter().any(|e| matches!(e, RoundEvent::Verdict { .. })));

    let debate = service.get_debate(&debate.id).unwrap();
    assert_eq!(debate.status, DebateStatus::Complete);
    assert_eq!(debate.round, 2);
    assert_eq!(debate.nodes.len(), 8);

    let verdict = debate.final_verdict.expect("final verdict");
    assert_eq!(verdict.recommendation, Recommendation::Pursue);
    assert_eq!(verdict.score, 72);
    // Verification citations first (none from the canned verifier), then
    // scrape results, then repositories.
    let urls: Vec<&str> = verdict.citations.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(urls, vec!["u1", "u2"]);
}

// ── Round node shape ───────────────────────────────────────────────

#[tokio::test]
async fn test_round_appends_three_chained_nodes() {
    let store = Arc::new(InMemoryStore::new());
    let debate = store
        .create(arbiter::Debate::new("idea", vec![]))
        .unwrap();

    run_round(store.clone(), working_collaborators(), &debate.id).await;

    let nodes = store.current_nodes(&debate.id).unwrap();
    let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NodeKind::Advocate, NodeKind::Critic, NodeKind::Judge]);

    // Each node parents the previous one; the first has no parent.
    assert!(nodes[0].parent_id.is_none());
    assert_eq!(nodes[1].parent_id.as_deref(), Some(nodes[0].id.as_str()));
    assert_eq!(nodes[2].parent_id.as_deref(), Some(nodes[1].id.as_str()));

    // The judge node carries the reflection, score, and round citations.
    assert!(nodes[2].content.contains("leans positive"));
    assert_eq!(nodes[2].score, Some(72));
    assert_eq!(nodes[2].citations.len(), 2);
}

// ── Event ordering ─────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_events_precede_their_node() {
    let store = Arc::new(InMemoryStore::new());
    let debate = store
        .create(arbiter::Debate::new("idea", vec![]))
        .unwrap();

    let events = run_round(store, working_collaborators(), &debate.id).await;

    // Cumulative content grows chunk by chunk for the advocate.
    let advocate_streams: Vec<(&str, &str)> = events
        .iter()
        .filter_map(|e| match e {
            RoundEvent::Stream {
                agent: AgentRole::Advocate,
                chunk,
                full_content,
            } => Some((chunk.as_str(), full_content.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(advocate_streams.len(), 3);
    assert!(advocate_streams[2].1.ends_with(advocate_streams[2].0));
    assert!(advocate_streams[2].1.starts_with(advocate_streams[0].0));

    // The advocate node event follows every advocate stream event and
    // carries the full accumulated content.
    let last_stream_index = events
        .iter()
        .rposition(|e| {
            matches!(
                e,
                RoundEvent::Stream {
                    agent: AgentRole::Advocate,
                    ..
                }
            )
        })
        .unwrap();
    let node_index = events
        .iter()
        .position(|e| matches!(e, RoundEvent::Node { node } if node.kind == NodeKind::Advocate))
        .unwrap();
    assert!(node_index > last_stream_index);
    match &events[node_index] {
        RoundEvent::Node { node } => assert_eq!(node.content, advocate_streams[2].1),
        _ => unreachable!(),
    }

    // RoundComplete is the terminal event.
    assert!(matches!(
        events.last(),
        Some(RoundEvent::RoundComplete { round: 1 })
    ));
}

// ── Degradation: total collaborator failure ────────────────────────

#[tokio::test]
async fn test_total_failure_round_still_completes() {
    let store = Arc::new(InMemoryStore::new());
    let debate = store
        .create(arbiter::Debate::new("idea", vec![]))
        .unwrap();

    let events = run_round(store.clone(), failing_collaborators(), &debate.id).await;
    assert_eq!(round_completes(&events), 1);
    assert!(matches!(
        events.last(),
        Some(RoundEvent::RoundComplete { round: 1 })
    ));

    let debate = store.get(&debate.id).unwrap();
    assert_eq!(debate.status, DebateStatus::Idle);
    assert!(debate.final_verdict.is_none());

    // Three nodes still land, with error text as content.
    assert_eq!(debate.nodes.len(), 3);
    assert!(debate.nodes[0]
        .content
        .starts_with("[Error generating advocate argument:"));
    assert!(debate.nodes[1]
        .content
        .starts_with("[Error generating critic argument:"));
    assert!(debate.nodes[2]
        .content
        .starts_with("[Error during reflection:"));
    // No verdict parsed, so the judge node records the neutral score.
    assert_eq!(debate.nodes[2].score, Some(50));
}

// ── Degradation: mid-stream generator failure ──────────────────────

#[tokio::test]
async fn test_mid_stream_failure_replaces_content() {
    let store = Arc::new(InMemoryStore::new());
    let debate = store
        .create(arbiter::Debate::new("idea", vec![]))
        .unwrap();

    let collaborators = Collaborators {
        arguments: Arc::new(MockArgumentGenerator::failing_mid_stream()),
        ..working_collaborators()
    };
    let events = run_round(store.clone(), collaborators, &debate.id).await;
    assert_eq!(round_completes(&events), 1);

    // Two chunks streamed before the failure.
    let advocate_streams = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                RoundEvent::Stream {
                    agent: AgentRole::Advocate,
                    ..
                }
            )
        })
        .count();
    assert_eq!(advocate_streams, 2);

    // The stored node holds the error text, not the partial content.
    let nodes = store.current_nodes(&debate.id).unwrap();
    assert!(nodes[0]
        .content
        .starts_with("[Error generating advocate argument:"));
}

// ── Judge step forwarding ──────────────────────────────────────────

#[tokio::test]
async fn test_judge_steps_are_forwarded_in_order() {
    let store = Arc::new(InMemoryStore::new());
    let debate = store
        .create(arbiter::Debate::new("idea", vec![]))
        .unwrap();

    let events = run_round(store, working_collaborators(), &debate.id).await;

    let step_names: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            RoundEvent::JudgeStep { event } => Some(event.event_name()),
            _ => None,
        })
        .collect();
    assert_eq!(
        step_names,
        vec![
            "extract",
            "extract_done",
            "classify",
            "classify_done",
            "verify",
            "verify_done",
            "scrape",
            "scrape_done",
            "reflect",
            "reflect_done",
            "verdict",
            "verdict_done",
        ]
    );
}
