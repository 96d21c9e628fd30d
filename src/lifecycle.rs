//! Debate lifecycle — creation with seed research, and the branch
//! operations exposed to callers.
//!
//! Seed research is best-effort: both calls run concurrently, each success
//! becomes a `Research` node, each failure is only logged, and the debate
//! always lands on `Idle` ready for its first round.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::collab::ResearchProvider;
use crate::model::{Debate, DebateNode, DebateStatus, NodeKind};
use crate::store::{DebateStore, DebateUpdate, StoreResult};

/// Creates debates and manages their branches.
pub struct DebateService {
    store: Arc<dyn DebateStore>,
    research: Arc<dyn ResearchProvider>,
}

impl DebateService {
    pub fn new(store: Arc<dyn DebateStore>, research: Arc<dyn ResearchProvider>) -> Self {
        Self { store, research }
    }

    /// Create a debate and seed it with prior-art and market research.
    pub async fn create_debate(
        &self,
        idea: impl Into<String>,
        criteria: Vec<String>,
    ) -> StoreResult<Debate> {
        let debate = self.store.create(Debate::new(idea, criteria))?;
        let debate_id = debate.id.clone();
        info!(debate_id = %debate_id, "debate created");

        self.store.update(
            &debate_id,
            DebateUpdate::new().status(DebateStatus::Researching),
        )?;

        let (prior_art, market) = tokio::join!(
            self.research.prior_art(&debate.idea),
            self.research.market_analysis(&debate.idea, &debate.criteria),
        );

        let mut parent_id: Option<String> = None;
        for (stage, outcome) in [("prior_art", prior_art), ("market_analysis", market)] {
            match outcome {
                Ok(summary) => {
                    let mut node =
                        DebateNode::new(NodeKind::Research, summary.summary, parent_id.clone());
                    node.citations = summary.citations;
                    node.metadata.sources = vec![stage.to_string()];
                    parent_id = Some(node.id.clone());
                    self.store.add_node(&debate_id, node)?;
                }
                Err(e) => {
                    warn!(debate_id = %debate_id, stage, error = %e, "seed research failed");
                }
            }
        }

        self.store
            .update(&debate_id, DebateUpdate::new().status(DebateStatus::Idle))
    }

    /// Fork the active sequence at a node into a freshly-named branch.
    pub fn fork_debate(
        &self,
        debate_id: &str,
        node_id: &str,
        label: &str,
    ) -> StoreResult<Debate> {
        let branch_id = format!("branch-{}", Uuid::new_v4());
        let debate = self.store.fork(debate_id, node_id, label, &branch_id)?;
        info!(debate_id = %debate_id, branch_id = %branch_id, label, "debate forked");
        Ok(debate)
    }

    /// Rewind the active sequence to a node, discarding what follows.
    pub fn rewind_debate(&self, debate_id: &str, node_id: &str) -> StoreResult<Debate> {
        let debate = self.store.rewind(debate_id, node_id)?;
        info!(debate_id = %debate_id, node_id = %node_id, "debate rewound");
        Ok(debate)
    }

    /// Make `"main"` or an existing branch the live sequence.
    pub fn switch_branch(&self, debate_id: &str, branch_id: &str) -> StoreResult<Debate> {
        self.store.switch_branch(debate_id, branch_id)
    }

    pub fn get_debate(&self, debate_id: &str) -> StoreResult<Debate> {
        self.store.get(debate_id)
    }

    pub fn list_debates(&self) -> StoreResult<Vec<Debate>> {
        self.store.list()
    }
}
