//! In-memory debate store.
//!
//! A lock-wrapped map keyed by debate id. Single-writer-per-debate is
//! assumed by the orchestration layer; the lock only protects the map
//! itself across debates.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use super::{DebateStore, DebateUpdate, StoreError, StoreResult};
use crate::model::{Branch, Debate, DebateNode, MAIN_BRANCH};

/// In-process [`DebateStore`] backed by a `RwLock<HashMap>`.
#[derive(Default)]
pub struct InMemoryStore {
    debates: RwLock<HashMap<String, Debate>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a mutation against a stored debate, bumping `updated_at` when it
    /// succeeds. Failed mutations leave the debate untouched.
    fn with_debate<T>(
        &self,
        debate_id: &str,
        f: impl FnOnce(&mut Debate) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut debates = self.debates.write().map_err(|_| StoreError::LockPoisoned)?;
        let debate = debates
            .get_mut(debate_id)
            .ok_or_else(|| StoreError::DebateNotFound(debate_id.to_string()))?;
        let mut staged = debate.clone();
        staged.updated_at = Utc::now();
        let result = f(&mut staged)?;
        *debate = staged;
        Ok(result)
    }
}

impl DebateStore for InMemoryStore {
    fn create(&self, debate: Debate) -> StoreResult<Debate> {
        let mut debates = self.debates.write().map_err(|_| StoreError::LockPoisoned)?;
        debug!(debate_id = %debate.id, "debate created");
        debates.insert(debate.id.clone(), debate.clone());
        Ok(debate)
    }

    fn get(&self, id: &str) -> StoreResult<Debate> {
        let debates = self.debates.read().map_err(|_| StoreError::LockPoisoned)?;
        debates
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DebateNotFound(id.to_string()))
    }

    fn update(&self, id: &str, update: DebateUpdate) -> StoreResult<Debate> {
        self.with_debate(id, |debate| {
            if let Some(status) = update.status {
                debate.status = status;
            }
            if let Some(round) = update.round {
                debate.round = round;
            }
            if let Some(verdict) = update.final_verdict {
                debate.final_verdict = verdict;
            }
            if let Some(branch_id) = update.current_branch_id {
                debate.current_branch_id = branch_id;
            }
            Ok(debate.clone())
        })
    }

    fn add_node(&self, debate_id: &str, node: DebateNode) -> StoreResult<()> {
        self.with_debate(debate_id, |debate| {
            let current_branch = debate.current_branch_id.clone();
            let nodes = debate
                .current_nodes_mut()
                .ok_or(StoreError::BranchNotFound {
                    debate_id: debate_id.to_string(),
                    branch_id: current_branch,
                })?;
            if let Some(parent_id) = &node.parent_id {
                if !nodes.iter().any(|n| &n.id == parent_id) {
                    return Err(StoreError::ParentNotFound {
                        debate_id: debate_id.to_string(),
                        parent_id: parent_id.clone(),
                    });
                }
            }
            debug!(debate_id, node_id = %node.id, kind = %node.kind, "node appended");
            nodes.push(node);
            Ok(())
        })
    }

    fn current_nodes(&self, debate_id: &str) -> StoreResult<Vec<DebateNode>> {
        let debates = self.debates.read().map_err(|_| StoreError::LockPoisoned)?;
        let debate = debates
            .get(debate_id)
            .ok_or_else(|| StoreError::DebateNotFound(debate_id.to_string()))?;
        Ok(debate.current_nodes().to_vec())
    }

    fn list(&self) -> StoreResult<Vec<Debate>> {
        let debates = self.debates.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut all: Vec<Debate> = debates.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    fn fork(
        &self,
        debate_id: &str,
        node_id: &str,
        label: &str,
        branch_id: &str,
    ) -> StoreResult<Debate> {
        self.with_debate(debate_id, |debate| {
            let active = debate.current_nodes();
            let fork_index = active
                .iter()
                .position(|n| n.id == node_id)
                .ok_or(StoreError::NodeNotFound {
                    debate_id: debate_id.to_string(),
                    node_id: node_id.to_string(),
                })?;

            // Clone the prefix up to and including the fork node — the
            // branch must never alias its source sequence.
            let prefix: Vec<DebateNode> = active[..=fork_index].to_vec();

            debug!(
                debate_id,
                node_id,
                branch_id,
                copied = prefix.len(),
                "branch forked"
            );
            debate.branches.push(Branch {
                id: branch_id.to_string(),
                label: label.to_string(),
                fork_from_node_id: node_id.to_string(),
                nodes: prefix,
            });
            debate.current_branch_id = branch_id.to_string();
            Ok(debate.clone())
        })
    }

    fn rewind(&self, debate_id: &str, node_id: &str) -> StoreResult<Debate> {
        self.with_debate(debate_id, |debate| {
            let current_branch = debate.current_branch_id.clone();
            let nodes = debate
                .current_nodes_mut()
                .ok_or(StoreError::BranchNotFound {
                    debate_id: debate_id.to_string(),
                    branch_id: current_branch,
                })?;
            let keep_index = nodes
                .iter()
                .position(|n| n.id == node_id)
                .ok_or(StoreError::NodeNotFound {
                    debate_id: debate_id.to_string(),
                    node_id: node_id.to_string(),
                })?;
            let discarded = nodes.len() - keep_index - 1;
            nodes.truncate(keep_index + 1);

            // A verdict computed from now-discarded nodes is no longer valid.
            debate.final_verdict = None;
            debug!(debate_id, node_id, discarded, "sequence rewound");
            Ok(debate.clone())
        })
    }

    fn switch_branch(&self, debate_id: &str, branch_id: &str) -> StoreResult<Debate> {
        self.with_debate(debate_id, |debate| {
            if branch_id != MAIN_BRANCH && !debate.branches.iter().any(|b| b.id == branch_id) {
                return Err(StoreError::BranchNotFound {
                    debate_id: debate_id.to_string(),
                    branch_id: branch_id.to_string(),
                });
            }
            debate.current_branch_id = branch_id.to_string();
            Ok(debate.clone())
        })
    }
}
