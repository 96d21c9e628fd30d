//! Debate repository — the only shared mutable resource in the crate.
//!
//! Callers depend on the [`DebateStore`] trait, not the storage mechanism,
//! so a durable backend can replace [`InMemoryStore`] without touching the
//! orchestrator. Every id miss is a typed not-found error, never a panic;
//! the lifecycle layer translates these into user-facing 404s.

pub mod memory;

pub use memory::InMemoryStore;

use crate::model::{Debate, DebateNode, DebateStatus, Verdict};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("debate not found: {0}")]
    DebateNotFound(String),

    #[error("node {node_id} not found in the active sequence of debate {debate_id}")]
    NodeNotFound { debate_id: String, node_id: String },

    #[error("branch {branch_id} not found in debate {debate_id}")]
    BranchNotFound {
        debate_id: String,
        branch_id: String,
    },

    #[error("parent node {parent_id} not present in the active sequence of debate {debate_id}")]
    ParentNotFound {
        debate_id: String,
        parent_id: String,
    },

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Partial-field update applied by [`DebateStore::update`].
///
/// Unset fields are left untouched; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct DebateUpdate {
    pub status: Option<DebateStatus>,
    pub round: Option<u32>,
    /// `Some(None)` clears the verdict, `Some(Some(v))` replaces it.
    pub final_verdict: Option<Option<Verdict>>,
    pub current_branch_id: Option<String>,
}

impl DebateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: DebateStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn final_verdict(mut self, verdict: Verdict) -> Self {
        self.final_verdict = Some(Some(verdict));
        self
    }

    pub fn clear_final_verdict(mut self) -> Self {
        self.final_verdict = Some(None);
        self
    }
}

/// Repository of debate trees; owns branch/fork/rewind invariants.
pub trait DebateStore: Send + Sync {
    /// Store a fully-formed debate and return it.
    fn create(&self, debate: Debate) -> StoreResult<Debate>;

    /// Read a debate by id.
    fn get(&self, id: &str) -> StoreResult<Debate>;

    /// Merge partial fields into a stored debate, refreshing `updated_at`.
    fn update(&self, id: &str, update: DebateUpdate) -> StoreResult<Debate>;

    /// Append a node to whichever sequence `current_branch_id` designates.
    ///
    /// A node whose `parent_id` is not already present in that sequence is
    /// rejected — this keeps the parent chain well-formed by construction.
    fn add_node(&self, debate_id: &str, node: DebateNode) -> StoreResult<()>;

    /// The active node sequence for a debate.
    fn current_nodes(&self, debate_id: &str) -> StoreResult<Vec<DebateNode>>;

    /// All debates, most-recently-updated first.
    fn list(&self) -> StoreResult<Vec<Debate>>;

    /// Fork the active sequence at `node_id` into a new branch.
    ///
    /// Copies all nodes up to and including `node_id` (deep copy — branches
    /// never alias), appends the branch, and makes it current. Forking from
    /// a branch copies that branch's prefix, not main's. This is the only
    /// way new branches are created.
    fn fork(
        &self,
        debate_id: &str,
        node_id: &str,
        label: &str,
        branch_id: &str,
    ) -> StoreResult<Debate>;

    /// Truncate the active sequence to everything up to and including
    /// `node_id`, clearing `final_verdict` unconditionally.
    ///
    /// Leaves `current_branch_id` and other branches untouched.
    fn rewind(&self, debate_id: &str, node_id: &str) -> StoreResult<Debate>;

    /// Point `current_branch_id` at `"main"` or an existing branch.
    fn switch_branch(&self, debate_id: &str, branch_id: &str) -> StoreResult<Debate>;
}
