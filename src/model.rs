//! Debate data model — debates, nodes, branches, verdicts, and the
//! pipeline-scoped claim types.
//!
//! Nodes form a flat ordered sequence per branch with `parent_id`
//! back-references; tree walks are iterative lookups over that sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    /// No round in flight.
    Idle,
    /// Seed research calls are running.
    Researching,
    /// Advocate/critic stages of a round are running.
    Debating,
    /// Judge pipeline is running.
    Judging,
    /// A final verdict has been set.
    Complete,
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Researching => write!(f, "researching"),
            Self::Debating => write!(f, "debating"),
            Self::Judging => write!(f, "judging"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Role of an agent contributing to a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Argues for the idea.
    Advocate,
    /// Argues against the idea.
    Critic,
    /// Evaluates both arguments.
    Judge,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advocate => write!(f, "advocate"),
            Self::Critic => write!(f, "critic"),
            Self::Judge => write!(f, "judge"),
        }
    }
}

/// Kind of contribution a node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Advocate,
    Critic,
    Judge,
    Research,
    Fork,
    Verdict,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advocate => write!(f, "advocate"),
            Self::Critic => write!(f, "critic"),
            Self::Judge => write!(f, "judge"),
            Self::Research => write!(f, "research"),
            Self::Fork => write!(f, "fork"),
            Self::Verdict => write!(f, "verdict"),
        }
    }
}

/// A reference gathered while producing a node or verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Which collaborator the citation came from.
    pub source: String,
}

/// Provenance record attached to every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Model or collaborator that produced the content.
    pub model: String,
    /// Evidence sources consulted.
    pub sources: Vec<String>,
}

/// An atomic contribution to the debate tree.
///
/// Created whole when its generating step completes (error text counts as
/// content), never mutated after append; removed only via rewind, copied
/// (never aliased) via fork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateNode {
    /// Unique node identifier.
    pub id: String,
    /// Node this one causally follows, `None` for the first in a sequence.
    pub parent_id: Option<String>,
    /// What kind of contribution this is.
    pub kind: NodeKind,
    /// Full text produced for this node.
    pub content: String,
    /// References gathered for this node.
    pub citations: Vec<Citation>,
    /// Numeric rating, used by judge nodes.
    pub score: Option<u32>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Provenance record.
    pub metadata: NodeMetadata,
}

impl DebateNode {
    /// Create a node with a fresh id and current timestamp.
    pub fn new(kind: NodeKind, content: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id,
            kind,
            content: content.into(),
            citations: Vec::new(),
            score: None,
            timestamp: Utc::now(),
            metadata: NodeMetadata::default(),
        }
    }
}

/// A named divergence from some node sequence.
///
/// Created only by fork, never merged back. The branch owns an independent
/// copy of the source prefix up to and including the fork node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    /// User-supplied label.
    pub label: String,
    /// Node the branch diverged from.
    pub fork_from_node_id: String,
    /// Independent node sequence for this branch.
    pub nodes: Vec<DebateNode>,
}

/// Judge's recommendation for the idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Pursue,
    Pivot,
    Pass,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pursue => write!(f, "pursue"),
            Self::Pivot => write!(f, "pivot"),
            Self::Pass => write!(f, "pass"),
        }
    }
}

/// Judge's terminal synthesis for a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub recommendation: Recommendation,
    /// Score 0–100.
    pub score: u32,
    pub reasoning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
    /// Verification citations first, then scrape citations in
    /// scrape-source-array order.
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl Verdict {
    /// Neutral fallback used when verdict synthesis output cannot be parsed.
    pub fn neutral_fallback() -> Self {
        Self {
            recommendation: Recommendation::Pivot,
            score: 50,
            reasoning: "The evaluation could not produce a structured verdict; treating the \
                        evidence as inconclusive."
                .to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            risks: Vec::new(),
            next_steps: vec!["Run another debate round to gather more evidence.".to_string()],
            citations: Vec::new(),
        }
    }
}

/// The root aggregate for one idea evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debate {
    /// Unique debate identifier.
    pub id: String,
    /// Free-text proposal being debated.
    pub idea: String,
    /// User-supplied evaluation constraints, in order.
    pub criteria: Vec<String>,
    /// Current lifecycle status.
    pub status: DebateStatus,
    /// Completed rounds on the active lineage.
    pub round: u32,
    /// Main-branch node sequence.
    pub nodes: Vec<DebateNode>,
    /// Branches diverging from some sequence.
    pub branches: Vec<Branch>,
    /// `"main"` or a branch id; selects the live sequence.
    pub current_branch_id: String,
    /// Set once a round is deemed conclusive; cleared by rewind.
    pub final_verdict: Option<Verdict>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// Branch id designating the main sequence.
pub const MAIN_BRANCH: &str = "main";

impl Debate {
    /// Create an empty debate on the main branch.
    pub fn new(idea: impl Into<String>, criteria: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            idea: idea.into(),
            criteria,
            status: DebateStatus::Idle,
            round: 0,
            nodes: Vec::new(),
            branches: Vec::new(),
            current_branch_id: MAIN_BRANCH.to_string(),
            final_verdict: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The live node sequence (main or the current branch).
    pub fn current_nodes(&self) -> &[DebateNode] {
        if self.current_branch_id == MAIN_BRANCH {
            &self.nodes
        } else {
            self.branches
                .iter()
                .find(|b| b.id == self.current_branch_id)
                .map(|b| b.nodes.as_slice())
                .unwrap_or(&[])
        }
    }

    /// Mutable live node sequence, `None` if the current branch id is stale.
    pub(crate) fn current_nodes_mut(&mut self) -> Option<&mut Vec<DebateNode>> {
        if self.current_branch_id == MAIN_BRANCH {
            Some(&mut self.nodes)
        } else {
            let id = self.current_branch_id.clone();
            self.branches
                .iter_mut()
                .find(|b| b.id == id)
                .map(|b| &mut b.nodes)
        }
    }
}

// ── Pipeline-scoped claim types (not persisted on the debate) ──────

/// A checkable statement extracted from an argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    /// Which side made the claim.
    pub speaker: AgentRole,
}

/// Label assigned by the classification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    Factual,
    Vague,
    Opinion,
}

/// A claim with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedClaim {
    pub claim: Claim,
    pub category: ClaimCategory,
}

/// Outcome of verifying a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Unverified,
    Contradicted,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Unverified => write!(f, "unverified"),
            Self::Contradicted => write!(f, "contradicted"),
        }
    }
}

/// A claim after the verification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimVerification {
    pub claim: String,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Char-safe prefix of `text`, at most `max_chars` characters.
///
/// Used wherever free text is rendered into a bounded prompt: context
/// windows, argument previews, evidence digests.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Depth of `node_id` in the parent chain (root node has depth 0).
///
/// Iterative walk bounded by the sequence length so a malformed or cyclic
/// `parent_id` chain terminates; returns `None` for unknown ids.
pub fn node_depth(nodes: &[DebateNode], node_id: &str) -> Option<usize> {
    let mut current = nodes.iter().find(|n| n.id == node_id)?;
    let mut depth = 0usize;
    for _ in 0..nodes.len() {
        match &current.parent_id {
            None => return Some(depth),
            Some(parent) => match nodes.iter().find(|n| &n.id == parent) {
                Some(p) => {
                    depth += 1;
                    current = p;
                }
                // Parent outside the sequence: treat this node as a root.
                None => return Some(depth),
            },
        }
    }
    // Walked more hops than nodes exist: parent chain is cyclic.
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> Vec<DebateNode> {
        let mut nodes: Vec<DebateNode> = Vec::new();
        for i in 0..len {
            let parent = nodes.last().map(|n: &DebateNode| n.id.clone());
            nodes.push(DebateNode::new(NodeKind::Advocate, format!("n{}", i), parent));
        }
        nodes
    }

    #[test]
    fn test_new_debate_defaults() {
        let debate = Debate::new("AI trip packer", vec!["feasible in 3 months".to_string()]);
        assert_eq!(debate.status, DebateStatus::Idle);
        assert_eq!(debate.round, 0);
        assert_eq!(debate.current_branch_id, MAIN_BRANCH);
        assert!(debate.nodes.is_empty());
        assert!(debate.branches.is_empty());
        assert!(debate.final_verdict.is_none());
    }

    #[test]
    fn test_current_nodes_follows_branch() {
        let mut debate = Debate::new("idea", vec![]);
        debate.nodes.push(DebateNode::new(NodeKind::Advocate, "a", None));
        assert_eq!(debate.current_nodes().len(), 1);

        debate.branches.push(Branch {
            id: "branch-1".to_string(),
            label: "alt".to_string(),
            fork_from_node_id: debate.nodes[0].id.clone(),
            nodes: vec![],
        });
        debate.current_branch_id = "branch-1".to_string();
        assert!(debate.current_nodes().is_empty());

        // Stale branch id resolves to an empty sequence, not a panic.
        debate.current_branch_id = "branch-missing".to_string();
        assert!(debate.current_nodes().is_empty());
        assert!(debate.current_nodes_mut().is_none());
    }

    #[test]
    fn test_node_depth_chain() {
        let nodes = chain(4);
        assert_eq!(node_depth(&nodes, &nodes[0].id), Some(0));
        assert_eq!(node_depth(&nodes, &nodes[3].id), Some(3));
        assert_eq!(node_depth(&nodes, "missing"), None);
    }

    #[test]
    fn test_node_depth_dangling_parent_is_root() {
        let mut nodes = chain(2);
        nodes[0].parent_id = Some("gone".to_string());
        assert_eq!(node_depth(&nodes, &nodes[1].id), Some(1));
    }

    #[test]
    fn test_node_depth_cycle_terminates() {
        let mut nodes = chain(3);
        let last_id = nodes[2].id.clone();
        nodes[0].parent_id = Some(last_id);
        assert_eq!(node_depth(&nodes, &nodes[2].id), None);
    }

    #[test]
    fn test_neutral_fallback_verdict() {
        let verdict = Verdict::neutral_fallback();
        assert_eq!(verdict.recommendation, Recommendation::Pivot);
        assert_eq!(verdict.score, 50);
        assert!(!verdict.next_steps.is_empty());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DebateStatus::Idle.to_string(), "idle");
        assert_eq!(DebateStatus::Researching.to_string(), "researching");
        assert_eq!(DebateStatus::Debating.to_string(), "debating");
        assert_eq!(DebateStatus::Judging.to_string(), "judging");
        assert_eq!(DebateStatus::Complete.to_string(), "complete");
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("hello", 3), "hel");
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 10), "hi");
    }

    #[test]
    fn test_node_kind_serde_snake_case() {
        let json = serde_json::to_string(&NodeKind::Research).unwrap();
        assert_eq!(json, "\"research\"");
    }
}
