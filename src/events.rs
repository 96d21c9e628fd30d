//! Progress events emitted while a round runs.
//!
//! These are the contract a streaming transport (SSE, websocket, test
//! harness) depends on: field names and ordering are stable. A `Node` event
//! always follows all `Stream` events for that node, and `RoundComplete` is
//! always the last event of a successful round.

use serde::{Deserialize, Serialize};

use crate::model::{AgentRole, DebateNode, Verdict};

/// One step of the judge pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeStep {
    Extract,
    Classify,
    Verify,
    Scrape,
    Reflect,
    Verdict,
}

impl std::fmt::Display for JudgeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Classify => write!(f, "classify"),
            Self::Verify => write!(f, "verify"),
            Self::Scrape => write!(f, "scrape"),
            Self::Reflect => write!(f, "reflect"),
            Self::Verdict => write!(f, "verdict"),
        }
    }
}

/// Whether a pipeline step is starting, finished, or degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Done,
    Error,
}

/// A single judge-pipeline progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeStepEvent {
    pub step: JudgeStep,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Step-specific payload (claim counts, verdicts, evidence summaries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl JudgeStepEvent {
    pub fn started(step: JudgeStep, message: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Started,
            message: Some(message.into()),
            payload: None,
        }
    }

    pub fn done(step: JudgeStep, payload: serde_json::Value) -> Self {
        Self {
            step,
            status: StepStatus::Done,
            message: None,
            payload: Some(payload),
        }
    }

    pub fn error(step: JudgeStep, message: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Error,
            message: Some(message.into()),
            payload: None,
        }
    }

    /// Wire name for this event: `extract`, `extract_done`, `extract_error`.
    pub fn event_name(&self) -> String {
        match self.status {
            StepStatus::Started => self.step.to_string(),
            StepStatus::Done => format!("{}_done", self.step),
            StepStatus::Error => format!("{}_error", self.step),
        }
    }
}

/// Events emitted by `RoundOrchestrator::run_round`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    /// A stage started or changed state.
    Status { agent: AgentRole, message: String },

    /// A streamed text chunk with the cumulative content so far.
    Stream {
        agent: AgentRole,
        chunk: String,
        full_content: String,
    },

    /// A node was appended to the live sequence.
    Node { node: DebateNode },

    /// Forwarded judge-pipeline event.
    JudgeStep {
        #[serde(flatten)]
        event: JudgeStepEvent,
    },

    /// A final verdict was set on the debate.
    Verdict { verdict: Verdict },

    /// A provisional verdict was produced but the finalization threshold
    /// was not met.
    Evaluation { verdict: Verdict },

    /// The round finished; always the last event of a successful round.
    RoundComplete { round: u32 },
}

impl RoundEvent {
    /// Wire name of the event variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Stream { .. } => "stream",
            Self::Node { .. } => "node",
            Self::JudgeStep { .. } => "judge_step",
            Self::Verdict { .. } => "verdict",
            Self::Evaluation { .. } => "evaluation",
            Self::RoundComplete { .. } => "round_complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn test_round_event_serde_tag() {
        let event = RoundEvent::Stream {
            agent: AgentRole::Advocate,
            chunk: "hel".to_string(),
            full_content: "hel".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stream");
        assert_eq!(json["agent"], "advocate");
        assert_eq!(json["full_content"], "hel");
    }

    #[test]
    fn test_node_event_carries_node() {
        let node = DebateNode::new(NodeKind::Judge, "done", None);
        let event = RoundEvent::Node { node: node.clone() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node");
        assert_eq!(json["node"]["id"], node.id);
    }

    #[test]
    fn test_judge_step_event_names() {
        assert_eq!(
            JudgeStepEvent::started(JudgeStep::Extract, "extracting").event_name(),
            "extract"
        );
        assert_eq!(
            JudgeStepEvent::done(JudgeStep::Verify, serde_json::json!({"count": 2})).event_name(),
            "verify_done"
        );
        assert_eq!(
            JudgeStepEvent::error(JudgeStep::Scrape, "timeout").event_name(),
            "scrape_error"
        );
    }

    #[test]
    fn test_judge_step_flattens_into_round_event() {
        let event = RoundEvent::JudgeStep {
            event: JudgeStepEvent::started(JudgeStep::Reflect, "reflecting"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "judge_step");
        assert_eq!(json["step"], "reflect");
        assert_eq!(json["status"], "started");
    }

    #[test]
    fn test_event_type_names() {
        let verdict = Verdict::neutral_fallback();
        assert_eq!(
            RoundEvent::Verdict {
                verdict: verdict.clone()
            }
            .event_type(),
            "verdict"
        );
        assert_eq!(
            RoundEvent::Evaluation { verdict }.event_type(),
            "evaluation"
        );
        assert_eq!(RoundEvent::RoundComplete { round: 2 }.event_type(), "round_complete");
    }
}
