//! Branching debate engine for evaluating product ideas.
//!
//! This library runs structured advocate-vs-critic debates over a free-text
//! idea and judges each round with an evidence-gathering pipeline:
//! - Debates are trees: the main sequence can be forked at any node into an
//!   independent branch, rewound, and switched.
//! - A round streams an advocate argument, a critic rebuttal, and a judge
//!   evaluation, surfacing progress over an event channel.
//! - The judge extracts claims, classifies them, verifies the factual ones,
//!   scrapes product-discovery sources, reflects, and synthesizes a scored
//!   verdict with aggregated citations.
//! - Every external collaborator is a trait; failures degrade single stages
//!   instead of aborting rounds.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use arbiter::collab::mock::{
//!     MockArgumentGenerator, MockChatModel, MockClaimVerifier, MockResearchProvider,
//!     MockScraper,
//! };
//! use arbiter::{
//!     ArbiterConfig, Collaborators, DebateService, InMemoryStore, RoundOrchestrator,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let collaborators = Collaborators {
//!     arguments: Arc::new(MockArgumentGenerator::new()),
//!     chat: Arc::new(MockChatModel::full_judge_script()),
//!     verifier: Arc::new(MockClaimVerifier::canned()),
//!     scrapers: vec![Arc::new(MockScraper::new("producthunt"))],
//!     research: Arc::new(MockResearchProvider::new()),
//! };
//!
//! let service = DebateService::new(store.clone(), collaborators.research.clone());
//! let debate = service.create_debate("AI trip packer", vec![]).await?;
//!
//! let orchestrator =
//!     RoundOrchestrator::new(store, collaborators, ArbiterConfig::default());
//! let mut events = orchestrator.run_round(&debate.id)?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.event_type());
//! }
//! # Ok(())
//! # }
//! ```

pub mod collab;
pub mod config;
pub mod events;
pub mod judge;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod store;
pub mod telemetry;

pub use collab::Collaborators;
pub use config::{ArbiterConfig, ConfigError};
pub use events::{JudgeStep, JudgeStepEvent, RoundEvent, StepStatus};
pub use judge::{EvaluationRequest, JudgeOutcome, JudgePipeline};
pub use lifecycle::DebateService;
pub use model::{
    AgentRole, Branch, Citation, Debate, DebateNode, DebateStatus, NodeKind, Recommendation,
    Verdict, MAIN_BRANCH,
};
pub use orchestrator::{RoundError, RoundOrchestrator, RoundResult};
pub use store::{DebateStore, DebateUpdate, InMemoryStore, StoreError, StoreResult};
