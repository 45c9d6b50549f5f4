//! Decision core for a collaborative story-writing agent.
//!
//! This crate provides:
//! - A canon ledger of evidence, stances, gaps, and story records
//! - A conflict checker that vets proposed events against canonical history
//! - A scoring engine computing six bounded decision dimensions
//! - An action router with a tiered policy and fail-closed fallbacks
//! - Ledger snapshot persistence
//!
//! # Quick Start
//!
//! ```
//! use canon_core::{ActionKind, Candidate, DecisionEngine, Evidence, StoryRecord, StoryStatus};
//!
//! let mut engine = DecisionEngine::new();
//! engine.store_mut().upsert_evidence(Evidence::new("E-1", "Torn letter"))?;
//! engine.store_mut().upsert_story(
//!     StoryRecord::new("ST-1", "The Harbor Account").with_status(StoryStatus::Active),
//! )?;
//!
//! let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
//!     .by("agent-7")
//!     .with_evidence("E-1");
//!
//! let decision = engine.decide(&"ST-1".into(), vec![candidate])?;
//! println!("{}", decision.action.name());
//! # Ok::<(), canon_core::LedgerError>(())
//! ```

pub mod candidate;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod persist;
pub mod router;
pub mod scoring;
pub mod testing;

// Primary public API
pub use candidate::{
    ActionKind, Candidate, CandidateId, CostLevel, DiscussTrigger, RiskSignals, VoteBallot,
    VoteDirection,
};
pub use conflict::{ConflictChecker, ConflictType, Verdict};
pub use engine::{DecisionEngine, DecisionStats};
pub use error::LedgerError;
pub use ledger::{
    AccessRules, CanonicalEvent, CommitOutcome, CommitReceipt, Disposition, Evidence, EvidenceId,
    EvidenceStatus, Gap, GapId, LedgerReader, LedgerStore, NarrativeEvent, Stance, StanceCost,
    StanceId, StoryHook, StoryId, StoryRecord, StoryStatus, TimeWindow, Urgency, ViewScope,
};
pub use persist::{LedgerMetadata, PersistError, SavedLedger};
pub use router::{Action, ActionRouter, ContentLimits, Decision, RouterPolicy, VotePolicy};
pub use scoring::{ScoreSet, ScoredCandidate, ScoringEngine};
pub use testing::{DecisionHarness, FlakyLedger, UnreachableLedger};
