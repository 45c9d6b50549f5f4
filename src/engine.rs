//! The decision engine: one owner for the ledger and the decision pipeline.
//!
//! Callers hand it raw candidate batches; it scores them, routes them, and
//! applies committed outcomes back to the ledger. The conflict gate runs
//! twice per written candidate, once at routing and again at commit time,
//! so a verdict can never go stale between the two.

use crate::candidate::Candidate;
use crate::conflict::{ConflictChecker, Verdict};
use crate::error::LedgerError;
use crate::ledger::{CommitOutcome, CommitReceipt, LedgerStore, NarrativeEvent, StoryId};
use crate::router::{Action, ActionRouter, Decision, RouterPolicy};
use crate::scoring::{ScoredCandidate, ScoringEngine};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Running counters for one engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionStats {
    /// Batches routed.
    pub decisions: u64,
    /// Outcomes applied to the ledger.
    pub commits: u64,
    /// Candidates vetoed by the conflict gate.
    pub vetoes: u64,
    /// Batches that resolved to silence.
    pub silences: u64,
}

/// Owns the ledger and drives the score/route/commit pipeline.
#[derive(Debug, Default)]
pub struct DecisionEngine {
    store: LedgerStore,
    scorer: ScoringEngine,
    router: ActionRouter,
    checker: ConflictChecker,
    stats: DecisionStats,
}

impl DecisionEngine {
    /// Create an engine with an empty ledger and the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom routing policy.
    pub fn with_policy(policy: RouterPolicy) -> Self {
        Self {
            router: ActionRouter::with_policy(policy),
            ..Self::default()
        }
    }

    /// Create an engine around an existing ledger (e.g. a loaded snapshot).
    pub fn with_store(store: LedgerStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// The ledger.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Mutable ledger access, for seeding and upkeep.
    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DecisionStats {
        self.stats
    }

    /// Score a candidate batch against the current ledger snapshot.
    pub fn score_candidates(
        &self,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<ScoredCandidate>, LedgerError> {
        self.scorer.score_batch(&self.store, candidates)
    }

    /// Score and route a batch, returning the single primary decision.
    pub fn decide(
        &mut self,
        context: &StoryId,
        candidates: Vec<Candidate>,
    ) -> Result<Decision, LedgerError> {
        let scored = self.score_candidates(candidates)?;
        let decision = self.router.route(&self.store, context, &scored);

        self.stats.decisions += 1;
        self.stats.vetoes += decision.vetoed.len() as u64;
        if decision.action == Action::Silence {
            self.stats.silences += 1;
        }
        info!(
            context = %context,
            action = decision.action.name(),
            chosen = ?decision.chosen,
            "decision"
        );
        Ok(decision)
    }

    /// Classify a proposed event against a story's canonical history.
    pub fn check_conflict(
        &self,
        story: &StoryId,
        event: &NarrativeEvent,
    ) -> Result<Verdict, LedgerError> {
        let record = self.store.query_story(story)?;
        self.checker.check(&self.store, record, event)
    }

    /// Apply a chosen candidate's outcome to its story.
    ///
    /// The conflict gate is re-run against the current snapshot; a hard
    /// verdict at commit time fails with `Conflict` even if routing passed
    /// it earlier. `expected_version` is the story version the decision
    /// was made against.
    pub fn commit(
        &mut self,
        candidate: &Candidate,
        expected_version: u64,
    ) -> Result<CommitReceipt, LedgerError> {
        if let Some(event) = &candidate.event {
            let verdict = self.check_conflict(&candidate.story, event)?;
            if verdict.is_hard() {
                self.stats.vetoes += 1;
                return Err(LedgerError::Conflict(verdict.message));
            }
        }

        let outcome = CommitOutcome {
            candidate_id: candidate.id.to_string(),
            author: candidate.actor.clone(),
            perspective: candidate.perspective.clone(),
            event: candidate.event.clone(),
            evidence_refs: candidate.evidence.clone(),
            stance_refs: candidate.stances.clone(),
            opened_gap: candidate.opens_gap.clone(),
        };
        let receipt = self
            .store
            .apply_commit(&candidate.story, expected_version, outcome)?;
        self.stats.commits += 1;
        info!(
            candidate = %candidate.id,
            story = %candidate.story,
            version = receipt.new_version,
            "candidate committed"
        );
        Ok(receipt)
    }
}
