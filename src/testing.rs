//! Testing utilities for the decision core.
//!
//! This module provides tools for integration testing:
//! - `UnreachableLedger` and `FlakyLedger` for exercising fail-closed paths
//! - fixture builders for a seeded ledger
//! - `DecisionHarness` for scripted decision scenarios
//! - assertion helpers for verifying routed decisions

use crate::candidate::{ActionKind, Candidate};
use crate::engine::DecisionEngine;
use crate::error::LedgerError;
use crate::ledger::{
    AccessRules, Evidence, Gap, GapId, LedgerReader, LedgerStore, Stance, StanceId, StoryId,
    StoryRecord, StoryStatus, TimeWindow, ViewScope,
};
use crate::router::{Action, Decision};
use chrono::{TimeZone, Utc};

/// A ledger that fails every read, as an external store does when it is
/// down or timing out. Routing against it must resolve to silence.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableLedger;

impl UnreachableLedger {
    fn unavailable() -> LedgerError {
        LedgerError::Unavailable("ledger backend is unreachable".to_string())
    }
}

impl LedgerReader for UnreachableLedger {
    fn load_story(&self, _id: &StoryId) -> Result<Option<StoryRecord>, LedgerError> {
        Err(Self::unavailable())
    }

    fn load_stance(&self, _id: &StanceId) -> Result<Option<Stance>, LedgerError> {
        Err(Self::unavailable())
    }

    fn has_evidence(&self, _id: &crate::ledger::EvidenceId) -> Result<bool, LedgerError> {
        Err(Self::unavailable())
    }

    fn has_open_gap(&self, _id: &GapId) -> Result<bool, LedgerError> {
        Err(Self::unavailable())
    }

    fn load_access_rules(&self) -> Result<AccessRules, LedgerError> {
        Err(Self::unavailable())
    }

    fn count_stories_on_topics(
        &self,
        _topics: &std::collections::BTreeSet<String>,
        _exclude: Option<&StoryId>,
    ) -> Result<usize, LedgerError> {
        Err(Self::unavailable())
    }
}

/// A ledger that serves a fixed number of reads and then fails every
/// subsequent one, as an external store does when it drops mid-decision.
#[derive(Debug)]
pub struct FlakyLedger {
    inner: LedgerStore,
    reads_left: std::cell::Cell<usize>,
}

impl FlakyLedger {
    /// Wrap a ledger that will answer `reads` queries before going down.
    pub fn new(inner: LedgerStore, reads: usize) -> Self {
        Self {
            inner,
            reads_left: std::cell::Cell::new(reads),
        }
    }

    fn tap(&self) -> Result<(), LedgerError> {
        let left = self.reads_left.get();
        if left == 0 {
            return Err(LedgerError::Unavailable(
                "ledger backend dropped mid-decision".to_string(),
            ));
        }
        self.reads_left.set(left - 1);
        Ok(())
    }
}

impl LedgerReader for FlakyLedger {
    fn load_story(&self, id: &StoryId) -> Result<Option<StoryRecord>, LedgerError> {
        self.tap()?;
        self.inner.load_story(id)
    }

    fn load_stance(&self, id: &StanceId) -> Result<Option<Stance>, LedgerError> {
        self.tap()?;
        self.inner.load_stance(id)
    }

    fn has_evidence(&self, id: &crate::ledger::EvidenceId) -> Result<bool, LedgerError> {
        self.tap()?;
        self.inner.has_evidence(id)
    }

    fn has_open_gap(&self, id: &GapId) -> Result<bool, LedgerError> {
        self.tap()?;
        self.inner.has_open_gap(id)
    }

    fn load_access_rules(&self) -> Result<AccessRules, LedgerError> {
        self.tap()?;
        self.inner.load_access_rules()
    }

    fn count_stories_on_topics(
        &self,
        topics: &std::collections::BTreeSet<String>,
        exclude: Option<&StoryId>,
    ) -> Result<usize, LedgerError> {
        self.tap()?;
        self.inner.count_stories_on_topics(topics, exclude)
    }
}

/// A fixed in-world time window for fixtures.
pub fn sample_window(start_hour: u32, end_hour: u32) -> TimeWindow {
    TimeWindow::new(
        Utc.with_ymd_and_hms(1891, 3, 14, start_hour, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(1891, 3, 14, end_hour, 0, 0).unwrap(),
    )
}

/// A ledger seeded with the harbor fixture: five evidence cards, two
/// mutually exclusive stances plus a neutral one, an open gap, and one
/// active story.
pub fn sample_ledger() -> LedgerStore {
    let mut store = LedgerStore::new();
    for (id, title) in [
        ("E-1", "Torn letter"),
        ("E-2", "Harbor ledger page"),
        ("E-3", "Watch rota"),
        ("E-4", "Customs manifest"),
        ("E-5", "Keeper's logbook"),
    ] {
        store
            .upsert_evidence(Evidence::new(id, title).with_tag("harbor"))
            .unwrap_or_else(|e| panic!("fixture evidence {id}: {e}"));
    }
    store
        .upsert_stances(vec![
            Stance::new("S-1", "The keeper lied")
                .with_scope(ViewScope::Global)
                .with_conflict("S-2"),
            Stance::new("S-2", "The keeper was framed")
                .with_scope(ViewScope::Global)
                .with_conflict("S-1"),
            Stance::new("S-3", "The harbor master knew").with_scope(ViewScope::Global),
        ])
        .unwrap_or_else(|e| panic!("fixture stances: {e}"));
    store
        .upsert_gap(Gap::new("GAP-1", "Who signed the manifest?"))
        .unwrap_or_else(|e| panic!("fixture gap: {e}"));
    store
        .upsert_story(
            StoryRecord::new("ST-1", "The Harbor Account")
                .with_status(StoryStatus::Active)
                .with_topic("lighthouse"),
        )
        .unwrap_or_else(|e| panic!("fixture story: {e}"));
    store
}

/// A continuation candidate with enough ledger links to clear the
/// continue tier against [`sample_ledger`].
pub fn sample_continuation(id: &str) -> Candidate {
    Candidate::new(id, ActionKind::Continue, "ST-1")
        .by("agent-7")
        .with_evidence("E-1")
        .with_evidence("E-2")
        .with_evidence("E-3")
        .with_evidence("E-4")
        .with_evidence("E-5")
        .with_linked_gap("GAP-1")
}

/// Test harness for running decision scenarios against the fixture ledger.
pub struct DecisionHarness {
    /// The engine under test.
    pub engine: DecisionEngine,
    /// The story the batches are assembled around.
    pub context: StoryId,
}

impl DecisionHarness {
    /// Create a harness around the harbor fixture.
    pub fn new() -> Self {
        Self {
            engine: DecisionEngine::with_store(sample_ledger()),
            context: StoryId::new("ST-1"),
        }
    }

    /// Create a harness around a custom ledger.
    pub fn with_store(store: LedgerStore) -> Self {
        Self {
            engine: DecisionEngine::with_store(store),
            context: StoryId::new("ST-1"),
        }
    }

    /// Score and route a batch against the fixture story.
    pub fn decide(&mut self, candidates: Vec<Candidate>) -> Decision {
        self.engine
            .decide(&self.context, candidates)
            .unwrap_or_else(|e| panic!("decide failed: {e}"))
    }

    /// Current version of the fixture story.
    pub fn story_version(&self) -> u64 {
        self.engine
            .store()
            .story_version(&self.context)
            .unwrap_or_else(|e| panic!("story version: {e}"))
    }

    /// Commit a candidate against the current fixture story version.
    pub fn commit(&mut self, candidate: &Candidate) -> Result<(), LedgerError> {
        let version = self.story_version();
        self.engine.commit(candidate, version)?;
        Ok(())
    }

    /// Count of canonical events on the fixture story.
    pub fn event_count(&self) -> usize {
        self.engine
            .store()
            .query_story(&self.context)
            .map(|s| s.events.len())
            .unwrap_or(0)
    }
}

impl Default for DecisionHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that a decision resolved to the expected primary action.
#[track_caller]
pub fn assert_action(decision: &Decision, expected: Action) {
    assert_eq!(
        decision.action,
        expected,
        "Expected action '{}', got '{}' (reason: {:?})",
        expected.name(),
        decision.action.name(),
        decision.reason
    );
}

/// Assert that a decision chose the expected candidate.
#[track_caller]
pub fn assert_chosen(decision: &Decision, id: &str) {
    assert_eq!(
        decision.chosen.as_ref().map(|c| c.as_str()),
        Some(id),
        "Expected candidate '{id}' to be chosen"
    );
}

/// Assert that a decision vetoed the named candidate.
#[track_caller]
pub fn assert_vetoed(decision: &Decision, id: &str) {
    assert!(
        decision.vetoed.iter().any(|c| c.as_str() == id),
        "Expected candidate '{id}' to be vetoed, vetoed: {:?}",
        decision.vetoed
    );
}

/// Assert that a decision carries a warning mentioning the given fragment.
#[track_caller]
pub fn assert_warned(decision: &Decision, fragment: &str) {
    assert!(
        decision.warnings.iter().any(|w| w.contains(fragment)),
        "Expected a warning containing '{fragment}', warnings: {:?}",
        decision.warnings
    );
}
