//! The ledger store: owns all evidence, stance, gap, and story records.
//!
//! Pure data layer. Upserts validate before mutating and are atomic per
//! call; queries return sequences stable by identifier. Story records carry
//! an optimistic version counter enforced by `apply_commit`, giving
//! single-writer-per-story semantics without locking readers.

use super::access::AccessRules;
use super::evidence::Evidence;
use super::gap::Gap;
use super::stance::Stance;
use super::story::{EventId, NarrativeEvent, StoryRecord};
use super::{EvidenceId, GapId, StanceId, StoryId};
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Read-side view of the ledger.
///
/// The scoring engine, conflict checker, and router only need this seam;
/// an external store that can time out returns `LedgerError::Unavailable`
/// and the router fails closed. The in-memory `LedgerStore` never fails.
pub trait LedgerReader {
    /// Load a story record, `Ok(None)` if the identifier is unknown.
    fn load_story(&self, id: &StoryId) -> Result<Option<StoryRecord>, LedgerError>;

    /// Load a stance.
    fn load_stance(&self, id: &StanceId) -> Result<Option<Stance>, LedgerError>;

    /// Check whether an evidence card exists.
    fn has_evidence(&self, id: &EvidenceId) -> Result<bool, LedgerError>;

    /// Check whether a gap exists and is still open.
    fn has_open_gap(&self, id: &GapId) -> Result<bool, LedgerError>;

    /// The current access rules.
    fn load_access_rules(&self) -> Result<AccessRules, LedgerError>;

    /// Count non-archived stories sharing at least one of the given topics,
    /// excluding the named story.
    fn count_stories_on_topics(
        &self,
        topics: &std::collections::BTreeSet<String>,
        exclude: Option<&StoryId>,
    ) -> Result<usize, LedgerError>;
}

/// What a committed candidate writes back to its story.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Candidate identifier, recorded for idempotence.
    pub candidate_id: String,
    /// Contributing author to add to the story.
    pub author: String,
    /// Narrative perspective the segment used, if any.
    pub perspective: Option<String>,
    /// The canonical event to append, if the action establishes one.
    pub event: Option<NarrativeEvent>,
    /// Evidence references to extend the story's referenced set with.
    pub evidence_refs: Vec<EvidenceId>,
    /// Stance references to extend the story's referenced set with.
    pub stance_refs: Vec<StanceId>,
    /// A newly implied open question, recorded as a gap.
    pub opened_gap: Option<Gap>,
}

/// Receipt for a successful commit.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Identifier of the appended canonical event, if one was appended.
    pub event_id: Option<EventId>,
    /// Story version after the commit.
    pub new_version: u64,
}

/// The canon ledger: exclusive owner of all four entity kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStore {
    evidence: BTreeMap<EvidenceId, Evidence>,
    stances: BTreeMap<StanceId, Stance>,
    gaps: BTreeMap<GapId, Gap>,
    stories: BTreeMap<StoryId, StoryRecord>,
    #[serde(default)]
    access: AccessRules,
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Evidence
    // =========================================================================

    /// Insert or replace an evidence card by identifier.
    pub fn upsert_evidence(&mut self, evidence: Evidence) -> Result<(), LedgerError> {
        if evidence.id.as_str().is_empty() {
            return Err(LedgerError::Validation(
                "evidence identifier must not be empty".to_string(),
            ));
        }
        debug!(id = %evidence.id, "upsert evidence");
        self.evidence.insert(evidence.id.clone(), evidence);
        Ok(())
    }

    /// Get an evidence card by identifier.
    pub fn evidence(&self, id: &EvidenceId) -> Option<&Evidence> {
        self.evidence.get(id)
    }

    /// Get a mutable evidence card (for status transitions).
    pub fn evidence_mut(&mut self, id: &EvidenceId) -> Option<&mut Evidence> {
        self.evidence.get_mut(id)
    }

    /// All evidence carrying a tag, stable by identifier. Empty when none.
    pub fn evidence_by_tag(&self, tag: &str) -> Vec<&Evidence> {
        self.evidence.values().filter(|e| e.has_tag(tag)).collect()
    }

    /// All evidence discovered by an entity, stable by identifier.
    pub fn evidence_by_discoverer(&self, who: &str) -> Vec<&Evidence> {
        self.evidence
            .values()
            .filter(|e| e.discovered_by == who)
            .collect()
    }

    // =========================================================================
    // Stances
    // =========================================================================

    /// Insert or replace a single stance.
    ///
    /// Fails with `Validation` if the conflict relation would not be
    /// symmetric after the write. Mutually-conflicting stances must be
    /// introduced together via [`LedgerStore::upsert_stances`].
    pub fn upsert_stance(&mut self, stance: Stance) -> Result<(), LedgerError> {
        self.upsert_stances(vec![stance])
    }

    /// Insert or replace a batch of stances, all-or-nothing.
    ///
    /// Symmetry is validated against the post-write state: for every stance
    /// touched by the batch, each declared conflict must exist and must
    /// declare the conflict back. On any failure the store is unchanged.
    pub fn upsert_stances(&mut self, batch: Vec<Stance>) -> Result<(), LedgerError> {
        for stance in &batch {
            if stance.id.as_str().is_empty() {
                return Err(LedgerError::Validation(
                    "stance identifier must not be empty".to_string(),
                ));
            }
        }

        // Overlay the batch on the existing stances to get the post-write view.
        let mut view: BTreeMap<&StanceId, &Stance> =
            self.stances.iter().map(|(k, v)| (k, v)).collect();
        for stance in &batch {
            view.insert(&stance.id, stance);
        }

        for stance in &batch {
            for conflict in &stance.conflicts_with {
                let Some(other) = view.get(conflict) else {
                    return Err(LedgerError::Validation(format!(
                        "stance {} declares a conflict with unknown stance {conflict}",
                        stance.id
                    )));
                };
                if !other.conflicts(&stance.id) {
                    return Err(LedgerError::Validation(format!(
                        "stance conflict is not symmetric: {} lists {conflict}, \
                         but {conflict} does not list {}",
                        stance.id, stance.id
                    )));
                }
            }
            // A replaced stance may not drop a conflict another stance still declares.
            for (other_id, other) in &view {
                if other.conflicts(&stance.id) && !stance.conflicts(other_id) {
                    return Err(LedgerError::Validation(format!(
                        "stance conflict is not symmetric: {other_id} lists {}, \
                         but {} does not list {other_id}",
                        stance.id, stance.id
                    )));
                }
            }
        }

        drop(view);
        for stance in batch {
            debug!(id = %stance.id, "upsert stance");
            self.stances.insert(stance.id.clone(), stance);
        }
        Ok(())
    }

    /// Get a stance by identifier.
    pub fn stance(&self, id: &StanceId) -> Option<&Stance> {
        self.stances.get(id)
    }

    /// All stances relying on an evidence card, stable by identifier.
    pub fn stances_citing(&self, evidence: &EvidenceId) -> Vec<&Stance> {
        self.stances
            .values()
            .filter(|s| s.evidence.contains(evidence))
            .collect()
    }

    /// Check whether two stances declare each other mutually exclusive.
    pub fn stances_conflict(&self, a: &StanceId, b: &StanceId) -> bool {
        match (self.stances.get(a), self.stances.get(b)) {
            (Some(sa), Some(sb)) => sa.conflicts(b) && sb.conflicts(a),
            _ => false,
        }
    }

    // =========================================================================
    // Gaps
    // =========================================================================

    /// Insert or replace a gap by identifier.
    pub fn upsert_gap(&mut self, gap: Gap) -> Result<(), LedgerError> {
        if gap.id.as_str().is_empty() {
            return Err(LedgerError::Validation(
                "gap identifier must not be empty".to_string(),
            ));
        }
        debug!(id = %gap.id, "upsert gap");
        self.gaps.insert(gap.id.clone(), gap);
        Ok(())
    }

    /// Get a gap by identifier.
    pub fn gap(&self, id: &GapId) -> Option<&Gap> {
        self.gaps.get(id)
    }

    /// Close a gap with the evidence that resolved it, and remove it from
    /// every story's open set. The gap itself is kept. Stories whose open
    /// set changed get a version bump, so commits scored against the
    /// pre-close record fail stale.
    pub fn close_gap(&mut self, id: &GapId, resolving: EvidenceId) -> Result<(), LedgerError> {
        let gap = self
            .gaps
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found(format!("gap {id}")))?;
        gap.close(resolving);
        for story in self.stories.values_mut() {
            if story.open_gaps.remove(id) {
                story.version += 1;
            }
        }
        Ok(())
    }

    /// All open gaps, stable by identifier.
    pub fn open_gaps(&self) -> Vec<&Gap> {
        self.gaps.values().filter(|g| g.is_open()).collect()
    }

    /// All open gaps hooked into a story, stable by identifier.
    pub fn open_gaps_for_story(&self, story: &StoryId) -> Vec<&Gap> {
        self.gaps
            .values()
            .filter(|g| g.is_open() && g.hooks.iter().any(|h| &h.story == story))
            .collect()
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Insert or replace a story record by identifier.
    ///
    /// Fails with `Validation` if any canonical event references an
    /// evidence card or stance the ledger does not hold. Replacing an
    /// existing record bumps its version past the old one.
    pub fn upsert_story(&mut self, mut story: StoryRecord) -> Result<(), LedgerError> {
        if story.id.as_str().is_empty() {
            return Err(LedgerError::Validation(
                "story identifier must not be empty".to_string(),
            ));
        }
        for event in &story.events {
            self.validate_event_refs(event.evidence.iter(), event.stances.iter())?;
        }
        if let Some(existing) = self.stories.get(&story.id) {
            story.version = existing.version + 1;
        }
        debug!(id = %story.id, version = story.version, "upsert story");
        self.stories.insert(story.id.clone(), story);
        Ok(())
    }

    /// Get the full story record, or `NotFound`.
    pub fn query_story(&self, id: &StoryId) -> Result<&StoryRecord, LedgerError> {
        self.stories
            .get(id)
            .ok_or_else(|| LedgerError::not_found(format!("story {id}")))
    }

    /// Current version of a story record.
    pub fn story_version(&self, id: &StoryId) -> Result<u64, LedgerError> {
        Ok(self.query_story(id)?.version)
    }

    /// All stories, stable by identifier.
    pub fn stories(&self) -> impl Iterator<Item = &StoryRecord> {
        self.stories.values()
    }

    /// Mark a stance conflict as an acknowledged dispute on a story.
    pub fn acknowledge_dispute(
        &mut self,
        story: &StoryId,
        a: StanceId,
        b: StanceId,
    ) -> Result<(), LedgerError> {
        let record = self
            .stories
            .get_mut(story)
            .ok_or_else(|| LedgerError::not_found(format!("story {story}")))?;
        record.acknowledge_dispute(a, b);
        record.version += 1;
        Ok(())
    }

    // =========================================================================
    // Access rules
    // =========================================================================

    /// The current access rules.
    pub fn access(&self) -> &AccessRules {
        &self.access
    }

    /// Replace the access rules.
    pub fn set_access_rules(&mut self, rules: AccessRules) {
        self.access = rules;
    }

    /// Mutable access rules, for incremental grants.
    pub fn access_mut(&mut self) -> &mut AccessRules {
        &mut self.access
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Apply a committed candidate's outcome to its story, atomically.
    ///
    /// Fails before any mutation with:
    /// - `NotFound` if the story does not exist,
    /// - `StaleWrite` if the record's version moved past `expected_version`
    ///   or the candidate identifier was already committed,
    /// - `Validation` if the event references unknown evidence or stances.
    ///
    /// The conflict gate runs in the engine before this is called; this
    /// method only enforces data-layer invariants.
    pub fn apply_commit(
        &mut self,
        story_id: &StoryId,
        expected_version: u64,
        outcome: CommitOutcome,
    ) -> Result<CommitReceipt, LedgerError> {
        {
            let story = self.query_story(story_id)?;
            if story.version != expected_version {
                return Err(LedgerError::StaleWrite {
                    story: story_id.to_string(),
                    expected: expected_version,
                    found: story.version,
                });
            }
            if story.committed_candidates.contains(&outcome.candidate_id) {
                return Err(LedgerError::StaleWrite {
                    story: story_id.to_string(),
                    expected: expected_version,
                    found: story.version,
                });
            }
        }
        if let Some(event) = &outcome.event {
            self.validate_event_refs(event.evidence.iter(), event.stances.iter())?;
        }

        // Validation passed; mutate.
        let mut appended = None;
        if let Some(gap) = &outcome.opened_gap {
            let mut gap = gap.clone();
            gap.add_hook(story_id.clone(), "open-question");
            self.gaps.insert(gap.id.clone(), gap);
        }
        let story = self
            .stories
            .get_mut(story_id)
            .ok_or_else(|| LedgerError::not_found(format!("story {story_id}")))?;

        if let Some(event) = outcome.event {
            story
                .referenced_evidence
                .extend(event.evidence.iter().cloned());
            story
                .referenced_stances
                .extend(event.stances.iter().cloned());
            let canonical = event.into_canonical();
            appended = Some(canonical.id);
            story.events.push(canonical);
        }
        story.referenced_evidence.extend(outcome.evidence_refs);
        story.referenced_stances.extend(outcome.stance_refs);
        if let Some(gap) = outcome.opened_gap {
            story.open_gaps.insert(gap.id);
        }
        if let Some(perspective) = outcome.perspective {
            story.perspectives.insert(perspective);
        }
        if !outcome.author.is_empty() {
            story.authors.insert(outcome.author);
        }
        story.committed_candidates.insert(outcome.candidate_id);
        story.version += 1;

        debug!(
            story = %story_id,
            version = story.version,
            event = ?appended,
            "commit applied"
        );
        Ok(CommitReceipt {
            event_id: appended,
            new_version: story.version,
        })
    }

    fn validate_event_refs<'a>(
        &self,
        evidence: impl Iterator<Item = &'a EvidenceId>,
        stances: impl Iterator<Item = &'a StanceId>,
    ) -> Result<(), LedgerError> {
        for id in evidence {
            if !self.evidence.contains_key(id) {
                return Err(LedgerError::Validation(format!(
                    "event references unknown evidence {id}"
                )));
            }
        }
        for id in stances {
            if !self.stances.contains_key(id) {
                return Err(LedgerError::Validation(format!(
                    "event references unknown stance {id}"
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Total evidence cards held.
    pub fn evidence_count(&self) -> usize {
        self.evidence.len()
    }

    /// Total stances held.
    pub fn stance_count(&self) -> usize {
        self.stances.len()
    }

    /// Total gaps held (open and closed).
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Total story records held.
    pub fn story_count(&self) -> usize {
        self.stories.len()
    }
}

impl LedgerReader for LedgerStore {
    fn load_story(&self, id: &StoryId) -> Result<Option<StoryRecord>, LedgerError> {
        Ok(self.stories.get(id).cloned())
    }

    fn load_stance(&self, id: &StanceId) -> Result<Option<Stance>, LedgerError> {
        Ok(self.stances.get(id).cloned())
    }

    fn has_evidence(&self, id: &EvidenceId) -> Result<bool, LedgerError> {
        Ok(self.evidence.contains_key(id))
    }

    fn has_open_gap(&self, id: &GapId) -> Result<bool, LedgerError> {
        Ok(self.gaps.get(id).is_some_and(|g| g.is_open()))
    }

    fn load_access_rules(&self) -> Result<AccessRules, LedgerError> {
        Ok(self.access.clone())
    }

    fn count_stories_on_topics(
        &self,
        topics: &std::collections::BTreeSet<String>,
        exclude: Option<&StoryId>,
    ) -> Result<usize, LedgerError> {
        let count = self
            .stories
            .values()
            .filter(|s| s.status != super::story::StoryStatus::Archived)
            .filter(|s| Some(&s.id) != exclude)
            .filter(|s| s.topics.intersection(topics).next().is_some())
            .count();
        Ok(count)
    }
}
