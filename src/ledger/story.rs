//! Story records: the canonical timeline each story treats as established
//! history, plus the narrative events proposed against it.

use super::evidence::EvidenceId;
use super::gap::GapId;
use super::stance::StanceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Stable identifier for a story (e.g. `ST-12`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoryId(String);

impl StoryId {
    /// Create a story identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Generated identifier for a canonical event, assigned at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new unique event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl StoryStatus {
    /// Display name for this status.
    pub fn name(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "draft",
            StoryStatus::Active => "active",
            StoryStatus::Paused => "paused",
            StoryStatus::Completed => "completed",
            StoryStatus::Archived => "archived",
        }
    }

    /// Check whether the story accepts continuations.
    pub fn is_active(&self) -> bool {
        matches!(self, StoryStatus::Active)
    }
}

/// How firmly an event sits in the canonical timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Established history; contradictions are violations.
    Canonical,
    /// Acknowledged as contested.
    Disputed,
    /// Written out of the timeline; no longer binds new events.
    Retconned,
}

/// An inclusive span of in-world time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a time window. Panics in debug builds if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "time window start must not follow its end");
        Self { start, end }
    }

    /// Check whether two windows share any instant.
    ///
    /// Windows are inclusive, so a window ending exactly when another
    /// begins does overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A fact the story treats as established history at a given time and place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Generated identifier.
    pub id: EventId,
    /// One-line description of what happened.
    pub summary: String,
    /// When it happened.
    pub window: TimeWindow,
    /// Where it happened.
    pub location: String,
    /// Entities (characters, factions) involved.
    pub entities: BTreeSet<String>,
    /// How firmly the event is canon.
    pub disposition: Disposition,
    /// Whether future conflicting events at this window are permitted.
    pub conflict_allowed: bool,
    /// Evidence the event references.
    pub evidence: BTreeSet<EvidenceId>,
    /// Stances the event references.
    pub stances: BTreeSet<StanceId>,
}

/// A proposed narrative event, not yet committed to any timeline.
///
/// This is what candidates carry and what the conflict checker inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeEvent {
    /// One-line description of what would happen.
    pub summary: String,
    /// When it would happen.
    pub window: TimeWindow,
    /// Where it would happen.
    pub location: String,
    /// Entities involved.
    pub entities: BTreeSet<String>,
    /// Evidence the event references.
    pub evidence: BTreeSet<EvidenceId>,
    /// Stances the event references.
    pub stances: BTreeSet<StanceId>,
    /// Whether the author permits later conflicting events at this window.
    pub conflict_allowed: bool,
}

impl NarrativeEvent {
    /// Create a proposed event.
    pub fn new(summary: impl Into<String>, window: TimeWindow, location: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            window,
            location: location.into(),
            entities: BTreeSet::new(),
            evidence: BTreeSet::new(),
            stances: BTreeSet::new(),
            conflict_allowed: false,
        }
    }

    /// Add an involved entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.insert(entity.into());
        self
    }

    /// Reference an evidence card.
    pub fn with_evidence(mut self, id: impl Into<EvidenceId>) -> Self {
        self.evidence.insert(id.into());
        self
    }

    /// Reference a stance.
    pub fn with_stance(mut self, id: impl Into<StanceId>) -> Self {
        self.stances.insert(id.into());
        self
    }

    /// Permit later conflicting events at this window.
    pub fn allow_conflicts(mut self) -> Self {
        self.conflict_allowed = true;
        self
    }

    /// Freeze the proposal into a canonical event with a fresh identifier.
    pub fn into_canonical(self) -> CanonicalEvent {
        CanonicalEvent {
            id: EventId::new(),
            summary: self.summary,
            window: self.window,
            location: self.location,
            entities: self.entities,
            disposition: Disposition::Canonical,
            conflict_allowed: self.conflict_allowed,
            evidence: self.evidence,
            stances: self.stances,
        }
    }
}

/// Per-story canonical state: timeline, references, open questions, authors.
///
/// The record carries an optimistic version counter; every committed
/// mutation bumps it, and commits against a stale version fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Unique, stable identifier.
    pub id: StoryId,
    /// Story title.
    pub title: String,
    /// Lifecycle status. Completed stories are archived, never deleted.
    pub status: StoryStatus,
    /// Narrative perspective/voice tags already used.
    pub perspectives: BTreeSet<String>,
    /// Topic tags the story addresses.
    pub topics: BTreeSet<String>,
    /// Ordered canonical timeline.
    pub events: Vec<CanonicalEvent>,
    /// Evidence the story has referenced.
    pub referenced_evidence: BTreeSet<EvidenceId>,
    /// Stances the story has referenced.
    pub referenced_stances: BTreeSet<StanceId>,
    /// Gaps the story has opened and not yet resolved.
    pub open_gaps: BTreeSet<GapId>,
    /// Authors who have contributed.
    pub authors: BTreeSet<String>,
    /// Stance conflicts the story has acknowledged as in-world disputes,
    /// stored as normalized (min, max) pairs.
    pub acknowledged_disputes: BTreeSet<(StanceId, StanceId)>,
    /// Candidate identifiers already committed, for idempotence checks.
    pub committed_candidates: BTreeSet<String>,
    /// Optimistic concurrency version.
    pub version: u64,
}

impl StoryRecord {
    /// Create a draft story record.
    pub fn new(id: impl Into<StoryId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: StoryStatus::Draft,
            perspectives: BTreeSet::new(),
            topics: BTreeSet::new(),
            events: Vec::new(),
            referenced_evidence: BTreeSet::new(),
            referenced_stances: BTreeSet::new(),
            open_gaps: BTreeSet::new(),
            authors: BTreeSet::new(),
            acknowledged_disputes: BTreeSet::new(),
            committed_candidates: BTreeSet::new(),
            version: 0,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: StoryStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a topic tag.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.insert(topic.into());
        self
    }

    /// Add a perspective/voice tag.
    pub fn with_perspective(mut self, perspective: impl Into<String>) -> Self {
        self.perspectives.insert(perspective.into());
        self
    }

    /// Add a contributing author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.insert(author.into());
        self
    }

    /// Mark a stance conflict as an acknowledged in-world dispute.
    pub fn acknowledge_dispute(&mut self, a: StanceId, b: StanceId) {
        self.acknowledged_disputes.insert(normalize_pair(a, b));
    }

    /// Check whether a stance conflict is an acknowledged dispute.
    pub fn is_acknowledged(&self, a: &StanceId, b: &StanceId) -> bool {
        let key = normalize_pair(a.clone(), b.clone());
        self.acknowledged_disputes.contains(&key)
    }

    /// Check whether the story has already referenced an evidence card.
    pub fn has_referenced_evidence(&self, id: &EvidenceId) -> bool {
        self.referenced_evidence.contains(id)
    }

    /// Check whether any canonical event references both stances.
    pub fn has_surfaced_conflict(&self, a: &StanceId, b: &StanceId) -> bool {
        self.events
            .iter()
            .any(|e| e.stances.contains(a) && e.stances.contains(b))
    }

    /// Archive the story on completion.
    pub fn archive(&mut self) {
        self.status = StoryStatus::Archived;
    }
}

/// Order a stance pair deterministically for set storage.
fn normalize_pair(a: StanceId, b: StanceId) -> (StanceId, StanceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start_hour: u32, end_hour: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(1891, 3, 14, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1891, 3, 14, end_hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_window_overlap() {
        assert!(window(1, 4).overlaps(&window(3, 6)));
        assert!(window(3, 6).overlaps(&window(1, 4)));
        assert!(window(1, 4).overlaps(&window(1, 4)), "identical windows overlap");
        assert!(window(1, 4).overlaps(&window(4, 6)), "touching endpoints overlap");
        assert!(!window(1, 2).overlaps(&window(3, 4)));
    }

    #[test]
    fn test_narrative_event_into_canonical() {
        let event = NarrativeEvent::new("The lamp goes dark", window(2, 3), "the lighthouse")
            .with_entity("Mara")
            .with_evidence("E-1")
            .with_stance("S-1");

        let canonical = event.into_canonical();
        assert_eq!(canonical.disposition, Disposition::Canonical);
        assert!(!canonical.conflict_allowed);
        assert!(canonical.entities.contains("Mara"));
    }

    #[test]
    fn test_acknowledged_disputes_symmetric_lookup() {
        let mut story = StoryRecord::new("ST-1", "The Harbor Account");
        story.acknowledge_dispute(StanceId::new("S-2"), StanceId::new("S-1"));

        assert!(story.is_acknowledged(&StanceId::new("S-1"), &StanceId::new("S-2")));
        assert!(story.is_acknowledged(&StanceId::new("S-2"), &StanceId::new("S-1")));
        assert!(!story.is_acknowledged(&StanceId::new("S-1"), &StanceId::new("S-3")));
    }

    #[test]
    fn test_story_defaults() {
        let story = StoryRecord::new("ST-1", "The Harbor Account")
            .with_status(StoryStatus::Active)
            .with_topic("lighthouse")
            .with_author("agent-7");

        assert!(story.status.is_active());
        assert_eq!(story.version, 0);
        assert!(story.events.is_empty());
    }
}
