//! Gap cards: acknowledged unknowns linking evidence and stances to
//! unresolved story hooks.

use super::evidence::EvidenceId;
use super::stance::StanceId;
use super::story::StoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a gap card (e.g. `GAP-4`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GapId(String);

impl GapId {
    /// Create a gap identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GapId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How pressing an open question is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Display name for this urgency.
    pub fn name(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// A place where a story has picked up an open question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryHook {
    /// The story that introduced the hook.
    pub story: StoryId,
    /// What kind of hook (e.g. "foreshadowing", "cliffhanger").
    pub hook_type: String,
    /// When the hook was introduced.
    pub introduced_at: DateTime<Utc>,
}

/// An acknowledged unknown.
///
/// Gaps are closed when later evidence resolves them; they are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    /// Unique, stable identifier.
    pub id: GapId,
    /// Evidence cards the question grows out of.
    pub evidence: Vec<EvidenceId>,
    /// Stances the question bears on.
    pub stances: Vec<StanceId>,
    /// The open question, in prose.
    pub description: String,
    /// How pressing the question is.
    pub urgency: Urgency,
    /// Stories that have picked this question up.
    pub hooks: Vec<StoryHook>,
    /// Evidence that closed the gap, if any. `None` means still open.
    pub resolved_by: Option<EvidenceId>,
}

impl Gap {
    /// Create a new open gap.
    pub fn new(id: impl Into<GapId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            evidence: Vec::new(),
            stances: Vec::new(),
            description: description.into(),
            urgency: Urgency::Medium,
            hooks: Vec::new(),
            resolved_by: None,
        }
    }

    /// Link a related evidence card.
    pub fn with_evidence(mut self, id: impl Into<EvidenceId>) -> Self {
        let id = id.into();
        if !self.evidence.contains(&id) {
            self.evidence.push(id);
        }
        self
    }

    /// Link a related stance.
    pub fn with_stance(mut self, id: impl Into<StanceId>) -> Self {
        let id = id.into();
        if !self.stances.contains(&id) {
            self.stances.push(id);
        }
        self
    }

    /// Set the urgency.
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Record that a story picked up this question.
    pub fn add_hook(&mut self, story: StoryId, hook_type: impl Into<String>) {
        self.hooks.push(StoryHook {
            story,
            hook_type: hook_type.into(),
            introduced_at: Utc::now(),
        });
    }

    /// Close the gap with the evidence that resolved it.
    pub fn close(&mut self, resolving: EvidenceId) {
        self.resolved_by = Some(resolving);
    }

    /// Check whether the question is still open.
    pub fn is_open(&self) -> bool {
        self.resolved_by.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_lifecycle() {
        let mut gap = Gap::new("GAP-1", "Who extinguished the lighthouse lamp?")
            .with_evidence("E-1")
            .with_stance("S-1")
            .with_urgency(Urgency::High);

        assert!(gap.is_open());
        assert_eq!(gap.urgency, Urgency::High);

        gap.add_hook(StoryId::new("ST-1"), "foreshadowing");
        assert_eq!(gap.hooks.len(), 1);

        gap.close(EvidenceId::new("E-9"));
        assert!(!gap.is_open());
        assert_eq!(gap.resolved_by, Some(EvidenceId::new("E-9")));
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::Medium < Urgency::High);
    }
}
