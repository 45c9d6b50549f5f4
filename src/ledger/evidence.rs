//! Evidence cards: discrete fact fragments available to the narrative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier for an evidence card (e.g. `E-17`).
///
/// Identifiers are caller-supplied and never reused; superseded evidence
/// is marked resolved or disputed, not deleted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvidenceId(String);

impl EvidenceId {
    /// Create an evidence identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EvidenceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Lifecycle status of an evidence card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStatus {
    /// Referenced but not yet examined by any stance.
    Pending,
    /// Examined and incorporated into at least one interpretation.
    Analyzed,
    /// Contested by conflicting interpretations.
    Disputed,
    /// Settled; no longer an open question.
    Resolved,
}

impl EvidenceStatus {
    /// Display name for this status.
    pub fn name(&self) -> &'static str {
        match self {
            EvidenceStatus::Pending => "pending",
            EvidenceStatus::Analyzed => "analyzed",
            EvidenceStatus::Disputed => "disputed",
            EvidenceStatus::Resolved => "resolved",
        }
    }
}

/// A discrete fact fragment established somewhere in the shared narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique, stable identifier.
    pub id: EvidenceId,
    /// Short title.
    pub title: String,
    /// Free-text content of the fact.
    pub content: String,
    /// Type tag (e.g. "document", "testimony", "artifact").
    pub kind: String,
    /// Author or character that discovered the fact.
    pub discovered_by: String,
    /// When the fact entered the narrative.
    pub discovered_at: DateTime<Utc>,
    /// Where the fact was discovered.
    pub location: String,
    /// Lifecycle status.
    pub status: EvidenceStatus,
    /// Free-form tags for topic queries.
    pub tags: BTreeSet<String>,
}

impl Evidence {
    /// Create a new pending evidence card.
    pub fn new(id: impl Into<EvidenceId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            kind: String::new(),
            discovered_by: String::new(),
            discovered_at: Utc::now(),
            location: String::new(),
            status: EvidenceStatus::Pending,
            tags: BTreeSet::new(),
        }
    }

    /// Set the content text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the discoverer.
    pub fn with_discoverer(mut self, who: impl Into<String>) -> Self {
        self.discovered_by = who.into();
        self
    }

    /// Set the discovery location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the discovery time.
    pub fn with_discovered_at(mut self, at: DateTime<Utc>) -> Self {
        self.discovered_at = at;
        self
    }

    /// Add a topic tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Transition to a new status. Evidence is only ever mutated this way.
    pub fn set_status(&mut self, status: EvidenceStatus) {
        self.status = status;
    }

    /// Check whether the card carries a given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
