//! Stance cards: interpretive positions taken by factions.

use super::evidence::EvidenceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier for a stance card (e.g. `S-3`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StanceId(String);

impl StanceId {
    /// Create a stance identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How widely a stance is visible within the shared world.
///
/// Scopes are ordered: an entity cleared for `Global` material may also
/// draw on `Regional` and `Local` material, but not the reverse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewScope {
    /// Known only at one place or to one group.
    #[default]
    Local,
    /// Known across a region or faction.
    Regional,
    /// Common knowledge of the setting.
    Global,
}

impl ViewScope {
    /// Display name for this scope.
    pub fn name(&self) -> &'static str {
        match self {
            ViewScope::Local => "local",
            ViewScope::Regional => "regional",
            ViewScope::Global => "global",
        }
    }
}

/// Cost descriptors attached to holding a stance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StanceCost {
    /// Resource cost descriptor.
    pub resources: String,
    /// Time cost descriptor.
    pub time: String,
    /// Risk descriptor.
    pub risk: String,
}

/// An interpretive position with declared evidence, conflicts, and costs.
///
/// Invariant (enforced by the ledger store at write time): the
/// `conflicts_with` relation is symmetric. If A lists B, B must list A.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stance {
    /// Unique, stable identifier.
    pub id: StanceId,
    /// Short title.
    pub title: String,
    /// Type tag (e.g. "theory", "accusation", "policy").
    pub kind: String,
    /// The position itself, in prose.
    pub position: String,
    /// Evidence this stance relies on, in declaration order, no duplicates.
    pub evidence: Vec<EvidenceId>,
    /// Stances this one is mutually exclusive with.
    pub conflicts_with: BTreeSet<StanceId>,
    /// Declared cost of holding the stance.
    pub cost: StanceCost,
    /// How widely the stance is visible.
    pub view_scope: ViewScope,
}

impl Stance {
    /// Create a new stance with local visibility and no declared relations.
    pub fn new(id: impl Into<StanceId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: String::new(),
            position: String::new(),
            evidence: Vec::new(),
            conflicts_with: BTreeSet::new(),
            cost: StanceCost::default(),
            view_scope: ViewScope::Local,
        }
    }

    /// Set the type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the position text.
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    /// Declare a supporting evidence card (order preserved, duplicates dropped).
    pub fn with_evidence(mut self, id: impl Into<EvidenceId>) -> Self {
        let id = id.into();
        if !self.evidence.contains(&id) {
            self.evidence.push(id);
        }
        self
    }

    /// Declare a mutual-exclusion conflict with another stance.
    pub fn with_conflict(mut self, id: impl Into<StanceId>) -> Self {
        self.conflicts_with.insert(id.into());
        self
    }

    /// Set the visibility scope.
    pub fn with_scope(mut self, scope: ViewScope) -> Self {
        self.view_scope = scope;
        self
    }

    /// Set the cost descriptors.
    pub fn with_cost(mut self, cost: StanceCost) -> Self {
        self.cost = cost;
        self
    }

    /// Check whether this stance declares a conflict with another.
    pub fn conflicts(&self, other: &StanceId) -> bool {
        self.conflicts_with.contains(other)
    }
}
