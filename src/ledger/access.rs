//! Access rules: per-entity scope clearances and forbidden material.
//!
//! Supplied by the platform's policy layer and held on the ledger so that
//! both the conflict checker (hard scope violations) and the scoring
//! engine (continuity penalty) read the same rules.

use super::evidence::EvidenceId;
use super::stance::{StanceId, ViewScope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Role-boundary rules for the entities acting in the shared world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessRules {
    /// Widest stance visibility each entity may draw on.
    /// Entities without an entry default to `ViewScope::Local`.
    clearances: BTreeMap<String, ViewScope>,
    /// Evidence each entity must not reference.
    forbidden_evidence: BTreeMap<String, BTreeSet<EvidenceId>>,
    /// Stances each entity must not reference.
    forbidden_stances: BTreeMap<String, BTreeSet<StanceId>>,
}

impl AccessRules {
    /// Create empty rules (everyone at local clearance, nothing forbidden).
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant an entity a scope clearance.
    pub fn grant(&mut self, entity: impl Into<String>, scope: ViewScope) {
        self.clearances.insert(entity.into(), scope);
    }

    /// Forbid an entity from referencing an evidence card.
    pub fn forbid_evidence(&mut self, entity: impl Into<String>, id: impl Into<EvidenceId>) {
        self.forbidden_evidence
            .entry(entity.into())
            .or_default()
            .insert(id.into());
    }

    /// Forbid an entity from referencing a stance.
    pub fn forbid_stance(&mut self, entity: impl Into<String>, id: impl Into<StanceId>) {
        self.forbidden_stances
            .entry(entity.into())
            .or_default()
            .insert(id.into());
    }

    /// The widest scope this entity may draw on.
    pub fn clearance_for(&self, entity: &str) -> ViewScope {
        self.clearances.get(entity).copied().unwrap_or_default()
    }

    /// Check whether an entity may reference material at the given scope.
    ///
    /// `Global` material is common knowledge and always usable. Narrower
    /// material requires a clearance at least as wide as its scope.
    pub fn may_reference_scope(&self, entity: &str, scope: ViewScope) -> bool {
        scope <= self.clearance_for(entity) || scope == ViewScope::Global
    }

    /// Check whether an evidence card is forbidden for an entity.
    pub fn is_forbidden_evidence(&self, entity: &str, id: &EvidenceId) -> bool {
        self.forbidden_evidence
            .get(entity)
            .is_some_and(|set| set.contains(id))
    }

    /// Check whether a stance is forbidden for an entity.
    pub fn is_forbidden_stance(&self, entity: &str, id: &StanceId) -> bool {
        self.forbidden_stances
            .get(entity)
            .is_some_and(|set| set.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clearance_is_local() {
        let rules = AccessRules::new();
        assert_eq!(rules.clearance_for("unlisted"), ViewScope::Local);
        assert!(rules.may_reference_scope("unlisted", ViewScope::Local));
        assert!(rules.may_reference_scope("unlisted", ViewScope::Global));
        assert!(!rules.may_reference_scope("unlisted", ViewScope::Regional));
    }

    #[test]
    fn test_granted_clearance() {
        let mut rules = AccessRules::new();
        rules.grant("Mara", ViewScope::Regional);

        assert!(rules.may_reference_scope("Mara", ViewScope::Regional));
        assert!(rules.may_reference_scope("Mara", ViewScope::Local));
    }

    #[test]
    fn test_forbidden_material() {
        let mut rules = AccessRules::new();
        rules.forbid_evidence("agent-7", "E-9");
        rules.forbid_stance("agent-7", "S-2");

        assert!(rules.is_forbidden_evidence("agent-7", &EvidenceId::new("E-9")));
        assert!(!rules.is_forbidden_evidence("agent-7", &EvidenceId::new("E-1")));
        assert!(rules.is_forbidden_stance("agent-7", &StanceId::new("S-2")));
        assert!(!rules.is_forbidden_stance("agent-8", &StanceId::new("S-2")));
    }
}
