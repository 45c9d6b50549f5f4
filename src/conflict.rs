//! The conflict checker: the consistency oracle that vets proposed events
//! against a story's canonical history.
//!
//! Rules run in a fixed order and the first decisive rule wins:
//! temporal overlap (hard), entity scope (hard), stance mutual exclusion
//! (soft), otherwise allowed. Checking never mutates the ledger; verdicts
//! are pure functions of the snapshot and the proposed event.

use crate::error::LedgerError;
use crate::ledger::{LedgerReader, NarrativeEvent, StoryRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The closed set of verdict classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictType {
    /// No conflict found.
    #[serde(rename = "TYPE_A")]
    Allowed,
    /// Soft conflict: flagged but non-blocking.
    #[serde(rename = "TYPE_B")]
    Soft,
    /// Hard violation: the action must not be committed.
    #[serde(rename = "ERROR")]
    Hard,
}

impl ConflictType {
    /// Wire name for this class.
    pub fn name(&self) -> &'static str {
        match self {
            ConflictType::Allowed => "TYPE_A",
            ConflictType::Soft => "TYPE_B",
            ConflictType::Hard => "ERROR",
        }
    }
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the event may be committed.
    pub allowed: bool,
    /// Which class of verdict this is.
    pub conflict_type: ConflictType,
    /// Identifiers of the canon the event collides with.
    pub conflicting_with: Vec<String>,
    /// Human-readable explanation.
    pub message: String,
}

impl Verdict {
    /// A clean pass.
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            conflict_type: ConflictType::Allowed,
            conflicting_with: Vec::new(),
            message: "no conflict with established canon".to_string(),
        }
    }

    /// A non-blocking flagged inconsistency.
    pub fn soft(conflicting_with: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            allowed: true,
            conflict_type: ConflictType::Soft,
            conflicting_with,
            message: message.into(),
        }
    }

    /// A blocking violation.
    pub fn violation(conflicting_with: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            conflict_type: ConflictType::Hard,
            conflicting_with,
            message: message.into(),
        }
    }

    /// Check whether this verdict blocks commitment.
    pub fn is_hard(&self) -> bool {
        self.conflict_type == ConflictType::Hard
    }

    /// Check whether this verdict should be surfaced as a warning.
    pub fn is_soft(&self) -> bool {
        self.conflict_type == ConflictType::Soft
    }
}

/// Vets proposed narrative events against canonical history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictChecker;

impl ConflictChecker {
    /// Create a checker.
    pub fn new() -> Self {
        Self
    }

    /// Classify a proposed event against a story's canonical history.
    ///
    /// Returns `Err` only when the ledger cannot be read; a verdict,
    /// including a hard violation, is a successful check.
    pub fn check(
        &self,
        reader: &impl LedgerReader,
        story: &StoryRecord,
        event: &NarrativeEvent,
    ) -> Result<Verdict, LedgerError> {
        if let Some(verdict) = self.check_temporal_overlap(story, event) {
            debug!(story = %story.id, verdict = verdict.conflict_type.name(), "conflict check");
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_entity_scope(reader, event)? {
            debug!(story = %story.id, verdict = verdict.conflict_type.name(), "conflict check");
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_stance_exclusion(reader, story, event)? {
            debug!(story = %story.id, verdict = verdict.conflict_type.name(), "conflict check");
            return Ok(verdict);
        }
        Ok(Verdict::allowed())
    }

    /// Rule 1: a proposed event may not overlap an established event at the
    /// same location unless that event allows conflicting retellings.
    /// Retconned events no longer bind the timeline.
    fn check_temporal_overlap(
        &self,
        story: &StoryRecord,
        event: &NarrativeEvent,
    ) -> Option<Verdict> {
        use crate::ledger::Disposition;

        for canonical in &story.events {
            if canonical.disposition == Disposition::Retconned || canonical.conflict_allowed {
                continue;
            }
            if !canonical.location.eq_ignore_ascii_case(&event.location) {
                continue;
            }
            if canonical.window.overlaps(&event.window) {
                return Some(Verdict::violation(
                    vec![canonical.id.to_string()],
                    format!(
                        "proposed event overlaps canonical event \"{}\" at {}",
                        canonical.summary, canonical.location
                    ),
                ));
            }
        }
        None
    }

    /// Rule 2: every involved entity must be cleared for the stances the
    /// event draws on, and must not touch material forbidden to it.
    fn check_entity_scope(
        &self,
        reader: &impl LedgerReader,
        event: &NarrativeEvent,
    ) -> Result<Option<Verdict>, LedgerError> {
        let rules = reader.load_access_rules()?;

        for entity in &event.entities {
            for stance_id in &event.stances {
                if rules.is_forbidden_stance(entity, stance_id) {
                    return Ok(Some(Verdict::violation(
                        vec![stance_id.to_string()],
                        format!("stance {stance_id} is forbidden material for {entity}"),
                    )));
                }
                if let Some(stance) = reader.load_stance(stance_id)? {
                    if !rules.may_reference_scope(entity, stance.view_scope) {
                        return Ok(Some(Verdict::violation(
                            vec![stance_id.to_string()],
                            format!(
                                "{entity} lacks {} clearance for stance {stance_id}",
                                stance.view_scope.name()
                            ),
                        )));
                    }
                }
            }
            for evidence_id in &event.evidence {
                if rules.is_forbidden_evidence(entity, evidence_id) {
                    return Ok(Some(Verdict::violation(
                        vec![evidence_id.to_string()],
                        format!("evidence {evidence_id} is forbidden material for {entity}"),
                    )));
                }
            }
        }
        Ok(None)
    }

    /// Rule 3: referencing two mutually exclusive stances is a soft
    /// conflict unless the story has acknowledged the dispute.
    fn check_stance_exclusion(
        &self,
        reader: &impl LedgerReader,
        story: &StoryRecord,
        event: &NarrativeEvent,
    ) -> Result<Option<Verdict>, LedgerError> {
        let ids: Vec<_> = event.stances.iter().collect();
        for (i, a) in ids.iter().enumerate() {
            let Some(stance_a) = reader.load_stance(a)? else {
                continue;
            };
            for b in ids.iter().skip(i + 1) {
                if !stance_a.conflicts(b) {
                    continue;
                }
                let Some(stance_b) = reader.load_stance(b)? else {
                    continue;
                };
                if !stance_b.conflicts(a) {
                    continue;
                }
                if story.is_acknowledged(a, b) {
                    continue;
                }
                return Ok(Some(Verdict::soft(
                    vec![a.to_string(), b.to_string()],
                    format!("stances {a} and {b} are mutually exclusive and the dispute is unacknowledged"),
                )));
            }
        }
        Ok(None)
    }
}
