//! The scoring engine: six bounded decision dimensions per candidate.
//!
//! Every score is a pure function of the current ledger snapshot and the
//! candidate's declared attributes. Scoring the same candidate against the
//! same snapshot always yields the same numbers.

use crate::candidate::{Candidate, CostLevel};
use crate::error::LedgerError;
use crate::ledger::{LedgerReader, StoryRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

/// The six decision dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    /// How much new material the action introduces.
    pub novelty: f32,
    /// How crowded the action's topic already is.
    pub coverage: f32,
    /// How strongly the action links back to established material.
    pub continuity: f32,
    /// How much dramatic tension the action carries.
    pub conflict: f32,
    /// What the action costs the characters involved.
    pub cost: f32,
    /// How likely the action is to collide with other agents or canon.
    pub risk: f32,
}

/// A candidate annotated with its scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The candidate as declared.
    pub candidate: Candidate,
    /// The six dimensions.
    pub scores: ScoreSet,
    /// Set for catastrophic-cost candidates: external approval required,
    /// the router never auto-commits these.
    pub needs_approval: bool,
}

/// Computes the six decision dimensions from a ledger snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Create a scoring engine.
    pub fn new() -> Self {
        Self
    }

    /// Score a whole decision batch.
    pub fn score_batch(
        &self,
        reader: &impl LedgerReader,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<ScoredCandidate>, LedgerError> {
        candidates
            .into_iter()
            .map(|c| self.score(reader, c))
            .collect()
    }

    /// Score a single candidate.
    pub fn score(
        &self,
        reader: &impl LedgerReader,
        candidate: Candidate,
    ) -> Result<ScoredCandidate, LedgerError> {
        let story = reader.load_story(&candidate.story)?;
        let story = story.as_ref();

        let novelty = self.novelty(reader, story, &candidate)?;
        let coverage = self.coverage(reader, &candidate)?;
        let continuity = self.continuity(reader, &candidate)?;
        let conflict = self.conflict(reader, &candidate)?;
        let (cost, needs_approval) = self.cost(&candidate);
        let risk = self.risk(&candidate);

        let scores = ScoreSet {
            novelty,
            coverage,
            continuity,
            conflict,
            cost,
            risk,
        };
        trace!(candidate = %candidate.id, ?scores, "scored");

        Ok(ScoredCandidate {
            candidate,
            scores,
            needs_approval,
        })
    }

    /// Novelty: base 0.3; +0.3 for evidence the story has not referenced;
    /// +0.3 for opening a new gap; +0.2 for an unused perspective;
    /// +0.2 for being the first to surface a stance conflict. Capped at 1.
    fn novelty(
        &self,
        reader: &impl LedgerReader,
        story: Option<&StoryRecord>,
        candidate: &Candidate,
    ) -> Result<f32, LedgerError> {
        let mut score: f32 = 0.3;

        let has_fresh_evidence = candidate.evidence.iter().any(|id| match story {
            Some(story) => !story.has_referenced_evidence(id),
            None => true,
        });
        if has_fresh_evidence {
            score += 0.3;
        }

        if candidate.opens_gap.is_some() {
            score += 0.3;
        }

        if let Some(perspective) = &candidate.perspective {
            let unused = story.map_or(true, |s| !s.perspectives.contains(perspective));
            if unused {
                score += 0.2;
            }
        }

        if self.surfaces_new_stance_conflict(reader, story, candidate)? {
            score += 0.2;
        }

        Ok(score.min(1.0))
    }

    fn surfaces_new_stance_conflict(
        &self,
        reader: &impl LedgerReader,
        story: Option<&StoryRecord>,
        candidate: &Candidate,
    ) -> Result<bool, LedgerError> {
        for (i, a) in candidate.stances.iter().enumerate() {
            let Some(stance_a) = reader.load_stance(a)? else {
                continue;
            };
            for b in candidate.stances.iter().skip(i + 1) {
                if !stance_a.conflicts(b) {
                    continue;
                }
                let mutual = reader
                    .load_stance(b)?
                    .is_some_and(|sb| sb.conflicts(a));
                if !mutual {
                    continue;
                }
                let already_surfaced = story.is_some_and(|s| {
                    s.is_acknowledged(a, b) || s.has_surfaced_conflict(a, b)
                });
                if !already_surfaced {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Coverage: a step function of how many other live stories already
    /// address the candidate's topics.
    fn coverage(
        &self,
        reader: &impl LedgerReader,
        candidate: &Candidate,
    ) -> Result<f32, LedgerError> {
        let count =
            reader.count_stories_on_topics(&candidate.topics, Some(&candidate.story))?;
        Ok(match count {
            0 => 0.1,
            1..=2 => 0.3,
            3..=5 => 0.5,
            6..=10 => 0.7,
            _ => 0.9,
        })
    }

    /// Continuity: a step function of the prior gaps and evidence the
    /// candidate links back to, penalized for forbidden material.
    fn continuity(
        &self,
        reader: &impl LedgerReader,
        candidate: &Candidate,
    ) -> Result<f32, LedgerError> {
        let mut links = 0usize;
        for id in &candidate.evidence {
            if reader.has_evidence(id)? {
                links += 1;
            }
        }
        for id in &candidate.linked_gaps {
            if reader.has_open_gap(id)? {
                links += 1;
            }
        }

        let mut score: f32 = match links {
            0 => 0.2,
            1..=2 => 0.5,
            3..=5 => 0.7,
            _ => 0.9,
        };

        if !candidate.actor.is_empty() {
            let rules = reader.load_access_rules()?;
            let touches_forbidden = candidate
                .evidence
                .iter()
                .any(|id| rules.is_forbidden_evidence(&candidate.actor, id))
                || candidate
                    .stances
                    .iter()
                    .any(|id| rules.is_forbidden_stance(&candidate.actor, id));
            if touches_forbidden {
                score = (score - 0.5).max(0.0);
            }
        }

        Ok(score)
    }

    /// Conflict: 0.1 with no stance; 0.2 for description; 0.6 for a
    /// two-stance disagreement; 0.9 for a multi-stance escalation.
    /// Referenced stances unknown to the ledger do not count.
    fn conflict(
        &self,
        reader: &impl LedgerReader,
        candidate: &Candidate,
    ) -> Result<f32, LedgerError> {
        let mut known = BTreeSet::new();
        for id in &candidate.stances {
            if reader.load_stance(id)?.is_some() {
                known.insert(id.clone());
            }
        }

        let mut disagreement = false;
        let ids: Vec<_> = known.iter().collect();
        'outer: for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                let mutual = reader
                    .load_stance(a)?
                    .is_some_and(|sa| sa.conflicts(b))
                    && reader.load_stance(b)?.is_some_and(|sb| sb.conflicts(a));
                if mutual {
                    disagreement = true;
                    break 'outer;
                }
            }
        }

        Ok(match (known.len(), disagreement) {
            (0, _) => 0.1,
            (1, _) => 0.2,
            (_, false) => 0.2,
            (2, true) => 0.6,
            (_, true) => 0.9,
        })
    }

    /// Cost: stepped by declared level. Catastrophic cost is flagged for
    /// external approval rather than auto-scored into commit paths.
    fn cost(&self, candidate: &Candidate) -> (f32, bool) {
        match candidate.cost {
            CostLevel::None => (0.2, false),
            CostLevel::Acceptable => (0.5, false),
            CostLevel::Significant => (0.8, false),
            CostLevel::Catastrophic => (0.8, true),
        }
    }

    /// Risk: base 0.2 plus the declared signals, capped at 1.
    fn risk(&self, candidate: &Candidate) -> f32 {
        let signals = &candidate.risk_signals;
        let mut score: f32 = 0.2;
        if signals.contested_topic {
            score += 0.4;
        }
        if signals.faction_alignment {
            score += 0.3;
        }
        if signals.setting_contradiction {
            score += 0.3;
        }
        if signals.near_duplicate {
            score += 0.2;
        }
        score.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{ActionKind, RiskSignals};
    use crate::ledger::{
        Evidence, Gap, LedgerStore, Stance, StoryRecord, StoryStatus, ViewScope,
    };

    fn seeded_store() -> LedgerStore {
        let mut store = LedgerStore::new();
        for id in ["E-1", "E-2", "E-3"] {
            store.upsert_evidence(Evidence::new(id, id)).unwrap();
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
            .unwrap();
        store.upsert_gap(Gap::new("GAP-1", "Who signed the manifest?")).unwrap();
        store
            .upsert_story(
                StoryRecord::new("ST-1", "The Harbor Account")
                    .with_status(StoryStatus::Active)
                    .with_topic("lighthouse"),
            )
            .unwrap();
        store
    }

    fn score(store: &LedgerStore, candidate: Candidate) -> ScoredCandidate {
        ScoringEngine::new().score(store, candidate).unwrap()
    }

    #[test]
    fn test_novelty_base_case() {
        let store = seeded_store();
        let scored = score(&store, Candidate::new("C-1", ActionKind::Continue, "ST-1"));
        assert!((scored.scores.novelty - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_novelty_accumulates_and_caps() {
        let store = seeded_store();
        let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
            .with_evidence("E-1") // fresh to the story: +0.3
            .opening_gap(Gap::new("GAP-9", "?")) // +0.3
            .with_perspective("first-person") // +0.2
            .with_stance("S-1")
            .with_stance("S-2"); // first surfaced conflict: +0.2
        let scored = score(&store, candidate);
        assert!((scored.scores.novelty - 1.0).abs() < 1e-6, "sum capped at 1.0");
    }

    #[test]
    fn test_novelty_no_credit_for_known_material() {
        let mut store = seeded_store();
        let story = store
            .query_story(&crate::ledger::StoryId::new("ST-1"))
            .unwrap()
            .clone();
        let mut story = story;
        story.referenced_evidence.insert("E-1".into());
        story.perspectives.insert("first-person".to_string());
        story.acknowledge_dispute("S-1".into(), "S-2".into());
        store.upsert_story(story).unwrap();

        let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
            .with_evidence("E-1")
            .with_perspective("first-person")
            .with_stance("S-1")
            .with_stance("S-2");
        let scored = score(&store, candidate);
        assert!((scored.scores.novelty - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_steps() {
        let mut store = seeded_store();
        let candidate =
            Candidate::new("C-1", ActionKind::NewStory, "ST-NEW").with_topic("lighthouse");
        assert!((score(&store, candidate.clone()).scores.coverage - 0.3).abs() < 1e-6);

        for i in 2..=4 {
            store
                .upsert_story(
                    StoryRecord::new(format!("ST-{i}").as_str(), "another")
                        .with_status(StoryStatus::Active)
                        .with_topic("lighthouse"),
                )
                .unwrap();
        }
        assert!((score(&store, candidate.clone()).scores.coverage - 0.5).abs() < 1e-6);

        let untouched =
            Candidate::new("C-2", ActionKind::NewStory, "ST-NEW").with_topic("meteor");
        assert!((score(&store, untouched).scores.coverage - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_continuity_steps() {
        let store = seeded_store();

        let none = Candidate::new("C-1", ActionKind::Continue, "ST-1");
        assert!((score(&store, none).scores.continuity - 0.2).abs() < 1e-6);

        let two = Candidate::new("C-2", ActionKind::Continue, "ST-1")
            .with_evidence("E-1")
            .with_linked_gap("GAP-1");
        assert!((score(&store, two).scores.continuity - 0.5).abs() < 1e-6);

        let four = Candidate::new("C-3", ActionKind::Continue, "ST-1")
            .with_evidence("E-1")
            .with_evidence("E-2")
            .with_evidence("E-3")
            .with_linked_gap("GAP-1");
        assert!((score(&store, four).scores.continuity - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_continuity_forbidden_penalty_floors_at_zero() {
        let mut store = seeded_store();
        store.access_mut().forbid_evidence("agent-7", "E-1");

        let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
            .by("agent-7")
            .with_evidence("E-1");
        let scored = score(&store, candidate);
        // 1 link -> 0.5, minus the 0.5 penalty.
        assert!(scored.scores.continuity.abs() < 1e-6);
    }

    #[test]
    fn test_conflict_steps() {
        let store = seeded_store();

        let none = Candidate::new("C-1", ActionKind::Continue, "ST-1");
        assert!((score(&store, none).scores.conflict - 0.1).abs() < 1e-6);

        let single = Candidate::new("C-2", ActionKind::Continue, "ST-1").with_stance("S-1");
        assert!((score(&store, single).scores.conflict - 0.2).abs() < 1e-6);

        let pair = Candidate::new("C-3", ActionKind::Continue, "ST-1")
            .with_stance("S-1")
            .with_stance("S-2");
        assert!((score(&store, pair).scores.conflict - 0.6).abs() < 1e-6);

        let escalation = Candidate::new("C-4", ActionKind::Continue, "ST-1")
            .with_stance("S-1")
            .with_stance("S-2")
            .with_stance("S-3");
        assert!((score(&store, escalation).scores.conflict - 0.9).abs() < 1e-6);

        // Two stances that merely coexist are description, not disagreement.
        let coexist = Candidate::new("C-5", ActionKind::Continue, "ST-1")
            .with_stance("S-1")
            .with_stance("S-3");
        assert!((score(&store, coexist).scores.conflict - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_cost_levels_and_approval_flag() {
        let store = seeded_store();

        let free = Candidate::new("C-1", ActionKind::Continue, "ST-1");
        let scored = score(&store, free);
        assert!((scored.scores.cost - 0.2).abs() < 1e-6);
        assert!(!scored.needs_approval);

        let catastrophic = Candidate::new("C-2", ActionKind::Continue, "ST-1")
            .with_cost(CostLevel::Catastrophic);
        let scored = score(&store, catastrophic);
        assert!(scored.needs_approval, "catastrophic cost requires approval");
    }

    #[test]
    fn test_risk_accumulates_and_caps() {
        let store = seeded_store();

        let calm = Candidate::new("C-1", ActionKind::Continue, "ST-1");
        assert!((score(&store, calm).scores.risk - 0.2).abs() < 1e-6);

        let hot = Candidate::new("C-2", ActionKind::Continue, "ST-1").with_risk_signals(
            RiskSignals {
                contested_topic: true,
                faction_alignment: true,
                setting_contradiction: true,
                near_duplicate: true,
            },
        );
        assert!((score(&store, hot).scores.risk - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let store = seeded_store();
        let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
            .with_evidence("E-1")
            .with_stance("S-1")
            .with_stance("S-2");

        let first = score(&store, candidate.clone()).scores;
        let second = score(&store, candidate).scores;
        assert_eq!(first, second);
    }
}
