//! The action router: turns a scored decision batch into exactly one
//! primary action, with an optional non-exclusive vote attached.
//!
//! Tiers are tried in order: continue an existing story, then start a new
//! one, then discuss. A batch that qualifies for nothing falls back to
//! silence. Every candidate selected for a story write is conflict-gated
//! first; a ledger probe failure routes to silence, never to a write.

use crate::candidate::{ActionKind, CandidateId, VoteDirection};
use crate::conflict::ConflictChecker;
use crate::error::LedgerError;
use crate::ledger::{LedgerReader, StoryId};
use crate::scoring::ScoredCandidate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Vote handling rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotePolicy {
    /// Refuse to route a downvote that carries no stated reason.
    pub downvote_requires_reason: bool,
}

impl Default for VotePolicy {
    fn default() -> Self {
        Self {
            downvote_requires_reason: true,
        }
    }
}

/// Platform content limits for story segments, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentLimits {
    pub segment_min: usize,
    pub segment_max: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            segment_min: 150,
            segment_max: 500,
        }
    }
}

/// Score thresholds and rules the router applies, in tier order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterPolicy {
    /// Continue tier: minimum continuity (exclusive).
    pub continue_min_continuity: f32,
    /// New-story tier: minimum novelty (exclusive).
    pub new_story_min_novelty: f32,
    /// New-story tier: minimum conflict (exclusive).
    pub new_story_min_conflict: f32,
    /// New-story tier: maximum coverage (exclusive).
    pub new_story_max_coverage: f32,
    /// Discuss tier: maximum risk (exclusive).
    pub discuss_max_risk: f32,
    /// Vote handling.
    pub vote: VotePolicy,
    /// Segment content limits.
    pub content: ContentLimits,
}

impl Default for RouterPolicy {
    fn default() -> Self {
        Self {
            continue_min_continuity: 0.7,
            new_story_min_novelty: 0.7,
            new_story_min_conflict: 0.6,
            new_story_max_coverage: 0.5,
            discuss_max_risk: 0.5,
            vote: VotePolicy::default(),
            content: ContentLimits::default(),
        }
    }
}

/// The primary action a decision resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Continue,
    NewStory,
    Discuss,
    Vote,
    Silence,
}

impl Action {
    /// Display name for this action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Continue => "continue",
            Action::NewStory => "new_story",
            Action::Discuss => "discuss",
            Action::Vote => "vote",
            Action::Silence => "silence",
        }
    }
}

/// The router's verdict on a decision batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The single primary action.
    pub action: Action,
    /// The candidate carrying the primary action, if any.
    pub chosen: Option<CandidateId>,
    /// A vote cast alongside the primary action, if any.
    pub vote: Option<CandidateId>,
    /// Non-fatal notes: soft conflicts, content-limit breaches, vote
    /// candidates dropped by policy.
    pub warnings: Vec<String>,
    /// Candidates vetoed by the conflict gate.
    pub vetoed: Vec<CandidateId>,
    /// Why the batch fell through to silence, when it did.
    pub reason: Option<String>,
}

impl Decision {
    fn silence(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Silence,
            chosen: None,
            vote: None,
            warnings: Vec::new(),
            vetoed: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

/// Routes scored candidates through the tiered action policy.
#[derive(Debug, Clone, Default)]
pub struct ActionRouter {
    policy: RouterPolicy,
    checker: ConflictChecker,
}

impl ActionRouter {
    /// Create a router with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with a custom policy.
    pub fn with_policy(policy: RouterPolicy) -> Self {
        Self {
            policy,
            checker: ConflictChecker::new(),
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &RouterPolicy {
        &self.policy
    }

    /// Route a scored batch against the current ledger state.
    ///
    /// `context` names the story the batch was assembled around; routing
    /// probes it first so an unreachable ledger resolves to silence before
    /// any candidate is considered. A ledger failure at any later point in
    /// the route also resolves to silence, never to a partial decision.
    pub fn route(
        &self,
        reader: &impl LedgerReader,
        context: &StoryId,
        batch: &[ScoredCandidate],
    ) -> Decision {
        if let Err(err) = reader.load_story(context) {
            warn!(story = %context, %err, "ledger probe failed, staying silent");
            return Decision::silence(format!("ledger unavailable: {err}"));
        }

        let mut decision = Decision {
            action: Action::Silence,
            chosen: None,
            vote: None,
            warnings: Vec::new(),
            vetoed: Vec::new(),
            reason: None,
        };

        match self.pick_primary(reader, batch, &mut decision) {
            Ok(Some((action, chosen))) => {
                decision.action = action;
                decision.chosen = Some(chosen);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(story = %context, %err, "ledger failed mid-route, staying silent");
                return Decision::silence(format!("ledger unavailable: {err}"));
            }
        }

        self.attach_vote(batch, &mut decision);

        if decision.chosen.is_none() {
            // A lone vote is promoted to the primary action.
            if let Some(id) = decision.vote.take() {
                decision.action = Action::Vote;
                decision.chosen = Some(id);
            } else {
                decision.reason = Some("no candidate met any tier threshold".to_string());
            }
        }

        self.check_content_limits(batch, &mut decision);
        debug!(
            action = decision.action.name(),
            chosen = ?decision.chosen,
            vetoed = decision.vetoed.len(),
            "batch routed"
        );
        decision
    }

    /// Try the exclusive tiers in order, returning the first selection.
    /// Any ledger failure propagates so the caller can fail closed.
    fn pick_primary(
        &self,
        reader: &impl LedgerReader,
        batch: &[ScoredCandidate],
        decision: &mut Decision,
    ) -> Result<Option<(Action, CandidateId)>, LedgerError> {
        if let Some(chosen) = self.pick_continue(reader, batch, decision)? {
            return Ok(Some((Action::Continue, chosen)));
        }
        if let Some(chosen) = self.pick_new_story(reader, batch, decision)? {
            return Ok(Some((Action::NewStory, chosen)));
        }
        Ok(self.pick_discuss(batch).map(|chosen| (Action::Discuss, chosen)))
    }

    /// Tier 1: continue a live story the batch links strongly into.
    fn pick_continue(
        &self,
        reader: &impl LedgerReader,
        batch: &[ScoredCandidate],
        decision: &mut Decision,
    ) -> Result<Option<CandidateId>, LedgerError> {
        let mut eligible: Vec<&ScoredCandidate> = Vec::new();
        for sc in batch {
            if sc.candidate.kind != ActionKind::Continue
                || sc.scores.continuity <= self.policy.continue_min_continuity
                || sc.needs_approval
            {
                continue;
            }
            if self.target_is_active(reader, sc)? {
                eligible.push(sc);
            }
        }
        eligible.sort_by(|a, b| {
            b.scores
                .continuity
                .total_cmp(&a.scores.continuity)
                .then(a.scores.risk.total_cmp(&b.scores.risk))
                .then(a.candidate.id.cmp(&b.candidate.id))
        });

        self.first_past_conflict_gate(reader, eligible, decision)
    }

    /// Tier 2: open a new story where the batch brings something fresh.
    fn pick_new_story(
        &self,
        reader: &impl LedgerReader,
        batch: &[ScoredCandidate],
        decision: &mut Decision,
    ) -> Result<Option<CandidateId>, LedgerError> {
        let mut eligible: Vec<&ScoredCandidate> = batch
            .iter()
            .filter(|sc| sc.candidate.kind == ActionKind::NewStory)
            .filter(|sc| sc.scores.novelty > self.policy.new_story_min_novelty)
            .filter(|sc| sc.scores.conflict > self.policy.new_story_min_conflict)
            .filter(|sc| sc.scores.coverage < self.policy.new_story_max_coverage)
            .filter(|sc| !sc.needs_approval)
            .collect();
        eligible.sort_by(|a, b| {
            b.scores
                .novelty
                .total_cmp(&a.scores.novelty)
                .then(a.scores.risk.total_cmp(&b.scores.risk))
                .then(a.candidate.id.cmp(&b.candidate.id))
        });

        self.first_past_conflict_gate(reader, eligible, decision)
    }

    /// Tier 3: a low-risk discussion with a concrete trigger. Candidates
    /// held for approval are surfaced here rather than dropped.
    fn pick_discuss(&self, batch: &[ScoredCandidate]) -> Option<CandidateId> {
        let mut eligible: Vec<&ScoredCandidate> = batch
            .iter()
            .filter(|sc| sc.candidate.kind == ActionKind::Discuss)
            .filter(|sc| sc.scores.risk < self.policy.discuss_max_risk)
            .filter(|sc| sc.candidate.discuss_trigger.is_some() || sc.needs_approval)
            .collect();
        eligible.sort_by(|a, b| {
            a.scores
                .risk
                .total_cmp(&b.scores.risk)
                .then(a.candidate.id.cmp(&b.candidate.id))
        });
        eligible.first().map(|sc| sc.candidate.id.clone())
    }

    /// Votes ride alongside any primary action. The best eligible vote is
    /// the lowest-risk one, ties broken by identifier.
    fn attach_vote(&self, batch: &[ScoredCandidate], decision: &mut Decision) {
        let mut eligible: Vec<&ScoredCandidate> = Vec::new();
        for sc in batch.iter().filter(|sc| sc.candidate.kind == ActionKind::Vote) {
            let Some(ballot) = &sc.candidate.vote else {
                decision
                    .warnings
                    .push(format!("vote candidate {} carries no ballot", sc.candidate.id));
                continue;
            };
            if self.policy.vote.downvote_requires_reason
                && ballot.direction == VoteDirection::Down
                && ballot.reason.as_deref().map_or(true, str::is_empty)
            {
                decision.warnings.push(format!(
                    "downvote {} dropped: no reason stated",
                    sc.candidate.id
                ));
                continue;
            }
            eligible.push(sc);
        }
        eligible.sort_by(|a, b| {
            a.scores
                .risk
                .total_cmp(&b.scores.risk)
                .then(a.candidate.id.cmp(&b.candidate.id))
        });
        decision.vote = eligible.first().map(|sc| sc.candidate.id.clone());
    }

    /// Walk the sorted candidates through the conflict gate: hard verdicts
    /// veto and move on, soft verdicts select with a warning. Ledger
    /// failures propagate.
    fn first_past_conflict_gate(
        &self,
        reader: &impl LedgerReader,
        eligible: Vec<&ScoredCandidate>,
        decision: &mut Decision,
    ) -> Result<Option<CandidateId>, LedgerError> {
        for sc in eligible {
            let Some(event) = &sc.candidate.event else {
                // Nothing to gate; a segment without a canonical event
                // cannot contradict the timeline.
                return Ok(Some(sc.candidate.id.clone()));
            };
            // A new story's record may not exist yet; gate only against
            // stories the ledger already holds.
            let Some(target) = reader.load_story(&sc.candidate.story)? else {
                return Ok(Some(sc.candidate.id.clone()));
            };
            let verdict = self.checker.check(reader, &target, event)?;
            if verdict.is_hard() {
                decision.vetoed.push(sc.candidate.id.clone());
                decision
                    .warnings
                    .push(format!("{} vetoed: {}", sc.candidate.id, verdict.message));
                continue;
            }
            if verdict.is_soft() {
                decision.warnings.push(format!(
                    "{} proceeds with a soft conflict: {}",
                    sc.candidate.id, verdict.message
                ));
            }
            return Ok(Some(sc.candidate.id.clone()));
        }
        Ok(None)
    }

    fn target_is_active(
        &self,
        reader: &impl LedgerReader,
        sc: &ScoredCandidate,
    ) -> Result<bool, LedgerError> {
        let story = reader.load_story(&sc.candidate.story)?;
        Ok(story.is_some_and(|s| s.status.is_active()))
    }

    fn check_content_limits(&self, batch: &[ScoredCandidate], decision: &mut Decision) {
        let Some(chosen) = &decision.chosen else {
            return;
        };
        let Some(sc) = batch.iter().find(|sc| &sc.candidate.id == chosen) else {
            return;
        };
        let Some(chars) = sc.candidate.segment_chars else {
            return;
        };
        let limits = &self.policy.content;
        if chars < limits.segment_min || chars > limits.segment_max {
            decision.warnings.push(format!(
                "segment length {chars} outside platform limits {}..={}",
                limits.segment_min, limits.segment_max
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, CostLevel, DiscussTrigger, RiskSignals, VoteBallot};
    use crate::ledger::{
        LedgerStore, NarrativeEvent, Stance, StoryRecord, StoryStatus, TimeWindow, ViewScope,
    };
    use crate::scoring::ScoringEngine;
    use crate::testing::{FlakyLedger, UnreachableLedger};
    use chrono::{TimeZone, Utc};

    fn window(start_hour: u32, end_hour: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(1891, 3, 14, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1891, 3, 14, end_hour, 0, 0).unwrap(),
        )
    }

    fn seeded_store() -> LedgerStore {
        let mut store = LedgerStore::new();
        for (id, title) in [
            ("E-1", "Torn letter"),
            ("E-2", "Harbor ledger page"),
            ("E-3", "Watch rota"),
            ("E-4", "Customs manifest"),
            ("E-5", "Keeper's logbook"),
        ] {
            store
                .upsert_evidence(crate::ledger::Evidence::new(id, title))
                .unwrap();
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
        store
            .upsert_gap(crate::ledger::Gap::new("GAP-1", "Who signed the manifest?"))
            .unwrap();
        store
            .upsert_story(
                StoryRecord::new("ST-1", "The Harbor Account")
                    .with_status(StoryStatus::Active)
                    .with_topic("lighthouse"),
            )
            .unwrap();
        store
    }

    fn route(store: &LedgerStore, candidates: Vec<Candidate>) -> Decision {
        let scored = ScoringEngine::new().score_batch(store, candidates).unwrap();
        ActionRouter::new().route(store, &"ST-1".into(), &scored)
    }

    fn strong_continue(id: &str) -> Candidate {
        // Six ledger links score continuity 0.9, clearing the strict 0.7 bar.
        Candidate::new(id, ActionKind::Continue, "ST-1")
            .with_evidence("E-1")
            .with_evidence("E-2")
            .with_evidence("E-3")
            .with_evidence("E-4")
            .with_evidence("E-5")
            .with_linked_gap("GAP-1")
    }

    #[test]
    fn test_empty_batch_is_silence() {
        let store = seeded_store();
        let decision = route(&store, vec![]);
        assert_eq!(decision.action, Action::Silence);
        assert!(decision.reason.is_some());
    }

    #[test]
    fn test_strong_continuation_routes_to_continue() {
        let store = seeded_store();
        let decision = route(&store, vec![strong_continue("C-1")]);
        assert_eq!(decision.action, Action::Continue);
        assert_eq!(decision.chosen, Some("C-1".into()));
    }

    #[test]
    fn test_weak_links_fall_through_continue() {
        let store = seeded_store();
        // One link: continuity 0.5, below the 0.7 bar.
        let candidate =
            Candidate::new("C-1", ActionKind::Continue, "ST-1").with_evidence("E-1");
        let decision = route(&store, vec![candidate]);
        assert_eq!(decision.action, Action::Silence);
    }

    #[test]
    fn test_inactive_story_cannot_be_continued() {
        let mut store = seeded_store();
        let mut story = store.query_story(&"ST-1".into()).unwrap().clone();
        story.status = StoryStatus::Paused;
        store.upsert_story(story).unwrap();

        let decision = route(&store, vec![strong_continue("C-1")]);
        assert_eq!(decision.action, Action::Silence);
    }

    #[test]
    fn test_new_story_tier() {
        let store = seeded_store();
        // Novelty: 0.3 base + 0.3 fresh evidence + 0.2 first conflict = 0.8.
        // Conflict: three stances with a conflicting pair = 0.9.
        // Coverage: no other story on the topic = 0.1.
        let candidate = Candidate::new("C-1", ActionKind::NewStory, "ST-NEW")
            .with_topic("meteor")
            .with_evidence("E-1")
            .with_stance("S-1")
            .with_stance("S-2")
            .with_stance("S-3");
        let decision = route(&store, vec![candidate]);
        assert_eq!(decision.action, Action::NewStory);
        assert_eq!(decision.chosen, Some("C-1".into()));
    }

    #[test]
    fn test_crowded_topic_blocks_new_story() {
        let mut store = seeded_store();
        for i in 2..=9 {
            store
                .upsert_story(
                    StoryRecord::new(format!("ST-{i}").as_str(), "crowd")
                        .with_status(StoryStatus::Active)
                        .with_topic("meteor"),
                )
                .unwrap();
        }
        // Coverage for 8 peers is 0.7, over the 0.5 cap.
        let candidate = Candidate::new("C-1", ActionKind::NewStory, "ST-NEW")
            .with_topic("meteor")
            .with_evidence("E-1")
            .with_stance("S-1")
            .with_stance("S-2")
            .with_stance("S-3");
        let decision = route(&store, vec![candidate]);
        assert_eq!(decision.action, Action::Silence);
    }

    #[test]
    fn test_discuss_tier_needs_trigger() {
        let store = seeded_store();
        let bare = Candidate::new("C-1", ActionKind::Discuss, "ST-1");
        assert_eq!(route(&store, vec![bare]).action, Action::Silence);

        let triggered = Candidate::new("C-2", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::StanceConflict);
        let decision = route(&store, vec![triggered]);
        assert_eq!(decision.action, Action::Discuss);
        assert_eq!(decision.chosen, Some("C-2".into()));
    }

    #[test]
    fn test_risky_discussion_stays_silent() {
        let store = seeded_store();
        let candidate = Candidate::new("C-1", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::Clarification)
            .with_risk_signals(RiskSignals {
                contested_topic: true,
                ..RiskSignals::default()
            });
        // Risk 0.6 is over the 0.5 discuss cap.
        assert_eq!(route(&store, vec![candidate]).action, Action::Silence);
    }

    #[test]
    fn test_catastrophic_cost_skips_commit_tiers() {
        let store = seeded_store();
        let lethal = strong_continue("C-1").with_cost(CostLevel::Catastrophic);
        let decision = route(&store, vec![lethal]);
        assert_eq!(
            decision.action,
            Action::Silence,
            "approval-gated candidates never auto-commit"
        );

        // The same cost on a discussion is fine: it surfaces for approval.
        let proposal = Candidate::new("C-2", ActionKind::Discuss, "ST-1")
            .with_cost(CostLevel::Catastrophic);
        let decision = route(&store, vec![proposal]);
        assert_eq!(decision.action, Action::Discuss);
    }

    #[test]
    fn test_hard_conflict_vetoes_and_next_candidate_wins() {
        let mut store = seeded_store();
        let canonical = NarrativeEvent::new("The lamp goes dark", window(2, 4), "the lighthouse");
        store
            .apply_commit(
                &"ST-1".into(),
                0,
                crate::ledger::CommitOutcome {
                    candidate_id: "seed".to_string(),
                    author: String::new(),
                    perspective: None,
                    event: Some(canonical),
                    evidence_refs: vec![],
                    stance_refs: vec![],
                    opened_gap: None,
                },
            )
            .unwrap();

        // C-1 sorts first (lower id at equal scores) but contradicts the
        // committed event; C-2 proposes a different hour and survives.
        let clashing = strong_continue("C-1")
            .with_event(NarrativeEvent::new("The lamp burns on", window(3, 5), "The Lighthouse"));
        let clean = strong_continue("C-2")
            .with_event(NarrativeEvent::new("Dawn watch begins", window(6, 7), "the lighthouse"));

        let decision = route(&store, vec![clashing, clean]);
        assert_eq!(decision.action, Action::Continue);
        assert_eq!(decision.chosen, Some("C-2".into()));
        assert_eq!(decision.vetoed, vec![CandidateId::from("C-1")]);
        assert!(!decision.warnings.is_empty());
    }

    #[test]
    fn test_soft_conflict_proceeds_with_warning() {
        let store = seeded_store();
        let event = NarrativeEvent::new("The accusation lands", window(1, 2), "the tavern")
            .with_stance("S-1")
            .with_stance("S-2");
        let candidate = strong_continue("C-1").with_event(event);

        let decision = route(&store, vec![candidate]);
        assert_eq!(decision.action, Action::Continue);
        assert_eq!(decision.chosen, Some("C-1".into()));
        assert!(
            decision.warnings.iter().any(|w| w.contains("soft conflict")),
            "soft verdicts select with a warning"
        );
    }

    #[test]
    fn test_vote_rides_alongside_primary_action() {
        let store = seeded_store();
        let discuss = Candidate::new("C-1", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::Clarification);
        let vote = Candidate::new("C-2", ActionKind::Vote, "ST-1").with_vote(VoteBallot::up());

        let decision = route(&store, vec![discuss, vote]);
        assert_eq!(decision.action, Action::Discuss);
        assert_eq!(decision.vote, Some("C-2".into()));
    }

    #[test]
    fn test_vote_alone_becomes_primary_action() {
        let store = seeded_store();
        let vote = Candidate::new("C-1", ActionKind::Vote, "ST-1").with_vote(VoteBallot::up());
        let decision = route(&store, vec![vote]);
        assert_eq!(decision.action, Action::Vote);
        assert_eq!(decision.chosen, Some("C-1".into()));
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_downvote_without_reason_dropped() {
        let store = seeded_store();
        let vote = Candidate::new("C-1", ActionKind::Vote, "ST-1").with_vote(VoteBallot {
            direction: VoteDirection::Down,
            reason: None,
        });
        let decision = route(&store, vec![vote]);
        assert_eq!(decision.action, Action::Silence);
        assert!(decision.warnings.iter().any(|w| w.contains("no reason")));
    }

    #[test]
    fn test_tie_breaks_are_deterministic() {
        let store = seeded_store();
        let a = Candidate::new("C-A", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::Clarification);
        let b = Candidate::new("C-B", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::Clarification);

        // Identical scores: the lower identifier wins, in either batch order.
        let first = route(&store, vec![a.clone(), b.clone()]);
        let second = route(&store, vec![b, a]);
        assert_eq!(first.chosen, Some("C-A".into()));
        assert_eq!(second.chosen, Some("C-A".into()));
    }

    #[test]
    fn test_unavailable_ledger_fails_closed() {
        let store = seeded_store();
        let candidate = Candidate::new("C-1", ActionKind::Discuss, "ST-1")
            .addressing(DiscussTrigger::Clarification);
        let scored = ScoringEngine::new()
            .score_batch(&store, vec![candidate])
            .unwrap();

        let decision = ActionRouter::new().route(&UnreachableLedger, &"ST-1".into(), &scored);
        assert_eq!(decision.action, Action::Silence);
        assert!(decision.reason.as_deref().is_some_and(|r| r.contains("unavailable")));
    }

    #[test]
    fn test_ledger_failure_mid_route_fails_closed() {
        let store = seeded_store();
        // A strong continuation forces a ledger read inside tier 1, and the
        // discussion would otherwise qualify at tier 3.
        let batch = vec![
            strong_continue("C-1"),
            Candidate::new("C-2", ActionKind::Discuss, "ST-1")
                .addressing(DiscussTrigger::Clarification),
        ];
        let scored = ScoringEngine::new().score_batch(&store, batch).unwrap();

        // One read covers the initial probe; the backend drops right after.
        let flaky = FlakyLedger::new(store, 1);
        let decision = ActionRouter::new().route(&flaky, &"ST-1".into(), &scored);

        assert_eq!(
            decision.action,
            Action::Silence,
            "a mid-route ledger failure must never emit a lower-tier action"
        );
        assert!(decision.reason.as_deref().is_some_and(|r| r.contains("unavailable")));
    }

    #[test]
    fn test_content_limit_warning() {
        let store = seeded_store();
        let candidate = strong_continue("C-1").with_segment_chars(80);
        let decision = route(&store, vec![candidate]);
        assert_eq!(decision.action, Action::Continue);
        assert!(decision
            .warnings
            .iter()
            .any(|w| w.contains("outside platform limits")));
    }
}
