//! Candidate actions awaiting scoring and routing.
//!
//! Candidates arrive from the platform collaborator with their metadata
//! already declared; the core never invents attributes, so scoring stays a
//! pure function of the ledger snapshot plus these declarations.

use crate::ledger::{EvidenceId, Gap, GapId, NarrativeEvent, StanceId, StoryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier for a candidate action within a decision batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(String);

impl CandidateId {
    /// Create a candidate identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What kind of action the candidate proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Continue an existing story.
    Continue,
    /// Start a new story.
    NewStory,
    /// Post a discussion comment.
    Discuss,
    /// Cast a vote on someone else's contribution.
    Vote,
}

impl ActionKind {
    /// Display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Continue => "continue",
            ActionKind::NewStory => "new_story",
            ActionKind::Discuss => "discuss",
            ActionKind::Vote => "vote",
        }
    }
}

/// Declared cost of the action to the characters involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostLevel {
    /// No cost to any character.
    #[default]
    None,
    /// An acceptable, recoverable cost.
    Acceptable,
    /// A real, significant cost.
    Significant,
    /// Irreversible loss (e.g. permanent removal of a major entity);
    /// requires external approval, never auto-committed.
    Catastrophic,
}

/// Why a discussion candidate exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussTrigger {
    /// Addresses a detected stance conflict.
    StanceConflict,
    /// Addresses a hard-violation report.
    ViolationReport,
    /// Answers an explicit clarification request.
    Clarification,
}

/// Declared risk signals for a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSignals {
    /// Multiple concurrent agents are targeting the same topic.
    pub contested_topic: bool,
    /// The action risks provoking faction alignment.
    pub faction_alignment: bool,
    /// The action risks introducing contradictory setting facts.
    pub setting_contradiction: bool,
    /// A highly-rated near-duplicate action already exists.
    pub near_duplicate: bool,
}

/// Direction of a vote candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// A vote payload. Downvotes must state a reason to be routable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteBallot {
    pub direction: VoteDirection,
    pub reason: Option<String>,
}

impl VoteBallot {
    /// An upvote.
    pub fn up() -> Self {
        Self {
            direction: VoteDirection::Up,
            reason: None,
        }
    }

    /// A downvote with its required reason.
    pub fn down(reason: impl Into<String>) -> Self {
        Self {
            direction: VoteDirection::Down,
            reason: Some(reason.into()),
        }
    }
}

/// A proposed action with its declared metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique identifier within the batch.
    pub id: CandidateId,
    /// What kind of action this is.
    pub kind: ActionKind,
    /// Target story (for a new story, the identifier it would receive).
    pub story: StoryId,
    /// The author or agent that would act.
    pub actor: String,
    /// Topic tags the action addresses.
    pub topics: BTreeSet<String>,
    /// Evidence the action links back to.
    pub evidence: Vec<EvidenceId>,
    /// Stances the action draws on.
    pub stances: Vec<StanceId>,
    /// Open gaps the action links back to.
    pub linked_gaps: Vec<GapId>,
    /// The canonical event the action would establish, if any.
    pub event: Option<NarrativeEvent>,
    /// Narrative perspective the segment would use.
    pub perspective: Option<String>,
    /// A new open question the action would record.
    pub opens_gap: Option<Gap>,
    /// Why a discussion candidate exists.
    pub discuss_trigger: Option<DiscussTrigger>,
    /// Declared cost level.
    pub cost: CostLevel,
    /// Declared risk signals.
    pub risk_signals: RiskSignals,
    /// Vote payload for vote candidates.
    pub vote: Option<VoteBallot>,
    /// Proposed segment length in characters, for content-limit warnings.
    pub segment_chars: Option<usize>,
}

impl Candidate {
    /// Create a candidate with empty metadata.
    pub fn new(id: impl Into<CandidateId>, kind: ActionKind, story: impl Into<StoryId>) -> Self {
        Self {
            id: id.into(),
            kind,
            story: story.into(),
            actor: String::new(),
            topics: BTreeSet::new(),
            evidence: Vec::new(),
            stances: Vec::new(),
            linked_gaps: Vec::new(),
            event: None,
            perspective: None,
            opens_gap: None,
            discuss_trigger: None,
            cost: CostLevel::None,
            risk_signals: RiskSignals::default(),
            vote: None,
            segment_chars: None,
        }
    }

    /// Set the acting author.
    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Add a topic tag.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.insert(topic.into());
        self
    }

    /// Link back to an evidence card.
    pub fn with_evidence(mut self, id: impl Into<EvidenceId>) -> Self {
        let id = id.into();
        if !self.evidence.contains(&id) {
            self.evidence.push(id);
        }
        self
    }

    /// Draw on a stance.
    pub fn with_stance(mut self, id: impl Into<StanceId>) -> Self {
        let id = id.into();
        if !self.stances.contains(&id) {
            self.stances.push(id);
        }
        self
    }

    /// Link back to an open gap.
    pub fn with_linked_gap(mut self, id: impl Into<GapId>) -> Self {
        let id = id.into();
        if !self.linked_gaps.contains(&id) {
            self.linked_gaps.push(id);
        }
        self
    }

    /// Attach the canonical event the action would establish.
    pub fn with_event(mut self, event: NarrativeEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the narrative perspective.
    pub fn with_perspective(mut self, perspective: impl Into<String>) -> Self {
        self.perspective = Some(perspective.into());
        self
    }

    /// Declare a new open question the action would record.
    pub fn opening_gap(mut self, gap: Gap) -> Self {
        self.opens_gap = Some(gap);
        self
    }

    /// Tag a discussion candidate with its trigger.
    pub fn addressing(mut self, trigger: DiscussTrigger) -> Self {
        self.discuss_trigger = Some(trigger);
        self
    }

    /// Set the declared cost level.
    pub fn with_cost(mut self, cost: CostLevel) -> Self {
        self.cost = cost;
        self
    }

    /// Set the declared risk signals.
    pub fn with_risk_signals(mut self, signals: RiskSignals) -> Self {
        self.risk_signals = signals;
        self
    }

    /// Attach a vote payload.
    pub fn with_vote(mut self, ballot: VoteBallot) -> Self {
        self.vote = Some(ballot);
        self
    }

    /// Set the proposed segment length.
    pub fn with_segment_chars(mut self, chars: usize) -> Self {
        self.segment_chars = Some(chars);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_builder() {
        let candidate = Candidate::new("C-1", ActionKind::Continue, "ST-1")
            .by("agent-7")
            .with_topic("lighthouse")
            .with_evidence("E-1")
            .with_evidence("E-1")
            .with_stance("S-1");

        assert_eq!(candidate.kind.name(), "continue");
        assert_eq!(candidate.evidence.len(), 1, "duplicate references dropped");
        assert_eq!(candidate.cost, CostLevel::None);
    }

    #[test]
    fn test_action_kind_serde_tags() {
        let json = serde_json::to_string(&ActionKind::NewStory).unwrap();
        assert_eq!(json, "\"new_story\"");
    }

    #[test]
    fn test_vote_ballots() {
        let up = VoteBallot::up();
        assert!(up.reason.is_none());

        let down = VoteBallot::down("contradicts the harbor timeline");
        assert_eq!(down.direction, VoteDirection::Down);
        assert!(down.reason.is_some());
    }
}
