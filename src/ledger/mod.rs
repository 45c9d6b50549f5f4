//! The canon ledger: evidence, stances, gaps, and story records.

pub mod access;
pub mod evidence;
pub mod gap;
pub mod stance;
pub mod store;
pub mod story;

pub use access::AccessRules;
pub use evidence::{Evidence, EvidenceId, EvidenceStatus};
pub use gap::{Gap, GapId, StoryHook, Urgency};
pub use stance::{Stance, StanceCost, StanceId, ViewScope};
pub use store::{CommitOutcome, CommitReceipt, LedgerReader, LedgerStore};
pub use story::{
    CanonicalEvent, Disposition, EventId, NarrativeEvent, StoryId, StoryRecord, StoryStatus,
    TimeWindow,
};
