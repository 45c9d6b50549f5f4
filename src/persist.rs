//! Ledger persistence for snapshot save/load.
//!
//! Snapshots are versioned JSON envelopes around the full ledger, with a
//! small metadata block readable without deserializing the whole store.

use crate::ledger::LedgerStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// A saved ledger snapshot with everything needed to resume deciding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLedger {
    /// Snapshot format version for compatibility checking.
    pub version: u32,

    /// When the snapshot was created, RFC 3339.
    pub saved_at: String,

    /// The complete ledger state.
    pub ledger: LedgerStore,

    /// Metadata about the snapshot.
    pub metadata: LedgerMetadata,
}

/// Metadata about a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMetadata {
    /// Story records held.
    pub stories: usize,

    /// Evidence cards held.
    pub evidence: usize,

    /// Stances held.
    pub stances: usize,

    /// Gaps held, open and closed.
    pub gaps: usize,

    /// When the snapshot was created (duplicated from parent for peek access).
    #[serde(default)]
    pub saved_at: String,
}

impl SavedLedger {
    /// Create a snapshot from the current ledger state.
    pub fn new(ledger: LedgerStore) -> Self {
        let saved_at = chrono::Utc::now().to_rfc3339();
        let metadata = LedgerMetadata {
            stories: ledger.story_count(),
            evidence: ledger.evidence_count(),
            stances: ledger.stance_count(),
            gaps: ledger.gap_count(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            ledger,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read a snapshot's metadata without loading the full ledger.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<LedgerMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        // Parse just enough to get metadata.
        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: LedgerMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Build the snapshot file name for a named ledger.
pub fn snapshot_path(base_dir: impl AsRef<Path>, name: &str) -> std::path::PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}_ledger.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Evidence, StoryRecord, StoryStatus};

    fn seeded() -> LedgerStore {
        let mut store = LedgerStore::new();
        store.upsert_evidence(Evidence::new("E-1", "Torn letter")).unwrap();
        store
            .upsert_story(
                StoryRecord::new("ST-1", "The Harbor Account").with_status(StoryStatus::Active),
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), "harbor account");

        SavedLedger::new(seeded()).save_json(&path).await.unwrap();
        let loaded = SavedLedger::load_json(&path).await.unwrap();

        assert_eq!(loaded.version, SNAPSHOT_VERSION);
        assert_eq!(loaded.ledger.story_count(), 1);
        assert_eq!(loaded.ledger.evidence_count(), 1);
        assert!(loaded
            .ledger
            .query_story(&"ST-1".into())
            .unwrap()
            .status
            .is_active());
    }

    #[tokio::test]
    async fn test_peek_metadata_without_full_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        SavedLedger::new(seeded()).save_json(&path).await.unwrap();
        let metadata = SavedLedger::peek_metadata(&path).await.unwrap();

        assert_eq!(metadata.stories, 1);
        assert_eq!(metadata.evidence, 1);
        assert!(!metadata.saved_at.is_empty());
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut saved = SavedLedger::new(seeded());
        saved.version = 99;
        let content = serde_json::to_string(&saved).unwrap();
        tokio::fs::write(&path, content).await.unwrap();

        let err = SavedLedger::load_json(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch { expected: 1, found: 99 }
        ));
    }

    #[test]
    fn test_snapshot_path_sanitizes_name() {
        let path = snapshot_path("/tmp", "harbor: account/2");
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "harbor__account_2_ledger.json"
        );
    }
}
