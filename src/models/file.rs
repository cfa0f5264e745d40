use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::hasher::FileIdentity;

/// Processing state of a ledger entry.
///
/// There is no pending state: a fingerprint absent from the ledger is new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecordState {
    /// An attempt holds the advisory lock.
    Processing,
    /// Terminal. `output` is `None` when the attempt failed.
    Completed {
        #[serde(rename = "videoOutput", default)]
        output: Option<String>,
    },
}

/// One ledger entry, keyed by fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_name: String,
    pub file_path: String,
    #[serde(rename = "fileHash")]
    pub fingerprint: String,
    #[serde(rename = "fileSize")]
    pub size_bytes: u64,
    pub file_modified: DateTime<Utc>,
    /// Time of the last state transition.
    #[serde(rename = "processedAt")]
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: RecordState,
}

impl FileRecord {
    #[must_use]
    pub fn new(identity: &FileIdentity, state: RecordState, recorded_at: DateTime<Utc>) -> Self {
        Self {
            file_name: identity.name.clone(),
            file_path: identity.path.to_string_lossy().into_owned(),
            fingerprint: identity.fingerprint.clone(),
            size_bytes: identity.size,
            file_modified: identity.modified_at,
            recorded_at,
            state,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.state, RecordState::Completed { .. })
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        matches!(self.state, RecordState::Processing)
    }

    /// Completed without an artifact.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, RecordState::Completed { output: None })
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match &self.state {
            RecordState::Completed { output } => output.as_deref(),
            RecordState::Processing => None,
        }
    }
}
