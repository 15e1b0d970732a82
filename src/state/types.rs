//! State types for resumable traversals

use crate::pagination::PaginationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Pagination progress saved for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Endpoint the state belongs to
    pub endpoint: String,
    /// Traversal state at the time of saving
    pub state: PaginationState,
    /// When the checkpoint was written
    pub saved_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    CHECKPOINT_VERSION
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time
    pub fn new(endpoint: impl Into<String>, state: PaginationState) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            endpoint: endpoint.into(),
            state,
            saved_at: Utc::now(),
        }
    }
}
