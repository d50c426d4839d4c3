use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exercise session for one badge token. `ended_at` of `None` means the
/// session is still open; token is not unique across rows, so the full
/// history of a badge's sessions is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub token: String,
    pub repetitions: u64,
    pub errors: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}
