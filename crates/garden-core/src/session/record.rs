use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::identity::{normalize_user_name, ANONYMOUS};

/// A finalized session, as persisted by a [`crate::storage::SessionStore`].
///
/// Records are append-only: written once by the recorder, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub flower_code: String,
    #[serde(rename = "duration_seconds")]
    pub duration_secs: u64,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_user_name", deserialize_with = "user_name_or_anonymous")]
    pub user_name: String,
}

fn default_user_name() -> String {
    ANONYMOUS.to_string()
}

/// Hosted tables may hold `null` or blank names from older rows.
fn user_name_or_anonymous<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_user_name(name.as_deref()))
}

impl SessionRecord {
    pub fn completed(
        flower_code: &str,
        duration_secs: u64,
        timestamp: DateTime<Utc>,
        user_name: &str,
    ) -> Self {
        Self {
            flower_code: flower_code.to_string(),
            duration_secs,
            completed: true,
            timestamp,
            user_name: user_name.to_string(),
        }
    }
}

/// Per-user rotating counters, carried explicitly instead of as globals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    /// Sessions completed by this user.
    pub completed_sessions: u64,
    /// Index of the next completion message.
    pub message_counter: u64,
}

impl SessionTally {
    /// Count one completion and return the message index to show for it.
    pub fn record_completion(&mut self) -> u64 {
        let index = self.message_counter;
        self.completed_sessions += 1;
        self.message_counter += 1;
        index
    }
}
