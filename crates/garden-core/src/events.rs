use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::growth::GrowthStage;
use crate::timer::ClockState;

/// Every state change of a session produces an Event.
/// The presentation layer prints or renders them; nothing else consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        flower_code: String,
        session_length_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Session reached its full length and was finalized.
    SessionCompleted {
        flower_code: String,
        elapsed_secs: u64,
        message: String,
        at: DateTime<Utc>,
    },
    /// Session was ended by the user before reaching its full length.
    SessionEndedEarly {
        flower_code: String,
        elapsed_secs: u64,
        acknowledgment: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: ClockState,
        flower_code: Option<String>,
        elapsed_secs: u64,
        remaining_secs: u64,
        progress: f64,
        stage: Option<GrowthStage>,
        at: DateTime<Utc>,
    },
}
