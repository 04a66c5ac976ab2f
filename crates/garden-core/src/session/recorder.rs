//! Session recorder: the lifecycle of one focus session.
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Ended -> Idle
//! ```
//!
//! The recorder owns the [`SessionClock`] and the user's [`SessionTally`].
//! Ending a session decides whether it counts as completed; only completed
//! sessions are handed to the store, and exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::normalize_user_name;
use super::record::{SessionRecord, SessionTally};
use crate::catalog::FlowerCatalog;
use crate::content::{completion_message, early_end_message, ContentSelector};
use crate::error::Result;
use crate::events::Event;
use crate::growth::{stage_for, GrowthStage, SizeRange};
use crate::storage::SessionStore;
use crate::timer::{ClockState, SessionClock, DEFAULT_SESSION_LENGTH_SECS};

/// Default slack, in seconds, for counting a session as completed.
pub const DEFAULT_TOLERANCE_SECS: u64 = 5;

/// Everything the presentation layer needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub state: ClockState,
    pub flower_code: String,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub progress: f64,
    pub stage: GrowthStage,
    pub display_size: u32,
    pub intention: Option<String>,
    pub tip: String,
    /// Countdown reached zero while running; the caller should end the session.
    pub due: bool,
}

/// Result of the single persistence attempt for a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistStatus {
    Saved { backend: String },
    /// No backend configured. Informational, not an error.
    NotConfigured,
    /// The store call failed. The session still counts locally.
    Failed { backend: String, warning: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed {
        record: SessionRecord,
        message: String,
        persistence: PersistStatus,
        tally: SessionTally,
    },
    EndedEarly {
        flower_code: String,
        elapsed_secs: u64,
        acknowledgment: String,
        ended_at: DateTime<Utc>,
    },
    NothingToEnd,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }

    /// Event describing the outcome, if a session actually ended.
    pub fn event(&self) -> Option<Event> {
        match self {
            SessionOutcome::Completed {
                record, message, ..
            } => Some(Event::SessionCompleted {
                flower_code: record.flower_code.clone(),
                elapsed_secs: record.duration_secs,
                message: message.clone(),
                at: record.timestamp,
            }),
            SessionOutcome::EndedEarly {
                flower_code,
                elapsed_secs,
                acknowledgment,
                ended_at,
            } => Some(Event::SessionEndedEarly {
                flower_code: flower_code.clone(),
                elapsed_secs: *elapsed_secs,
                acknowledgment: acknowledgment.clone(),
                at: *ended_at,
            }),
            SessionOutcome::NothingToEnd => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecorder {
    clock: SessionClock,
    tolerance_secs: u64,
    user_name: String,
    #[serde(default)]
    tally: SessionTally,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_LENGTH_SECS, DEFAULT_TOLERANCE_SECS, None)
    }
}

impl SessionRecorder {
    pub fn new(session_length_secs: u64, tolerance_secs: u64, user_name: Option<&str>) -> Self {
        Self {
            clock: SessionClock::new(session_length_secs),
            tolerance_secs,
            user_name: normalize_user_name(user_name),
            tally: SessionTally::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn tally(&self) -> SessionTally {
        self.tally
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn tolerance_secs(&self) -> u64 {
        self.tolerance_secs
    }

    /// Derive the display state for `now`. `None` while idle.
    pub fn tick(
        &self,
        now: DateTime<Utc>,
        catalog: &FlowerCatalog,
        sizes: &SizeRange,
    ) -> Option<SessionView> {
        let flower_code = self.clock.flower_code()?;
        let elapsed_secs = self.clock.elapsed_secs(now);
        let remaining_secs = self.clock.remaining_secs(now);
        let progress = self.clock.progress(now);
        let selector = ContentSelector::new(catalog);
        let display_elapsed = elapsed_secs.min(self.clock.session_length_secs());
        Some(SessionView {
            state: self.clock.state(),
            flower_code: flower_code.to_string(),
            elapsed_secs: display_elapsed,
            remaining_secs,
            progress,
            stage: stage_for(progress),
            display_size: sizes.display_size(progress),
            intention: selector.intention_for(flower_code).map(str::to_string),
            tip: selector.tip_for(flower_code, display_elapsed).to_string(),
            due: remaining_secs == 0 && self.clock.state() == ClockState::Running,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_user_name(&mut self, name: Option<&str>) {
        self.user_name = normalize_user_name(name);
    }

    /// Apply new timing settings. Ignored while a session is active so the
    /// running countdown never changes length underneath the user.
    pub fn configure(&mut self, session_length_secs: u64, tolerance_secs: u64) -> bool {
        if self.clock.is_active() {
            return false;
        }
        self.clock = SessionClock::new(session_length_secs);
        self.tolerance_secs = tolerance_secs;
        true
    }

    /// Start a session for a known flower. `Ok(None)` if one is already active.
    pub fn start(
        &mut self,
        flower_code: &str,
        catalog: &FlowerCatalog,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        catalog.require(flower_code)?;
        Ok(self.clock.start(flower_code, now))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.clock.pause(now)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.clock.resume(now)
    }

    /// Abandon the active session without recording anything.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.clock.reset(now)
    }

    /// Finalize the active session.
    ///
    /// A session is completed when it was not ended early and its elapsed
    /// time is within `tolerance_secs` of the full length. Completed sessions
    /// get one insert attempt on `store`; a failed insert is reported in the
    /// outcome but does not undo the local tally. Always leaves the clock idle.
    pub fn end_session(
        &mut self,
        early: bool,
        store: Option<&dyn SessionStore>,
        now: DateTime<Utc>,
    ) -> SessionOutcome {
        let Some(flower_code) = self.clock.flower_code().map(str::to_string) else {
            return SessionOutcome::NothingToEnd;
        };
        let elapsed_secs = self.clock.elapsed_secs(now);
        let threshold = self
            .clock
            .session_length_secs()
            .saturating_sub(self.tolerance_secs);
        let completed = !early && elapsed_secs >= threshold;
        self.clock.reset(now);

        if !completed {
            tracing::info!(flower = %flower_code, elapsed_secs, "session ended early");
            return SessionOutcome::EndedEarly {
                flower_code,
                elapsed_secs,
                acknowledgment: early_end_message().to_string(),
                ended_at: now,
            };
        }

        let record = SessionRecord::completed(&flower_code, elapsed_secs, now, &self.user_name);
        let persistence = persist(store, &record);
        let message = completion_message(self.tally.record_completion()).to_string();
        tracing::info!(
            flower = %flower_code,
            elapsed_secs,
            completed_sessions = self.tally.completed_sessions,
            "session completed"
        );

        SessionOutcome::Completed {
            record,
            message,
            persistence,
            tally: self.tally,
        }
    }
}

fn persist(store: Option<&dyn SessionStore>, record: &SessionRecord) -> PersistStatus {
    let Some(store) = store else {
        tracing::info!("no session backend configured, completed session kept locally only");
        return PersistStatus::NotConfigured;
    };
    match store.insert(record) {
        Ok(()) => PersistStatus::Saved {
            backend: store.name().to_string(),
        },
        Err(e) => {
            tracing::warn!(backend = store.name(), error = %e, "failed to save session");
            PersistStatus::Failed {
                backend: store.name().to_string(),
                warning: format!("Could not save your session to the garden: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn started(flower: &str) -> SessionRecorder {
        let mut recorder = SessionRecorder::new(1500, 5, Some("ana"));
        recorder
            .start(flower, &FlowerCatalog::builtin(), t(0))
            .unwrap()
            .unwrap();
        recorder
    }

    #[test]
    fn full_session_persists_exactly_one_record() {
        let store = MemoryStore::new();
        let mut recorder = started("daisy");
        let outcome = recorder.end_session(false, Some(&store), t(1500));

        assert!(outcome.is_completed());
        let records = store.select_all().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].completed);
        assert_eq!(records[0].duration_secs, 1500);
        assert_eq!(records[0].user_name, "ana");
        assert_eq!(recorder.state(), ClockState::Idle);
    }

    #[test]
    fn tolerance_absorbs_tick_granularity() {
        let store = MemoryStore::new();
        let mut recorder = started("daisy");
        assert!(recorder
            .end_session(false, Some(&store), t(1495))
            .is_completed());

        let mut recorder = started("daisy");
        assert!(!recorder
            .end_session(false, Some(&store), t(1494))
            .is_completed());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn early_end_persists_nothing() {
        let store = MemoryStore::new();
        let mut recorder = started("tulip");
        let outcome = recorder.end_session(true, Some(&store), t(1500));
        match outcome {
            SessionOutcome::EndedEarly {
                flower_code,
                elapsed_secs,
                ..
            } => {
                assert_eq!(flower_code, "tulip");
                assert_eq!(elapsed_secs, 1500);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.len(), 0);
        assert_eq!(recorder.tally().completed_sessions, 0);
    }

    #[test]
    fn ending_idle_session_is_noop() {
        let store = MemoryStore::new();
        let mut recorder = SessionRecorder::default();
        assert_eq!(
            recorder.end_session(false, Some(&store), t(0)),
            SessionOutcome::NothingToEnd
        );
        let mut recorder = started("rose");
        recorder.end_session(false, Some(&store), t(1500));
        assert_eq!(
            recorder.end_session(false, Some(&store), t(1501)),
            SessionOutcome::NothingToEnd
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_insert_still_counts_locally() {
        let store = MemoryStore::failing("offline");
        let mut recorder = started("daisy");
        match recorder.end_session(false, Some(&store), t(1500)) {
            SessionOutcome::Completed {
                persistence, tally, ..
            } => {
                assert!(matches!(persistence, PersistStatus::Failed { .. }));
                assert_eq!(tally.completed_sessions, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn missing_backend_is_informational() {
        let mut recorder = started("daisy");
        match recorder.end_session(false, None, t(1500)) {
            SessionOutcome::Completed { persistence, .. } => {
                assert_eq!(persistence, PersistStatus::NotConfigured)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn completion_messages_rotate_across_sessions() {
        let store = MemoryStore::new();
        let mut recorder = SessionRecorder::new(60, 0, None);
        let catalog = FlowerCatalog::builtin();
        let mut messages = Vec::new();
        for i in 0..2 {
            let base = i * 100;
            recorder.start("daisy", &catalog, t(base)).unwrap();
            if let SessionOutcome::Completed { message, .. } =
                recorder.end_session(false, Some(&store), t(base + 60))
            {
                messages.push(message);
            }
        }
        assert_eq!(messages, vec![completion_message(0), completion_message(1)]);
        assert_eq!(store.select_all().unwrap()[0].user_name, "Anonymous");
    }

    #[test]
    fn unknown_flower_is_rejected() {
        let mut recorder = SessionRecorder::default();
        assert!(recorder
            .start("cactus", &FlowerCatalog::builtin(), t(0))
            .is_err());
        assert_eq!(recorder.state(), ClockState::Idle);
    }

    #[test]
    fn tick_reports_stage_tip_and_due() {
        let catalog = FlowerCatalog::builtin();
        let sizes = SizeRange::default();
        let recorder = started("daisy");

        let view = recorder.tick(t(800), &catalog, &sizes).unwrap();
        assert_eq!(view.stage, GrowthStage::Bud);
        assert_eq!(view.tip, catalog.get("daisy").unwrap().tips[2]);
        assert!(!view.due);

        let view = recorder.tick(t(1500), &catalog, &sizes).unwrap();
        assert_eq!(view.remaining_secs, 0);
        assert_eq!(view.progress, 1.0);
        assert_eq!(view.stage, GrowthStage::Bloom);
        assert_eq!(view.display_size, 280);
        assert!(view.due);

        assert!(SessionRecorder::default()
            .tick(t(0), &catalog, &sizes)
            .is_none());
    }
}
