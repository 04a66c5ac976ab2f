//! Session clock implementation.
//!
//! The clock is a wall-clock-based state machine. It does not use internal
//! threads or sleep: the caller passes `now` into every operation, and an
//! external tick source (the presentation layer) decides how often to ask.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Idle
//! ```
//!
//! Elapsed time is never stored directly. It is recomputed from the banked
//! seconds plus the current run segment:
//!
//! ```text
//! elapsed = accumulated + (paused ? 0 : now - started_at)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Default focus session length: 25 minutes.
pub const DEFAULT_SESSION_LENGTH_SECS: u64 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Idle,
    Running,
    Paused,
}

/// The active part of a clock. Absent while idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ActiveRun {
    flower_code: String,
    /// Start of the current run segment.
    started_at: DateTime<Utc>,
    /// Seconds banked by earlier run segments.
    accumulated_secs: u64,
    paused: bool,
}

impl ActiveRun {
    fn segment_secs(&self, now: DateTime<Utc>) -> u64 {
        // A wall clock that steps backwards contributes nothing.
        (now - self.started_at).num_seconds().max(0) as u64
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        if self.paused {
            self.accumulated_secs
        } else {
            self.accumulated_secs.saturating_add(self.segment_secs(now))
        }
    }
}

/// Elapsed/paused wall-clock time for one timer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClock {
    session_length_secs: u64,
    #[serde(default)]
    active: Option<ActiveRun>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_LENGTH_SECS)
    }
}

impl SessionClock {
    /// Create an idle clock. A zero length is bumped to one second so that
    /// progress stays well defined.
    pub fn new(session_length_secs: u64) -> Self {
        Self {
            session_length_secs: session_length_secs.max(1),
            active: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ClockState {
        match &self.active {
            None => ClockState::Idle,
            Some(run) if run.paused => ClockState::Paused,
            Some(_) => ClockState::Running,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_length_secs(&self) -> u64 {
        self.session_length_secs
    }

    pub fn flower_code(&self) -> Option<&str> {
        self.active.as_ref().map(|run| run.flower_code.as_str())
    }

    /// Total elapsed seconds. Zero while idle.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.active
            .as_ref()
            .map(|run| run.elapsed_secs(now))
            .unwrap_or(0)
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        self.session_length_secs
            .saturating_sub(self.elapsed_secs(now))
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let fraction = self.elapsed_secs(now) as f64 / self.session_length_secs as f64;
        fraction.min(1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        let elapsed_secs = self.elapsed_secs(now);
        Event::StateSnapshot {
            state: self.state(),
            flower_code: self.flower_code().map(str::to_string),
            elapsed_secs,
            remaining_secs: self.remaining_secs(now),
            progress: self.progress(now),
            stage: self
                .is_active()
                .then(|| crate::growth::stage_for(self.progress(now))),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, flower_code: &str, now: DateTime<Utc>) -> Option<Event> {
        if self.active.is_some() {
            return None;
        }
        self.active = Some(ActiveRun {
            flower_code: flower_code.to_string(),
            started_at: now,
            accumulated_secs: 0,
            paused: false,
        });
        tracing::debug!(flower = flower_code, "session clock started");
        Some(Event::SessionStarted {
            flower_code: flower_code.to_string(),
            session_length_secs: self.session_length_secs,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let run = self.active.as_mut().filter(|run| !run.paused)?;
        run.accumulated_secs = run.accumulated_secs.saturating_add(run.segment_secs(now));
        run.paused = true;
        tracing::debug!(elapsed = run.accumulated_secs, "session clock paused");
        Some(Event::SessionPaused {
            elapsed_secs: run.accumulated_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let run = self.active.as_mut().filter(|run| run.paused)?;
        run.started_at = now;
        run.paused = false;
        tracing::debug!(elapsed = run.accumulated_secs, "session clock resumed");
        Some(Event::SessionResumed {
            elapsed_secs: run.accumulated_secs,
            at: now,
        })
    }

    /// Return to idle. Always safe; returns `None` when already idle.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.active.take()?;
        Some(Event::SessionReset { at: now })
    }
}
