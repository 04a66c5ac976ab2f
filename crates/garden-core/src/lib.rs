//! # Collective Garden Core Library
//!
//! Business logic for the Collective Garden focus timer: pick a flower,
//! focus for 25 minutes while it grows, and add it to a meadow shared by
//! everyone who completed a session. The `garden` CLI is a thin
//! presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Session Clock**: a wall-clock-based state machine; the caller passes
//!   `now` and drives `tick()` from its own loop
//! - **Growth Model**: progress fraction to stage and display size
//! - **Content Selector**: intention, rotating tips, completion messages
//! - **Session Recorder**: decides completion and writes one record per
//!   completed session through a [`SessionStore`]
//! - **Meadow**: per-flower counts, seeded sticker layout, PNG composition
//! - **Storage**: SQLite or hosted REST session stores, TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionRecorder`]: session lifecycle and persistence contract
//! - [`SessionClock`]: elapsed/paused time for one timer
//! - [`MeadowAggregator`]: reproducible meadow snapshots
//! - [`Config`]: application configuration management

pub mod assets;
pub mod catalog;
pub mod content;
pub mod error;
pub mod events;
pub mod growth;
pub mod meadow;
pub mod session;
pub mod storage;
pub mod timer;

pub use assets::AssetIndex;
pub use catalog::{FlowerCatalog, FlowerDefinition};
pub use content::{completion_message, ContentSelector};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use growth::{stage_for, GrowthStage, SizeRange};
pub use meadow::{
    load_records, render_meadow, CollectiveRecords, MeadowAggregator, MeadowLayout,
    MeadowSnapshot, Placement,
};
pub use session::{
    PersistStatus, SessionOutcome, SessionRecord, SessionRecorder, SessionTally, SessionView,
};
pub use storage::{open_store, BackendKind, Config, Database, MemoryStore, RemoteStore, SessionStore};
pub use timer::{ClockState, SessionClock};
