//! Persistence: local configuration plus the session store collaborators.
//!
//! The recorder and the meadow only see the [`SessionStore`] trait. Which
//! backend sits behind it is decided by `[backend]` in the config file, and
//! "no backend" is a normal, supported state.

mod config;
pub mod database;
mod memory;
pub mod remote;

pub use config::{
    BackendConfig, BackendKind, Config, GrowthConfig, MeadowConfig, TimerConfig, UserConfig,
};
pub use database::Database;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

use std::path::PathBuf;

use crate::error::Result;
use crate::session::SessionRecord;

/// The persistence collaborator: an append-only table of session records.
pub trait SessionStore {
    /// Short backend name used in logs and warnings (e.g. "local", "remote").
    fn name(&self) -> &str;

    /// Append one record. Called at most once per completed session.
    fn insert(&self, record: &SessionRecord) -> Result<()>;

    /// Every stored record, in the store's own order.
    fn select_all(&self) -> Result<Vec<SessionRecord>>;
}

/// Open the configured backend. `Ok(None)` means "not configured".
///
/// # Errors
/// Returns an error if a configured backend cannot be opened.
pub fn open_store(backend: &BackendConfig) -> Result<Option<Box<dyn SessionStore>>> {
    let store: Option<Box<dyn SessionStore>> = match backend.kind {
        BackendKind::None => None,
        BackendKind::Local => Some(Box::new(Database::open()?)),
        BackendKind::Remote => RemoteStore::from_config(backend)?
            .map(|store| Box::new(store) as Box<dyn SessionStore>),
    };
    match &store {
        Some(s) => tracing::info!(backend = s.name(), "session backend ready"),
        None => tracing::info!("no session backend configured"),
    }
    Ok(store)
}

/// Returns the data directory.
///
/// `GARDEN_HOME` overrides the location outright. Otherwise this is
/// `~/.config/collective-garden[-dev]/`, with the `-dev` suffix selected by
/// `GARDEN_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("GARDEN_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GARDEN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("collective-garden-dev")
            } else {
                base_dir.join("collective-garden")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
