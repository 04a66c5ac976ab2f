pub mod config;
pub mod flowers;
pub mod meadow;
pub mod session;

use garden_core::{open_store, Config, FlowerCatalog, SessionStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Config and catalog, loaded once per invocation.
pub struct Context {
    pub config: Config,
    pub catalog: FlowerCatalog,
}

impl Context {
    pub fn load() -> CliResult<Self> {
        let config = Config::load()?;
        let catalog = config.catalog()?;
        Ok(Self { config, catalog })
    }

    /// The configured session backend. An unusable backend is reported and
    /// treated as "not configured" so the session flow keeps going.
    pub fn store(&self) -> Option<Box<dyn SessionStore>> {
        match open_store(&self.config.backend) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "session backend unavailable");
                eprintln!("warning: session backend unavailable: {e}");
                None
            }
        }
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
