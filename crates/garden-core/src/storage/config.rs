//! TOML-based application configuration.
//!
//! Stores:
//! - Session timing (length, completion tolerance, tick interval)
//! - Growth display size bounds
//! - Meadow canvas layout and placement seed
//! - Session backend selection and credentials
//! - Nickname, asset directory and optional flower catalog file
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::catalog::FlowerCatalog;
use crate::error::{ConfigError, CoreError, Result};
use crate::growth::SizeRange;
use crate::meadow::MeadowLayout;
use crate::session::SessionRecorder;

/// Session timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_session_length_secs")]
    pub session_length_secs: u64,
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,
    /// Delay between ticks for interactive watchers.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Growth display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    #[serde(default = "default_max_size")]
    pub max_size: u32,
}

/// Meadow canvas configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeadowConfig {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Background image. A plain ground canvas is used when unset.
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite file in the data directory.
    Local,
    /// Hosted REST table.
    Remote,
    /// No persistence; completed sessions are only counted locally.
    None,
}

/// Session backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,
    /// Base URL of the hosted project, e.g. `https://xyz.example.co`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// User identity configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Nickname attached to recorded sessions. Anonymous when unset.
    #[serde(default)]
    pub name: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub meadow: MeadowConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub user: UserConfig,
    /// Directory holding `<flower>/stage<N>.png`. Defaults to `<data_dir>/assets`.
    #[serde(default)]
    pub assets_dir: Option<String>,
    /// Flower catalog TOML. The built-in catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

// Default functions
fn default_session_length_secs() -> u64 {
    25 * 60
}
fn default_tolerance_secs() -> u64 {
    5
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_min_size() -> u32 {
    120
}
fn default_max_size() -> u32 {
    280
}
fn default_canvas_width() -> u32 {
    1200
}
fn default_canvas_height() -> u32 {
    800
}
fn default_sprite_size() -> u32 {
    96
}
fn default_seed() -> u64 {
    42
}
fn default_backend_kind() -> BackendKind {
    BackendKind::Local
}
fn default_table() -> String {
    "sessions".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            session_length_secs: default_session_length_secs(),
            tolerance_secs: default_tolerance_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
        }
    }
}

impl Default for MeadowConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            sprite_size: default_sprite_size(),
            seed: default_seed(),
            background: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            url: None,
            api_key: None,
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional values accept "none" to stay unset.
                    serde_json::Value::Null if value.eq_ignore_ascii_case("none") => {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Config(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    /// Reject values that would make the clock or the meadow meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer.session_length_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.session_length_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.growth.min_size > self.growth.max_size {
            return Err(ConfigError::InvalidValue {
                key: "growth.min_size".into(),
                message: "must not exceed growth.max_size".into(),
            });
        }
        if self.meadow.width == 0 || self.meadow.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "meadow".into(),
                message: "canvas width and height must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn size_range(&self) -> SizeRange {
        SizeRange {
            min_size: self.growth.min_size,
            max_size: self.growth.max_size,
        }
    }

    pub fn meadow_layout(&self) -> MeadowLayout {
        MeadowLayout {
            width: self.meadow.width,
            height: self.meadow.height,
            sprite_size: self.meadow.sprite_size,
            seed: self.meadow.seed,
            ..MeadowLayout::default()
        }
    }

    /// A fresh recorder with this config's timing and nickname.
    pub fn recorder(&self) -> SessionRecorder {
        SessionRecorder::new(
            self.timer.session_length_secs,
            self.timer.tolerance_secs,
            self.user.name.as_deref(),
        )
    }

    /// The flower catalog: from `catalog_path` if set, otherwise built in.
    pub fn catalog(&self) -> Result<FlowerCatalog> {
        match &self.catalog_path {
            Some(path) => FlowerCatalog::load(Path::new(path)),
            None => Ok(FlowerCatalog::builtin()),
        }
    }

    pub fn assets_dir(&self) -> Result<PathBuf> {
        match &self.assets_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(data_dir()?.join("assets")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.session_length_secs, 1500);
        assert_eq!(parsed.backend.kind, BackendKind::Local);
        assert!(parsed.backend.url.is_none());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.timer.tolerance_secs, 5);
        assert_eq!(cfg.growth.min_size, 120);
        assert_eq!(cfg.growth.max_size, 280);
        assert_eq!(cfg.meadow.seed, 42);
        assert_eq!(cfg.backend.table, "sessions");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.session_length_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("backend.kind").as_deref(), Some("local"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn apply_updates_numbers_enums_and_options() {
        let mut cfg = Config::default();
        cfg.apply("timer.session_length_secs", "600").unwrap();
        cfg.apply("backend.kind", "remote").unwrap();
        cfg.apply("backend.url", "https://garden.example.co").unwrap();
        cfg.apply("user.name", "mina").unwrap();
        assert_eq!(cfg.timer.session_length_secs, 600);
        assert_eq!(cfg.backend.kind, BackendKind::Remote);
        assert_eq!(cfg.backend.url.as_deref(), Some("https://garden.example.co"));
        assert_eq!(cfg.recorder().user_name(), "mina");
    }

    #[test]
    fn apply_rejects_unknown_and_invalid() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.apply("timer.session_length_secs", "soon").is_err());
        assert!(cfg.apply("backend.kind", "cloud").is_err());
        assert!(cfg.apply("timer.session_length_secs", "0").is_err());
        assert_eq!(cfg.timer.session_length_secs, 1500);
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.meadow.width, 1200);

        std::fs::write(&path, "[timer]\nsession_length_secs = 60\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.session_length_secs, 60);
        assert_eq!(cfg.timer.tolerance_secs, 5);
    }

    #[test]
    fn broken_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
