//! Static flower catalog.
//!
//! The catalog is loaded once at process start, either from the built-in
//! table or from a TOML file:
//!
//! ```toml
//! [[flowers]]
//! code = "daisy"
//! label = "Daisy"
//! intention = "Begin gently."
//! tips = ["Clear your desk.", "Close extra tabs."]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ConfigError, CoreError, Result, ValidationError};

/// Tips used for flowers that have none, and for unknown codes.
pub const GENERIC_TIPS: &[&str] = &[
    "Breathe in slowly and settle into the task in front of you.",
    "Keep one thing on the screen. Everything else can wait.",
    "If a stray thought appears, jot it down and come back.",
    "Relax your shoulders and unclench your jaw.",
    "Small, steady progress is still progress.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerDefinition {
    pub code: String,
    pub label: String,
    #[serde(rename = "intention")]
    pub intention_text: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl FlowerDefinition {
    fn new(code: &str, label: &str, intention: &str, tips: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            intention_text: intention.to_string(),
            tips: tips.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    flowers: Vec<FlowerDefinition>,
}

/// Ordered, immutable set of flower definitions keyed by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowerCatalog {
    flowers: Vec<FlowerDefinition>,
}

impl Default for FlowerCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FlowerCatalog {
    /// Build a catalog, rejecting an empty list and duplicate codes.
    /// Flowers without tips get the generic list.
    pub fn new(flowers: Vec<FlowerDefinition>) -> Result<Self> {
        if flowers.is_empty() {
            return Err(ValidationError::EmptyCollection("flower catalog".into()).into());
        }
        let mut seen = HashSet::new();
        let mut flowers = flowers;
        for flower in &mut flowers {
            if !seen.insert(flower.code.clone()) {
                return Err(ValidationError::Duplicate {
                    kind: "flower".into(),
                    key: flower.code.clone(),
                }
                .into());
            }
            if flower.tips.is_empty() {
                flower.tips = GENERIC_TIPS.iter().map(|t| t.to_string()).collect();
            }
        }
        Ok(Self { flowers })
    }

    pub fn builtin() -> Self {
        Self {
            flowers: vec![
                FlowerDefinition::new(
                    "daisy",
                    "Daisy",
                    "Begin gently. One small, honest step at a time.",
                    &[
                        "Pick the smallest next action and do only that.",
                        "Silence notifications for the next few minutes.",
                        "Sit up, plant your feet, take one deep breath.",
                        "If you feel stuck, write down what you know so far.",
                        "Almost there. Let the last minutes be calm ones.",
                    ],
                ),
                FlowerDefinition::new(
                    "tulip",
                    "Tulip",
                    "Stand tall in your focus. Give this task your full attention.",
                    &[
                        "Name the one outcome you want from this session.",
                        "Close every tab that is not about that outcome.",
                        "Notice the urge to switch tasks, and let it pass.",
                        "Check your posture and soften your gaze.",
                        "Finish the thought you are on before you stop.",
                    ],
                ),
                FlowerDefinition::new(
                    "sunflower",
                    "Sunflower",
                    "Turn toward what matters most today.",
                    &[
                        "Face the hardest part first while energy is high.",
                        "Keep water nearby and take a sip now.",
                        "Progress over perfection. Keep moving.",
                        "Look away from the screen for a few seconds.",
                        "Note where you will pick up next time.",
                    ],
                ),
                FlowerDefinition::new(
                    "lavender",
                    "Lavender",
                    "Work calmly. A quiet mind makes steady progress.",
                    &[
                        "Slow your breathing: in for four, out for six.",
                        "Let distractions drift by like clouds.",
                        "Unclench your hands and relax your shoulders.",
                    ],
                ),
                FlowerDefinition::new(
                    "rose",
                    "Rose",
                    "Care for your work the way you would care for a friend.",
                    &[
                        "Be kind to yourself about what is unfinished.",
                        "Give this one task your most careful attention.",
                        "Read back what you wrote and refine one line.",
                        "Appreciate the effort you have already made.",
                    ],
                ),
            ],
        }
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(ConfigError::from)?;
        Self::new(file.flowers)
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, code: &str) -> Option<&FlowerDefinition> {
        self.flowers.iter().find(|f| f.code == code)
    }

    /// Look up a flower, failing on unknown codes.
    pub fn require(&self, code: &str) -> Result<&FlowerDefinition> {
        self.get(code)
            .ok_or_else(|| ValidationError::UnknownFlower(code.to_string()).into())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.flowers.iter().map(|f| f.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlowerDefinition> {
        self.flowers.iter()
    }

    pub fn len(&self) -> usize {
        self.flowers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flowers.is_empty()
    }
}
