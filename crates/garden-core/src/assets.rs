//! Index of flower stage images on disk.
//!
//! Expected layout: `<assets_dir>/<flower_code>/stage<N>.png` with `N` in
//! 1..=4. Anything else in the directory is ignored.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::growth::GrowthStage;

#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    stages: HashMap<String, BTreeMap<GrowthStage, PathBuf>>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan an assets directory. A missing directory yields an empty index.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut index = Self::new();
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "assets directory not found, no images available");
            return Ok(index);
        }
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let code = entry.file_name().to_string_lossy().to_string();
            for file in std::fs::read_dir(entry.path())? {
                let path = file?.path();
                if let Some(stage) = stage_from_file_name(&path) {
                    index.insert(&code, stage, path);
                }
            }
        }
        tracing::debug!(flowers = index.stages.len(), "asset index built");
        Ok(index)
    }

    pub fn insert(&mut self, flower_code: &str, stage: GrowthStage, path: PathBuf) {
        self.stages
            .entry(flower_code.to_string())
            .or_default()
            .insert(stage, path);
    }

    pub fn has(&self, flower_code: &str, stage: GrowthStage) -> bool {
        self.path(flower_code, stage).is_some()
    }

    pub fn path(&self, flower_code: &str, stage: GrowthStage) -> Option<&Path> {
        self.stages
            .get(flower_code)
            .and_then(|stages| stages.get(&stage))
            .map(PathBuf::as_path)
    }

    /// Image to show for `stage`, applying the stage fallback chain.
    pub fn resolve(&self, flower_code: &str, stage: GrowthStage) -> Option<(GrowthStage, &Path)> {
        let found = stage.resolve(|s| self.has(flower_code, s))?;
        self.path(flower_code, found).map(|p| (found, p))
    }

    /// Sticker used in the meadow: the bloom image, or its fallback.
    pub fn sprite_for(&self, flower_code: &str) -> Option<&Path> {
        self.resolve(flower_code, GrowthStage::Bloom).map(|(_, p)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

fn stage_from_file_name(path: &Path) -> Option<GrowthStage> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let n = stem.strip_prefix("stage")?.parse::<u8>().ok()?;
    GrowthStage::from_number(n)
}
