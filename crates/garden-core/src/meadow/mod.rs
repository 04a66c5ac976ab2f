//! The collective meadow: aggregate counts and a reproducible layout built
//! from every completed session in the store.
//!
//! Placement uses an injected random generator. [`MeadowAggregator`] seeds a
//! fresh `Mcg128Xsl64` from the layout on every call, so aggregating the same
//! record sequence twice yields the same picture.

mod render;

pub use render::{render_meadow, save_png};

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::assets::AssetIndex;
use crate::catalog::FlowerCatalog;
use crate::session::SessionRecord;
use crate::storage::SessionStore;

/// Canvas geometry and placement seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeadowLayout {
    pub width: u32,
    pub height: u32,
    pub sprite_size: u32,
    /// Fraction of the canvas height above the ground line.
    pub ground_fraction: f64,
    pub seed: u64,
}

impl Default for MeadowLayout {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            sprite_size: 96,
            ground_fraction: 0.40,
            seed: 42,
        }
    }
}

impl MeadowLayout {
    /// Inclusive x range for a sprite's top-left corner.
    pub fn x_range(&self) -> (u32, u32) {
        (0, self.width.saturating_sub(self.sprite_size))
    }

    /// Inclusive y range: the lower part of the canvas. Collapses to the
    /// ground line when the sprite does not fit below it.
    pub fn y_range(&self) -> (u32, u32) {
        let min = (self.height as f64 * self.ground_fraction).floor() as u32;
        let max = self.height.saturating_sub(self.sprite_size);
        (min, max.max(min))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub flower_code: String,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeadowSnapshot {
    /// Completed-session count for every known flower, zero included.
    pub per_flower_counts: BTreeMap<String, u64>,
    pub placements: Vec<Placement>,
}

impl MeadowSnapshot {
    pub fn total(&self) -> u64 {
        self.per_flower_counts.values().sum()
    }
}

/// Build a snapshot with a caller-supplied generator.
///
/// Records are visited in the order given. Incomplete records and unknown
/// flower codes are skipped; known flowers without any image are counted
/// but not placed.
pub fn aggregate<R>(
    records: &[SessionRecord],
    catalog: &FlowerCatalog,
    assets: &AssetIndex,
    layout: &MeadowLayout,
    rng: &mut R,
) -> MeadowSnapshot
where
    R: Rng + ?Sized,
{
    let mut snapshot = MeadowSnapshot {
        per_flower_counts: catalog.codes().map(|code| (code.to_string(), 0)).collect(),
        placements: Vec::new(),
    };
    let (x_min, x_max) = layout.x_range();
    let (y_min, y_max) = layout.y_range();

    for record in records.iter().filter(|r| r.completed) {
        let Some(count) = snapshot.per_flower_counts.get_mut(&record.flower_code) else {
            tracing::debug!(flower = %record.flower_code, "skipping record for unknown flower");
            continue;
        };
        *count += 1;
        if assets.sprite_for(&record.flower_code).is_none() {
            continue;
        }
        snapshot.placements.push(Placement {
            flower_code: record.flower_code.clone(),
            x: rng.gen_range(x_min..=x_max),
            y: rng.gen_range(y_min..=y_max),
        });
    }
    snapshot
}

/// Aggregates with a generator seeded from the layout.
#[derive(Debug, Clone, Default)]
pub struct MeadowAggregator {
    layout: MeadowLayout,
}

impl MeadowAggregator {
    pub fn new(layout: MeadowLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &MeadowLayout {
        &self.layout
    }

    pub fn aggregate(
        &self,
        records: &[SessionRecord],
        catalog: &FlowerCatalog,
        assets: &AssetIndex,
    ) -> MeadowSnapshot {
        let mut rng = Mcg128Xsl64::seed_from_u64(self.layout.seed);
        aggregate(records, catalog, assets, &self.layout, &mut rng)
    }
}

/// What reading the collective store produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectiveRecords {
    /// No backend configured: no collective data available.
    NotConfigured,
    Loaded(Vec<SessionRecord>),
    /// The read failed; the meadow is shown empty with a warning.
    Failed { warning: String },
}

impl CollectiveRecords {
    pub fn records(&self) -> &[SessionRecord] {
        match self {
            CollectiveRecords::Loaded(records) => records,
            _ => &[],
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            CollectiveRecords::Failed { warning } => Some(warning),
            _ => None,
        }
    }
}

/// Read every record from the store, degrading instead of failing.
pub fn load_records(store: Option<&dyn SessionStore>) -> CollectiveRecords {
    let Some(store) = store else {
        return CollectiveRecords::NotConfigured;
    };
    match store.select_all() {
        Ok(records) => {
            tracing::debug!(backend = store.name(), count = records.len(), "loaded meadow records");
            CollectiveRecords::Loaded(records)
        }
        Err(e) => {
            tracing::warn!(backend = store.name(), error = %e, "failed to load meadow records");
            CollectiveRecords::Failed {
                warning: format!("Could not load the collective meadow: {e}"),
            }
        }
    }
}
