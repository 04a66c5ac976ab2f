//! Growth model: maps session progress to a flower stage and display size.
//!
//! Both mappings are pure. Asset availability is a separate concern (see
//! [`crate::assets`]), but the order in which stages are tried when an image
//! is missing is defined here so every renderer applies it the same way.

use serde::{Deserialize, Serialize};

/// One of four discrete growth depictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthStage {
    Seed,
    Sprout,
    Bud,
    Bloom,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Seed,
        GrowthStage::Sprout,
        GrowthStage::Bud,
        GrowthStage::Bloom,
    ];

    /// Stage number, 1 through 4.
    pub fn number(self) -> u8 {
        match self {
            GrowthStage::Seed => 1,
            GrowthStage::Sprout => 2,
            GrowthStage::Bud => 3,
            GrowthStage::Bloom => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(GrowthStage::Seed),
            2 => Some(GrowthStage::Sprout),
            3 => Some(GrowthStage::Bud),
            4 => Some(GrowthStage::Bloom),
            _ => None,
        }
    }

    /// Stages to try, in order, when looking up the image for `self`:
    /// the stage itself, then full bloom, then the remaining stages.
    pub fn fallback_chain(self) -> Vec<GrowthStage> {
        let mut chain = vec![self];
        for stage in std::iter::once(GrowthStage::Bloom).chain(Self::ALL) {
            if !chain.contains(&stage) {
                chain.push(stage);
            }
        }
        chain
    }

    /// Walk the fallback chain and return the first stage `available` accepts.
    pub fn resolve<F>(self, mut available: F) -> Option<GrowthStage>
    where
        F: FnMut(GrowthStage) -> bool,
    {
        self.fallback_chain().into_iter().find(|&stage| available(stage))
    }
}

/// Map a progress fraction to a stage. Out-of-range input is clamped;
/// NaN counts as no progress.
pub fn stage_for(progress: f64) -> GrowthStage {
    let p = clamp_progress(progress);
    if p < 0.25 {
        GrowthStage::Seed
    } else if p < 0.50 {
        GrowthStage::Sprout
    } else if p < 0.75 {
        GrowthStage::Bud
    } else {
        GrowthStage::Bloom
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Continuous display size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min_size: 120,
            max_size: 280,
        }
    }
}

impl SizeRange {
    /// `min + (max - min) * progress`, progress clamped to `[0, 1]`.
    pub fn display_size(&self, progress: f64) -> u32 {
        let min = self.min_size as f64;
        let max = self.max_size as f64;
        (min + (max - min) * clamp_progress(progress)).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stage_boundaries() {
        assert_eq!(stage_for(0.0), GrowthStage::Seed);
        assert_eq!(stage_for(0.2499), GrowthStage::Seed);
        assert_eq!(stage_for(0.25), GrowthStage::Sprout);
        assert_eq!(stage_for(0.5), GrowthStage::Bud);
        assert_eq!(stage_for(0.75), GrowthStage::Bloom);
        assert_eq!(stage_for(1.0), GrowthStage::Bloom);
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        assert_eq!(stage_for(-3.0), GrowthStage::Seed);
        assert_eq!(stage_for(7.0), GrowthStage::Bloom);
        assert_eq!(stage_for(f64::NAN), GrowthStage::Seed);
    }

    #[test]
    fn display_size_spans_range() {
        let range = SizeRange::default();
        assert_eq!(range.display_size(0.0), 120);
        assert_eq!(range.display_size(0.5), 200);
        assert_eq!(range.display_size(1.0), 280);
        assert_eq!(range.display_size(2.0), 280);
    }

    #[test]
    fn fallback_chain_prefers_bloom_then_lowest() {
        assert_eq!(
            GrowthStage::Sprout.fallback_chain(),
            vec![
                GrowthStage::Sprout,
                GrowthStage::Bloom,
                GrowthStage::Seed,
                GrowthStage::Bud
            ]
        );
        assert_eq!(GrowthStage::Bloom.fallback_chain().len(), 4);
    }

    #[test]
    fn resolve_walks_chain() {
        assert_eq!(
            GrowthStage::Bud.resolve(|s| s == GrowthStage::Bud),
            Some(GrowthStage::Bud)
        );
        assert_eq!(
            GrowthStage::Bud.resolve(|s| s != GrowthStage::Bud),
            Some(GrowthStage::Bloom)
        );
        assert_eq!(
            GrowthStage::Seed.resolve(|s| s == GrowthStage::Sprout),
            Some(GrowthStage::Sprout)
        );
        assert_eq!(GrowthStage::Seed.resolve(|_| false), None);
    }

    proptest! {
        #[test]
        fn stage_is_monotonic(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(stage_for(lo) <= stage_for(hi));
            prop_assert!((1..=4).contains(&stage_for(lo).number()));
        }
    }
}
