//! The pattern catalog: which grain type goes in each of the 15 slots of a
//! predefined page type.
//!
//! The catalog is plain data. The structure builder and the grain type
//! enforcer share one `Arc<PatternCatalog>`, so there is exactly one table.

use crate::domain::model::{GrainPattern, GrainType, PageType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current version of the built-in catalog.
pub const BUILTIN_CATALOG_VERSION: u32 = 1;

/// 1-based positions that hold the `pairsOfText` check-in exercise.
pub const CHECKIN_POSITIONS: [usize; 2] = [8, 15];

use crate::domain::model::GrainType::{
    AudioToGuess as Audio, ImagesToGuess as Images, PairsOfImage as PairsImg,
    PairsOfText as Pairs, TestQuestion as Test, TextToComplete as Complete,
    TextToGuess as Guess,
};

const INTRODUCTION: GrainPattern = [
    Complete, Complete, Test, Complete, Guess, Complete, Test, Pairs,
    Complete, Complete, Images, Complete, Test, Complete, Pairs,
];

const BOOSTER: GrainPattern = [
    Test, Complete, Images, Audio, Guess, Test, PairsImg, Pairs,
    Complete, Images, Test, Audio, Guess, Complete, Pairs,
];

const COMPARATION: GrainPattern = [
    Images, Guess, Images, Guess, Images, Guess, PairsImg, Pairs,
    Images, Guess, Images, Guess, Images, Guess, Pairs,
];

const REVIEW: GrainPattern = [
    Complete, Complete, Complete, Test, Complete, Complete, Complete, Pairs,
    Complete, Complete, Complete, Test, Complete, Complete, Pairs,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCatalog {
    pub version: u32,
    patterns: BTreeMap<PageType, GrainPattern>,
}

impl PatternCatalog {
    /// The hand-authored catalog shipped with the crate.
    pub fn builtin() -> Self {
        let patterns = BTreeMap::from([
            (PageType::Introduction, INTRODUCTION),
            (PageType::Booster, BOOSTER),
            (PageType::Comparation, COMPARATION),
            (PageType::Review, REVIEW),
        ]);
        Self {
            version: BUILTIN_CATALOG_VERSION,
            patterns,
        }
    }

    /// Pattern for a predefined page type. `Custom` and legacy `text` pages
    /// have no catalog entry.
    pub fn pattern_for(&self, page_type: PageType) -> Option<&GrainPattern> {
        self.patterns.get(&page_type)
    }

    pub fn patterns(&self) -> impl Iterator<Item = (PageType, &GrainPattern)> {
        self.patterns.iter().map(|(t, p)| (*t, p))
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let catalog: PatternCatalog =
            serde_json::from_str(raw).context("pattern catalog is not valid JSON")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads and validates a catalog override from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pattern catalog {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Every predefined type must be present, no other type may be, and the
    /// check-in slots must hold `pairsOfText`.
    pub fn validate(&self) -> anyhow::Result<()> {
        for page_type in PageType::PREDEFINED {
            let pattern = self
                .patterns
                .get(&page_type)
                .ok_or_else(|| anyhow::anyhow!("pattern catalog has no entry for {}", page_type))?;
            for position in CHECKIN_POSITIONS {
                if pattern[position - 1] != GrainType::PairsOfText {
                    return Err(anyhow::anyhow!(
                        "{} pattern must have pairsOfText at position {} (found {})",
                        page_type,
                        position,
                        pattern[position - 1]
                    ));
                }
            }
        }
        if let Some(extra) = self.patterns.keys().find(|t| !t.is_predefined()) {
            return Err(anyhow::anyhow!(
                "pattern catalog cannot define a pattern for {} pages",
                extra
            ));
        }
        Ok(())
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
