//! Decides which grain type a slot must hold.
//!
//! A slot is either `Locked` to one grain type or `Free`. Predefined page
//! types lock every slot to the catalog pattern, a `Custom` page locks its
//! slots to its own `grain_pattern` when it has one, and legacy `text` pages
//! are free.

use crate::domain::catalog::PatternCatalog;
use crate::domain::model::{GrainPattern, GrainType, Page, PageType, GRAINS_PER_PAGE};
use crate::error::ContentError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "required", rename_all = "snake_case")]
pub enum SlotRule {
    Locked(GrainType),
    Free,
}

impl SlotRule {
    pub fn required(&self) -> Option<GrainType> {
        match self {
            SlotRule::Locked(t) => Some(*t),
            SlotRule::Free => None,
        }
    }
}

#[derive(Clone)]
pub struct GrainTypeEnforcer {
    catalog: Arc<PatternCatalog>,
}

impl GrainTypeEnforcer {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    /// Rule for one slot. `position` is 1-based.
    pub fn slot_rule(
        &self,
        page_type: PageType,
        custom_pattern: Option<&GrainPattern>,
        position: u32,
    ) -> Result<SlotRule, ContentError> {
        let index = slot_index(position)?;
        let pattern = match page_type {
            PageType::Custom => custom_pattern,
            PageType::LegacyText => None,
            predefined => Some(self.catalog.pattern_for(predefined).ok_or_else(|| {
                ContentError::validation(format!("pattern catalog has no entry for {}", predefined))
            })?),
        };
        Ok(pattern.map_or(SlotRule::Free, |p| SlotRule::Locked(p[index])))
    }

    /// Mandatory grain type for a slot, or `None` when the author may choose.
    pub fn required_type(
        &self,
        page_type: PageType,
        custom_pattern: Option<&GrainPattern>,
        position: u32,
    ) -> Result<Option<GrainType>, ContentError> {
        Ok(self.slot_rule(page_type, custom_pattern, position)?.required())
    }

    pub fn slot_rules(&self, page: &Page) -> Result<Vec<SlotRule>, ContentError> {
        (1..=GRAINS_PER_PAGE as u32)
            .map(|position| self.slot_rule(page.page_type, page.grain_pattern.as_ref(), position))
            .collect()
    }

    /// Rejects setting `attempted` at `position` of `page` when the slot is
    /// locked to another type. Never coerces.
    pub fn check_edit(
        &self,
        page: &Page,
        position: u32,
        attempted: GrainType,
    ) -> Result<(), ContentError> {
        match self.slot_rule(page.page_type, page.grain_pattern.as_ref(), position)? {
            SlotRule::Locked(expected) if expected != attempted => {
                Err(ContentError::RestrictedGrainType {
                    page_type: page.page_type,
                    position,
                    expected,
                    attempted,
                })
            }
            _ => Ok(()),
        }
    }
}

fn slot_index(position: u32) -> Result<usize, ContentError> {
    if position == 0 || position as usize > GRAINS_PER_PAGE {
        return Err(ContentError::validation(format!(
            "grain position must be between 1 and {} (got {})",
            GRAINS_PER_PAGE, position
        )));
    }
    Ok(position as usize - 1)
}
