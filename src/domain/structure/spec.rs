use crate::domain::model::{GrainPattern, PageType, GRAINS_PER_PAGE};
use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// Compact description of a course tree: N modules × M lessons × P pages,
/// each page holding a fixed 15 grains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub modules_count: u32,
    pub lessons_per_module: u32,
    pub pages_per_lesson: u32,
}

/// Expected record counts for a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StructureTotals {
    pub modules: u64,
    pub lessons: u64,
    pub pages: u64,
    pub grains: u64,
}

impl StructureSpec {
    /// Bounds applied to author input at the API edge. The builder itself
    /// accepts any positive count.
    pub const MAX_MODULES: u32 = 20;
    pub const MAX_LESSONS_PER_MODULE: u32 = 20;
    pub const MAX_PAGES_PER_LESSON: u32 = 10;

    pub fn new(modules_count: u32, lessons_per_module: u32, pages_per_lesson: u32) -> Self {
        Self {
            modules_count,
            lessons_per_module,
            pages_per_lesson,
        }
    }

    fn fields(&self) -> [(&'static str, u32, u32); 3] {
        [
            ("modules_count", self.modules_count, Self::MAX_MODULES),
            ("lessons_per_module", self.lessons_per_module, Self::MAX_LESSONS_PER_MODULE),
            ("pages_per_lesson", self.pages_per_lesson, Self::MAX_PAGES_PER_LESSON),
        ]
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        for (name, value, _) in self.fields() {
            if value == 0 {
                return Err(ContentError::validation(format!(
                    "{} must be a positive integer",
                    name
                )));
            }
        }
        if self.checked_totals().is_none() {
            return Err(ContentError::validation(format!(
                "a tree of {} x {} x {} pages is too large to build",
                self.modules_count, self.lessons_per_module, self.pages_per_lesson
            )));
        }
        Ok(())
    }

    pub fn validate_ui_bounds(&self) -> Result<(), ContentError> {
        self.validate()?;
        for (name, value, max) in self.fields() {
            if value > max {
                return Err(ContentError::validation(format!(
                    "{} must be between 1 and {} (got {})",
                    name, max, value
                )));
            }
        }
        Ok(())
    }

    /// `None` when the grain count does not fit in a `u64`.
    pub fn checked_totals(&self) -> Option<StructureTotals> {
        let modules = u64::from(self.modules_count);
        let lessons = modules.checked_mul(u64::from(self.lessons_per_module))?;
        let pages = lessons.checked_mul(u64::from(self.pages_per_lesson))?;
        let grains = pages.checked_mul(GRAINS_PER_PAGE as u64)?;
        Some(StructureTotals {
            modules,
            lessons,
            pages,
            grains,
        })
    }

    /// Like [`checked_totals`](Self::checked_totals), saturating at `u64::MAX`.
    pub fn totals(&self) -> StructureTotals {
        if let Some(totals) = self.checked_totals() {
            return totals;
        }
        let modules = u64::from(self.modules_count);
        let lessons = modules.saturating_mul(u64::from(self.lessons_per_module));
        let pages = lessons.saturating_mul(u64::from(self.pages_per_lesson));
        StructureTotals {
            modules,
            lessons,
            pages,
            grains: pages.saturating_mul(GRAINS_PER_PAGE as u64),
        }
    }
}

/// Page type every generated page starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PageTemplate {
    Predefined(PageType),
    Custom(GrainPattern),
}

impl PageTemplate {
    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            PageTemplate::Predefined(t) if t.is_predefined() => Ok(()),
            PageTemplate::Predefined(PageType::Custom) => Err(ContentError::validation(
                "Custom pages need an explicit 15-slot grain pattern",
            )),
            PageTemplate::Predefined(t) => Err(ContentError::validation(format!(
                "structure builds cannot produce '{}' pages",
                t
            ))),
            PageTemplate::Custom(_) => Ok(()),
        }
    }

    pub fn page_type(&self) -> PageType {
        match self {
            PageTemplate::Predefined(t) => *t,
            PageTemplate::Custom(_) => PageType::Custom,
        }
    }

    pub fn grain_pattern(&self) -> Option<GrainPattern> {
        match self {
            PageTemplate::Predefined(_) => None,
            PageTemplate::Custom(pattern) => Some(*pattern),
        }
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        PageTemplate::Predefined(PageType::Introduction)
    }
}
