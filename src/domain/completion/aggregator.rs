//! Bottom-up completion roll-up for a course tree.
//!
//! A grain counts as complete when it carries any authored content. Above
//! that, completion is strict AND: a node is complete only when it has at
//! least one child and every child is complete. The course percentage is a
//! flat grain ratio, independent of the all-or-nothing counts.

use crate::domain::model::{Grain, Lesson, Module, Page};
use crate::error::ContentError;
use crate::storage::ContentStore;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrainProgress {
    pub current: u64,
    pub total: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub modules: Progress,
    pub lessons: Progress,
    pub pages: Progress,
    pub grains: GrainProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCompletion {
    pub page_id: Uuid,
    pub position: u32,
    pub completed_grains: u64,
    pub total_grains: u64,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonCompletion {
    pub lesson_id: Uuid,
    pub position: u32,
    pub pages: Vec<PageCompletion>,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCompletion {
    pub module_id: Uuid,
    pub position: u32,
    pub lessons: Vec<LessonCompletion>,
    pub complete: bool,
}

/// Per-node breakdown; [`CompletionReport::summary`] folds it into counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub course_id: Uuid,
    pub modules: Vec<ModuleCompletion>,
}

impl PageCompletion {
    pub fn from_grains(page: &Page, grains: &[Grain]) -> Self {
        let total_grains = grains.len() as u64;
        let completed_grains = grains.iter().filter(|g| g.content.has_any_content()).count() as u64;
        Self {
            page_id: page.id,
            position: page.position,
            completed_grains,
            total_grains,
            complete: total_grains > 0 && completed_grains == total_grains,
        }
    }
}

impl LessonCompletion {
    pub fn from_pages(lesson: &Lesson, pages: Vec<PageCompletion>) -> Self {
        let complete = !pages.is_empty() && pages.iter().all(|p| p.complete);
        Self {
            lesson_id: lesson.id,
            position: lesson.position,
            pages,
            complete,
        }
    }
}

impl ModuleCompletion {
    pub fn from_lessons(module: &Module, lessons: Vec<LessonCompletion>) -> Self {
        let complete = !lessons.is_empty() && lessons.iter().all(|l| l.complete);
        Self {
            module_id: module.id,
            position: module.position,
            lessons,
            complete,
        }
    }
}

/// round(100 × completed / total); 0 when there is nothing to complete.
pub fn percentage(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 * 100.0 / total as f64).round() as u32
}

impl CompletionReport {
    pub fn summary(&self) -> CompletionSummary {
        let mut s = CompletionSummary::default();
        for module in &self.modules {
            s.modules.total += 1;
            s.modules.current += u64::from(module.complete);
            for lesson in &module.lessons {
                s.lessons.total += 1;
                s.lessons.current += u64::from(lesson.complete);
                for page in &lesson.pages {
                    s.pages.total += 1;
                    s.pages.current += u64::from(page.complete);
                    s.grains.total += page.total_grains;
                    s.grains.current += page.completed_grains;
                }
            }
        }
        s.grains.percentage = percentage(s.grains.current, s.grains.total);
        s
    }
}

/// Read-only walker over the persisted tree.
#[derive(Clone)]
pub struct CompletionAggregator {
    store: Arc<dyn ContentStore>,
}

impl CompletionAggregator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn compute(&self, course_id: Uuid) -> Result<CompletionSummary, ContentError> {
        Ok(self.compute_report(course_id).await?.summary())
    }

    pub async fn compute_report(&self, course_id: Uuid) -> Result<CompletionReport, ContentError> {
        if self.store.get_course(course_id).await?.is_none() {
            return Err(ContentError::not_found("course", course_id));
        }

        let mut modules = self.store.list_modules(course_id).await?;
        modules.sort_by_key(|m| m.position);

        let mut module_reports = Vec::with_capacity(modules.len());
        for module in &modules {
            let mut lessons = self.store.list_lessons(module.id).await?;
            lessons.sort_by_key(|l| l.position);

            let mut lesson_reports = Vec::with_capacity(lessons.len());
            for lesson in &lessons {
                let mut pages = self.store.list_pages(lesson.id).await?;
                pages.sort_by_key(|p| p.position);

                let mut page_reports = Vec::with_capacity(pages.len());
                for page in &pages {
                    let grains = self.store.list_grains(page.id).await?;
                    page_reports.push(PageCompletion::from_grains(page, &grains));
                }
                lesson_reports.push(LessonCompletion::from_pages(lesson, page_reports));
            }
            module_reports.push(ModuleCompletion::from_lessons(module, lesson_reports));
        }

        Ok(CompletionReport {
            course_id,
            modules: module_reports,
        })
    }
}
