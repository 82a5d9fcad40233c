//! Materializes a course tree from a [`StructureSpec`].
//!
//! Levels are built in order (modules, lessons, pages, grains) with a barrier
//! between them; siblings inside a level are created concurrently, bounded by
//! a semaphore. Each level first lists what already exists and only creates
//! the missing positions, so a retry after a failed or cancelled run picks up
//! where the previous one stopped instead of duplicating rows.

use crate::domain::catalog::PatternCatalog;
use crate::domain::model::{
    BuildStage, Course, GrainContent, GrainPattern, Lesson, Module, NewGrain, NewLesson,
    NewModule, NewPage, Page, PageType, GRAINS_PER_PAGE,
};
use crate::domain::structure::{BuildContext, PageTemplate, StructureSpec};
use crate::error::ContentError;
use crate::storage::ContentStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

type Pending<T> = JoinSet<Result<T, ContentError>>;

/// Rows created vs. found already present at one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    pub created: u64,
    pub reused: u64,
}

impl LevelReport {
    pub fn total(&self) -> u64 {
        self.created + self.reused
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub course_id: Uuid,
    pub modules: LevelReport,
    pub lessons: LevelReport,
    pub pages: LevelReport,
    pub grains: LevelReport,
}

pub struct TreeBuilder {
    store: Arc<dyn ContentStore>,
    catalog: Arc<PatternCatalog>,
    permits: Arc<Semaphore>,
}

impl TreeBuilder {
    /// `concurrency` caps the number of creates in flight at once.
    pub fn new(store: Arc<dyn ContentStore>, catalog: Arc<PatternCatalog>, concurrency: usize) -> Self {
        Self {
            store,
            catalog,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Builds (or resumes building) the tree of `course_id`.
    ///
    /// On success the course is marked `structure_created`. On any failure the
    /// flag stays false and the persisted `build_stage` tells how far the run got.
    pub async fn build(
        &self,
        course_id: Uuid,
        spec: StructureSpec,
        template: PageTemplate,
        ctx: &BuildContext,
    ) -> Result<BuildReport, ContentError> {
        let result = self.run(course_id, spec, template, ctx).await;
        if let Err(e) = &result {
            eprintln!("> TreeBuilder: build of course {} stopped: {}", course_id, e);
        }
        result
    }

    async fn run(
        &self,
        course_id: Uuid,
        spec: StructureSpec,
        template: PageTemplate,
        ctx: &BuildContext,
    ) -> Result<BuildReport, ContentError> {
        spec.validate()?;
        template.validate()?;
        ctx.ensure_active()?;

        let mut course = self
            .store
            .get_course(course_id)
            .await?
            .ok_or_else(|| ContentError::not_found("course", course_id))?;
        if course.structure_created {
            return Err(ContentError::StructureAlreadyCreated(course_id));
        }

        match (course.structure_spec, course.structure_template) {
            (Some(persisted), _) if persisted != spec => {
                return Err(ContentError::validation(format!(
                    "course {} was started as {} modules x {} lessons x {} pages; the structure spec cannot change",
                    course_id,
                    persisted.modules_count,
                    persisted.lessons_per_module,
                    persisted.pages_per_lesson
                )));
            }
            (Some(_), Some(persisted)) if persisted != template => {
                return Err(ContentError::validation(format!(
                    "course {} was started with {} pages; the page template cannot change",
                    course_id,
                    persisted.page_type()
                )));
            }
            (Some(_), Some(_)) => println!(
                "> TreeBuilder: resuming course {} from checkpoint '{}'",
                course_id,
                course.build_stage.as_str()
            ),
            _ => {
                course.structure_spec = Some(spec);
                course.structure_template = Some(template);
                self.store.update_course(&course).await?;
            }
        }

        let totals = spec.totals();
        println!(
            "> TreeBuilder: course {} -> {} modules, {} lessons, {} pages, {} grains",
            course_id, totals.modules, totals.lessons, totals.pages, totals.grains
        );

        let mut report = BuildReport {
            course_id,
            ..Default::default()
        };

        let modules = self.ensure_modules(&course, &spec, ctx, &mut report.modules).await?;
        self.checkpoint(&mut course, BuildStage::ModulesDone).await?;

        let lessons = self.ensure_lessons(&modules, &spec, ctx, &mut report.lessons).await?;
        self.checkpoint(&mut course, BuildStage::LessonsDone).await?;

        let pages = self
            .ensure_pages(&lessons, &spec, &template, ctx, &mut report.pages)
            .await?;
        self.checkpoint(&mut course, BuildStage::PagesDone).await?;

        self.ensure_grains(&pages, ctx, &mut report.grains).await?;

        course.structure_created = true;
        course.build_stage = BuildStage::Complete;
        self.store.update_course(&course).await?;
        println!("> TreeBuilder: course {} structure complete", course_id);

        Ok(report)
    }

    /// Grain types for the 15 slots of an existing page.
    fn pattern_for_page(&self, page: &Page) -> Result<GrainPattern, ContentError> {
        match page.page_type {
            PageType::Custom => page.grain_pattern.ok_or_else(|| {
                ContentError::validation(format!("Custom page {} has no grain pattern", page.id))
            }),
            PageType::LegacyText => Err(ContentError::validation(format!(
                "page {} uses the legacy 'text' type and cannot receive generated grains",
                page.id
            ))),
            predefined => self.catalog.pattern_for(predefined).copied().ok_or_else(|| {
                ContentError::validation(format!("pattern catalog has no entry for {}", predefined))
            }),
        }
    }

    async fn checkpoint(&self, course: &mut Course, stage: BuildStage) -> Result<(), ContentError> {
        if course.build_stage >= stage {
            return Ok(());
        }
        course.build_stage = stage;
        self.store.update_course(course).await?;
        println!("> TreeBuilder: course {} checkpoint '{}'", course.id, stage.as_str());
        Ok(())
    }

    fn spawn_create<T, F, Fut>(&self, pending: &mut Pending<T>, ctx: &BuildContext, create: F)
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn ContentStore>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);
        let ctx = ctx.clone();
        pending.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| ContentError::Cancelled)?;
            ctx.ensure_active()?;
            create(store).await.map_err(ContentError::from)
        });
    }

    async fn ensure_modules(
        &self,
        course: &Course,
        spec: &StructureSpec,
        ctx: &BuildContext,
        level: &mut LevelReport,
    ) -> Result<Vec<Module>, ContentError> {
        let existing = self.store.list_modules(course.id).await?;
        let mut slots = index_by_position(existing, spec.modules_count, "module", course.id, |m| m.position);

        let mut pending: Pending<Module> = JoinSet::new();
        for position in 1..=spec.modules_count {
            if slots.contains_key(&position) {
                continue;
            }
            ctx.ensure_active()?;
            let new = NewModule {
                course_id: course.id,
                title: format!("Module {}", position),
                position,
            };
            self.spawn_create(&mut pending, ctx, move |store| async move {
                store.create_module(new).await
            });
        }

        level.reused += slots.len() as u64;
        let created = join_level(pending).await?;
        level.created += created.len() as u64;
        for module in created {
            slots.insert(module.position, module);
        }
        log_level("modules", level);
        Ok(slots.into_values().collect())
    }

    async fn ensure_lessons(
        &self,
        modules: &[Module],
        spec: &StructureSpec,
        ctx: &BuildContext,
        level: &mut LevelReport,
    ) -> Result<Vec<Lesson>, ContentError> {
        let mut ready = Vec::new();
        let mut pending: Pending<Lesson> = JoinSet::new();
        for module in modules {
            let existing = self.store.list_lessons(module.id).await?;
            let slots = index_by_position(existing, spec.lessons_per_module, "lesson", module.id, |l| l.position);
            for position in 1..=spec.lessons_per_module {
                if slots.contains_key(&position) {
                    continue;
                }
                ctx.ensure_active()?;
                let new = NewLesson {
                    module_id: module.id,
                    title: format!("Lesson {}", position),
                    position,
                    content: String::new(),
                };
                self.spawn_create(&mut pending, ctx, move |store| async move {
                    store.create_lesson(new).await
                });
            }
            level.reused += slots.len() as u64;
            ready.extend(slots.into_values());
        }

        let created = join_level(pending).await?;
        level.created += created.len() as u64;
        ready.extend(created);
        log_level("lessons", level);
        Ok(ready)
    }

    async fn ensure_pages(
        &self,
        lessons: &[Lesson],
        spec: &StructureSpec,
        template: &PageTemplate,
        ctx: &BuildContext,
        level: &mut LevelReport,
    ) -> Result<Vec<Page>, ContentError> {
        let mut ready = Vec::new();
        let mut pending: Pending<Page> = JoinSet::new();
        for lesson in lessons {
            let existing = self.store.list_pages(lesson.id).await?;
            let slots = index_by_position(existing, spec.pages_per_lesson, "page", lesson.id, |p| p.position);
            for position in 1..=spec.pages_per_lesson {
                if slots.contains_key(&position) {
                    continue;
                }
                ctx.ensure_active()?;
                let new = NewPage {
                    lesson_id: lesson.id,
                    title: format!("Page {}", position),
                    position,
                    page_type: template.page_type(),
                    grain_pattern: template.grain_pattern(),
                };
                self.spawn_create(&mut pending, ctx, move |store| async move {
                    store.create_page(new).await
                });
            }
            level.reused += slots.len() as u64;
            ready.extend(slots.into_values());
        }

        let created = join_level(pending).await?;
        level.created += created.len() as u64;
        ready.extend(created);
        log_level("pages", level);
        Ok(ready)
    }

    async fn ensure_grains(
        &self,
        pages: &[Page],
        ctx: &BuildContext,
        level: &mut LevelReport,
    ) -> Result<(), ContentError> {
        let per_page = GRAINS_PER_PAGE as u32;
        let mut pending: Pending<()> = JoinSet::new();
        for page in pages {
            let existing = self.store.list_grains(page.id).await?;
            let slots = index_by_position(existing, per_page, "grain", page.id, |g| g.position);
            level.reused += slots.len() as u64;
            if slots.len() == GRAINS_PER_PAGE {
                continue;
            }
            let pattern = self.pattern_for_page(page)?;
            for position in 1..=per_page {
                if slots.contains_key(&position) {
                    continue;
                }
                ctx.ensure_active()?;
                let new = NewGrain {
                    page_id: page.id,
                    position,
                    content: GrainContent::default_for(pattern[position as usize - 1]),
                };
                self.spawn_create(&mut pending, ctx, move |store| async move {
                    store.create_grain(new).await.map(|_| ())
                });
            }
        }

        let created = join_level(pending).await?;
        level.created += created.len() as u64;
        log_level("grains", level);
        Ok(())
    }
}

/// Waits for every create of a level. The first failure is returned and the
/// remaining tasks are aborted when the set is dropped.
async fn join_level<T: Send + 'static>(mut pending: Pending<T>) -> Result<Vec<T>, ContentError> {
    let mut created = Vec::with_capacity(pending.len());
    while let Some(joined) = pending.join_next().await {
        let row = joined.map_err(|e| {
            ContentError::Persistence(anyhow::anyhow!("create task did not finish: {}", e))
        })??;
        created.push(row);
    }
    Ok(created)
}

/// Keys existing children by position, keeping only `1..=count`.
fn index_by_position<T>(
    rows: Vec<T>,
    count: u32,
    level: &str,
    parent: Uuid,
    position: impl Fn(&T) -> u32,
) -> BTreeMap<u32, T> {
    let mut slots = BTreeMap::new();
    for row in rows {
        let p = position(&row);
        if p == 0 || p > count {
            eprintln!(
                "> TreeBuilder: ignoring {} at position {} under {} (expected 1..={})",
                level, p, parent, count
            );
            continue;
        }
        if slots.contains_key(&p) {
            eprintln!(
                "> TreeBuilder: duplicate {} position {} under {}, keeping the first",
                level, p, parent
            );
            continue;
        }
        slots.insert(p, row);
    }
    slots
}

fn log_level(name: &str, level: &LevelReport) {
    println!(
        "> TreeBuilder: {} ready ({} created, {} reused)",
        name, level.created, level.reused
    );
}
