//! The course service.
//!
//! This module sits between the transport layer and the content store.
//! It is responsible for:
//! 1.  Creating and deleting courses.
//! 2.  Running structure builds, one at a time per course.
//! 3.  Guarding page and grain edits with the grain type enforcer and the
//!     save-time content validation.
//! 4.  Serving completion summaries.

use crate::domain::catalog::PatternCatalog;
use crate::domain::completion::{CompletionAggregator, CompletionReport, CompletionSummary};
use crate::domain::enforce::{GrainTypeEnforcer, SlotRule};
use crate::domain::model::{
    pattern_from_slice, Course, Grain, GrainContent, GrainType, NewCourse, Page, PageType,
    GRAINS_PER_PAGE,
};
use crate::domain::structure::{BuildContext, BuildReport, PageTemplate, StructureSpec, TreeBuilder};
use crate::error::ContentError;
use crate::storage::ContentStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Fields of a page an author may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub page_type: Option<PageType>,
    pub grain_pattern: Option<Vec<GrainType>>,
}

pub struct CourseService {
    store: Arc<dyn ContentStore>,
    catalog: Arc<PatternCatalog>,
    enforcer: GrainTypeEnforcer,
    builder: TreeBuilder,
    aggregator: CompletionAggregator,
    /// Courses with a build running in this process (double-submit guard).
    builds_in_flight: Mutex<HashSet<Uuid>>,
}

/// Releases the in-flight claim when the build finishes or its future is dropped.
struct BuildClaim<'a> {
    in_flight: &'a Mutex<HashSet<Uuid>>,
    course_id: Uuid,
}

impl Drop for BuildClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.course_id);
    }
}

impl CourseService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        catalog: Arc<PatternCatalog>,
        build_concurrency: usize,
    ) -> Self {
        Self {
            enforcer: GrainTypeEnforcer::new(Arc::clone(&catalog)),
            builder: TreeBuilder::new(Arc::clone(&store), Arc::clone(&catalog), build_concurrency),
            aggregator: CompletionAggregator::new(Arc::clone(&store)),
            store,
            catalog,
            builds_in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn enforcer(&self) -> &GrainTypeEnforcer {
        &self.enforcer
    }

    pub async fn ping(&self) -> Result<(), ContentError> {
        Ok(self.store.ping().await?)
    }

    pub async fn create_course(&self, mut new: NewCourse) -> Result<Course, ContentError> {
        new.title = new.title.trim().to_string();
        if new.title.is_empty() {
            return Err(ContentError::validation("course title must not be empty"));
        }
        let course = self.store.create_course(new).await?;
        println!("> CourseService: created course {} ('{}')", course.id, course.title);
        Ok(course)
    }

    pub async fn get_course(&self, course_id: Uuid) -> Result<Course, ContentError> {
        self.store
            .get_course(course_id)
            .await?
            .ok_or_else(|| ContentError::not_found("course", course_id))
    }

    /// Deletes the course and, through the store, every descendant.
    pub async fn delete_course(&self, course_id: Uuid) -> Result<(), ContentError> {
        if !self.store.delete_course(course_id).await? {
            return Err(ContentError::not_found("course", course_id));
        }
        println!("> CourseService: deleted course {}", course_id);
        Ok(())
    }

    fn claim_build(&self, course_id: Uuid) -> Result<BuildClaim<'_>, ContentError> {
        let mut in_flight = self
            .builds_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(course_id) {
            return Err(ContentError::BuildInProgress(course_id));
        }
        Ok(BuildClaim {
            in_flight: &self.builds_in_flight,
            course_id,
        })
    }

    /// Builds the course tree, or resumes a build that stopped part way.
    pub async fn build_structure(
        &self,
        course_id: Uuid,
        spec: StructureSpec,
        template: PageTemplate,
        ctx: &BuildContext,
    ) -> Result<BuildReport, ContentError> {
        let _claim = self.claim_build(course_id)?;
        self.builder.build(course_id, spec, template, ctx).await
    }

    async fn load_page(&self, page_id: Uuid) -> Result<Page, ContentError> {
        self.store
            .get_page(page_id)
            .await?
            .ok_or_else(|| ContentError::not_found("page", page_id))
    }

    pub async fn slot_rules(&self, page_id: Uuid) -> Result<Vec<SlotRule>, ContentError> {
        let page = self.load_page(page_id).await?;
        self.enforcer.slot_rules(&page)
    }

    /// Changes a page's title, type or custom pattern. A type change is
    /// refused when an existing grain would break the new slot rules, and a
    /// Custom page may only drop its pattern once all 15 grains exist.
    pub async fn update_page(&self, page_id: Uuid, update: PageUpdate) -> Result<Page, ContentError> {
        let mut page = self.load_page(page_id).await?;

        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ContentError::validation("page title must not be empty"));
            }
            page.title = title.to_string();
        }

        let target_type = update.page_type.unwrap_or(page.page_type);
        if target_type == PageType::LegacyText && page.page_type != PageType::LegacyText {
            return Err(ContentError::validation(
                "the legacy 'text' page type can no longer be assigned",
            ));
        }
        page.grain_pattern = match (target_type, update.grain_pattern) {
            (PageType::Custom, Some(types)) => {
                Some(pattern_from_slice(&types).map_err(ContentError::Validation)?)
            }
            (PageType::Custom, None) => page.grain_pattern,
            (other, Some(_)) => {
                return Err(ContentError::validation(format!(
                    "only Custom pages carry a grain pattern (page type is {})",
                    other
                )));
            }
            (_, None) => None,
        };
        page.page_type = target_type;

        let grains = self.store.list_grains(page.id).await?;
        // Missing slots are filled from the page's own pattern when a build resumes.
        if page.page_type == PageType::Custom
            && page.grain_pattern.is_none()
            && grains.len() < GRAINS_PER_PAGE
        {
            return Err(ContentError::validation(format!(
                "page {} has {} of {} grains; a Custom page needs a grain pattern until every slot exists",
                page.id,
                grains.len(),
                GRAINS_PER_PAGE
            )));
        }
        for grain in grains {
            self.enforcer.check_edit(&page, grain.position, grain.grain_type())?;
        }

        self.store.update_page(&page).await?;
        println!("> CourseService: page {} updated (type {})", page.id, page.page_type);
        Ok(page)
    }

    /// Replaces a grain's content. The grain type must match the slot rule
    /// and the content must be well formed; nothing is written otherwise.
    pub async fn save_grain(&self, grain_id: Uuid, content: GrainContent) -> Result<Grain, ContentError> {
        let mut grain: Grain = self
            .store
            .get_grain(grain_id)
            .await?
            .ok_or_else(|| ContentError::not_found("grain", grain_id))?;
        let page = self.load_page(grain.page_id).await?;

        self.enforcer.check_edit(&page, grain.position, content.grain_type())?;
        content
            .is_well_formed()
            .map_err(|violations| ContentError::invalid_content(&violations))?;

        grain.content = content;
        self.store.update_grain(&grain).await?;
        Ok(grain)
    }

    pub async fn completion(&self, course_id: Uuid) -> Result<CompletionSummary, ContentError> {
        self.aggregator.compute(course_id).await
    }

    pub async fn completion_report(&self, course_id: Uuid) -> Result<CompletionReport, ContentError> {
        self.aggregator.compute_report(course_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryContentStore;

    fn service() -> CourseService {
        CourseService::new(
            Arc::new(MemoryContentStore::new()),
            Arc::new(PatternCatalog::builtin()),
            4,
        )
    }

    #[test]
    fn second_build_claim_on_the_same_course_is_refused() {
        let svc = service();
        let course_id = Uuid::new_v4();

        let claim = svc.claim_build(course_id).unwrap();
        assert!(matches!(
            svc.claim_build(course_id),
            Err(ContentError::BuildInProgress(id)) if id == course_id
        ));
        assert!(svc.claim_build(Uuid::new_v4()).is_ok());

        drop(claim);
        assert!(svc.claim_build(course_id).is_ok());
    }

    #[tokio::test]
    async fn blank_course_title_is_rejected() {
        let svc = service();
        let err = svc
            .create_course(NewCourse {
                title: "   ".to_string(),
                description: String::new(),
                cover_image_url: None,
                creator_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }
}
