//! The persistence collaborator for the course tree.
//!
//! Typed create/read/update/delete per entity, keyed by UUID. Child listings
//! come back sorted by `position` ascending. Deleting a course removes every
//! descendant.

use crate::domain::model::{
    Course, Grain, Lesson, Module, NewCourse, NewGrain, NewLesson, NewModule, NewPage, Page,
};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryContentStore;
pub use postgres::PostgresContentStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<()>;

    async fn create_course(&self, new: NewCourse) -> Result<Course>;
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>>;
    async fn update_course(&self, course: &Course) -> Result<()>;
    /// Returns false when no course had this id.
    async fn delete_course(&self, id: Uuid) -> Result<bool>;

    async fn create_module(&self, new: NewModule) -> Result<Module>;
    async fn list_modules(&self, course_id: Uuid) -> Result<Vec<Module>>;

    async fn create_lesson(&self, new: NewLesson) -> Result<Lesson>;
    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>>;

    async fn create_page(&self, new: NewPage) -> Result<Page>;
    async fn get_page(&self, id: Uuid) -> Result<Option<Page>>;
    async fn list_pages(&self, lesson_id: Uuid) -> Result<Vec<Page>>;
    async fn update_page(&self, page: &Page) -> Result<()>;

    async fn create_grain(&self, new: NewGrain) -> Result<Grain>;
    async fn get_grain(&self, id: Uuid) -> Result<Option<Grain>>;
    async fn list_grains(&self, page_id: Uuid) -> Result<Vec<Grain>>;
    async fn update_grain(&self, grain: &Grain) -> Result<()>;
}
