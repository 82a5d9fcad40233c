//! In-process content store.
//!
//! Mirrors the Postgres constraints that matter to the engine: parent rows
//! must exist, `(parent, position)` is unique, and deleting a course cascades.
//! Used by tests and by the API server when `STORE_BACKEND=memory`.

use super::ContentStore;
use crate::domain::model::{
    Course, Grain, Lesson, Module, NewCourse, NewGrain, NewLesson, NewModule, NewPage, Page,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    courses: HashMap<Uuid, Course>,
    modules: HashMap<Uuid, Module>,
    lessons: HashMap<Uuid, Lesson>,
    pages: HashMap<Uuid, Page>,
    grains: HashMap<Uuid, Grain>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub courses: usize,
    pub modules: usize,
    pub lessons: usize,
    pub pages: usize,
    pub grains: usize,
}

#[derive(Default)]
pub struct MemoryContentStore {
    tables: RwLock<Tables>,
    /// Remaining creates before the store starts refusing them. `None` = unlimited.
    creates_left: Mutex<Option<usize>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the next `n` creates through, then fails every create until
    /// [`clear_create_failures`](Self::clear_create_failures) is called.
    pub fn fail_creates_after(&self, n: usize) {
        *self.creates_left.lock().unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    pub fn clear_create_failures(&self) {
        *self.creates_left.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub async fn counts(&self) -> StoreCounts {
        let t = self.tables.read().await;
        StoreCounts {
            courses: t.courses.len(),
            modules: t.modules.len(),
            lessons: t.lessons.len(),
            pages: t.pages.len(),
            grains: t.grains.len(),
        }
    }

    fn consume_create(&self) -> Result<()> {
        let mut left = self.creates_left.lock().unwrap_or_else(PoisonError::into_inner);
        match left.as_mut() {
            None => Ok(()),
            Some(0) => Err(anyhow!("store refused the create (injected failure)")),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
        }
    }
}

fn sorted_by_position<T: Clone>(rows: impl Iterator<Item = T>, position: impl Fn(&T) -> u32) -> Vec<T> {
    let mut out: Vec<T> = rows.collect();
    out.sort_by_key(|r| position(r));
    out
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course> {
        self.consume_create()?;
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            cover_image_url: new.cover_image_url,
            published: false,
            creator_id: new.creator_id,
            structure_created: false,
            structure_spec: None,
            structure_template: None,
            build_stage: Default::default(),
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let mut t = self.tables.write().await;
        let row = t
            .courses
            .get_mut(&course.id)
            .ok_or_else(|| anyhow!("course {} does not exist", course.id))?;
        *row = course.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.courses.remove(&id).is_none() {
            return Ok(false);
        }
        t.modules.retain(|_, m| m.course_id != id);
        let Tables {
            modules,
            lessons,
            pages,
            grains,
            ..
        } = &mut *t;
        lessons.retain(|_, l| modules.contains_key(&l.module_id));
        pages.retain(|_, p| lessons.contains_key(&p.lesson_id));
        grains.retain(|_, g| pages.contains_key(&g.page_id));
        Ok(true)
    }

    async fn create_module(&self, new: NewModule) -> Result<Module> {
        self.consume_create()?;
        let mut t = self.tables.write().await;
        if !t.courses.contains_key(&new.course_id) {
            return Err(anyhow!("module references missing course {}", new.course_id));
        }
        if t
            .modules
            .values()
            .any(|m| m.course_id == new.course_id && m.position == new.position)
        {
            return Err(anyhow!(
                "duplicate module position {} in course {}",
                new.position,
                new.course_id
            ));
        }
        let module = Module {
            id: Uuid::new_v4(),
            course_id: new.course_id,
            title: new.title,
            position: new.position,
        };
        t.modules.insert(module.id, module.clone());
        Ok(module)
    }

    async fn list_modules(&self, course_id: Uuid) -> Result<Vec<Module>> {
        let t = self.tables.read().await;
        Ok(sorted_by_position(
            t.modules.values().filter(|m| m.course_id == course_id).cloned(),
            |m| m.position,
        ))
    }

    async fn create_lesson(&self, new: NewLesson) -> Result<Lesson> {
        self.consume_create()?;
        let mut t = self.tables.write().await;
        if !t.modules.contains_key(&new.module_id) {
            return Err(anyhow!("lesson references missing module {}", new.module_id));
        }
        if t
            .lessons
            .values()
            .any(|l| l.module_id == new.module_id && l.position == new.position)
        {
            return Err(anyhow!(
                "duplicate lesson position {} in module {}",
                new.position,
                new.module_id
            ));
        }
        let lesson = Lesson {
            id: Uuid::new_v4(),
            module_id: new.module_id,
            title: new.title,
            position: new.position,
            content: new.content,
        };
        t.lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>> {
        let t = self.tables.read().await;
        Ok(sorted_by_position(
            t.lessons.values().filter(|l| l.module_id == module_id).cloned(),
            |l| l.position,
        ))
    }

    async fn create_page(&self, new: NewPage) -> Result<Page> {
        self.consume_create()?;
        let mut t = self.tables.write().await;
        if !t.lessons.contains_key(&new.lesson_id) {
            return Err(anyhow!("page references missing lesson {}", new.lesson_id));
        }
        if t
            .pages
            .values()
            .any(|p| p.lesson_id == new.lesson_id && p.position == new.position)
        {
            return Err(anyhow!(
                "duplicate page position {} in lesson {}",
                new.position,
                new.lesson_id
            ));
        }
        let page = Page {
            id: Uuid::new_v4(),
            lesson_id: new.lesson_id,
            title: new.title,
            position: new.position,
            page_type: new.page_type,
            grain_pattern: new.grain_pattern,
        };
        t.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn get_page(&self, id: Uuid) -> Result<Option<Page>> {
        Ok(self.tables.read().await.pages.get(&id).cloned())
    }

    async fn list_pages(&self, lesson_id: Uuid) -> Result<Vec<Page>> {
        let t = self.tables.read().await;
        Ok(sorted_by_position(
            t.pages.values().filter(|p| p.lesson_id == lesson_id).cloned(),
            |p| p.position,
        ))
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        let mut t = self.tables.write().await;
        let row = t
            .pages
            .get_mut(&page.id)
            .ok_or_else(|| anyhow!("page {} does not exist", page.id))?;
        *row = page.clone();
        Ok(())
    }

    async fn create_grain(&self, new: NewGrain) -> Result<Grain> {
        self.consume_create()?;
        let mut t = self.tables.write().await;
        if !t.pages.contains_key(&new.page_id) {
            return Err(anyhow!("grain references missing page {}", new.page_id));
        }
        if t
            .grains
            .values()
            .any(|g| g.page_id == new.page_id && g.position == new.position)
        {
            return Err(anyhow!(
                "duplicate grain position {} in page {}",
                new.position,
                new.page_id
            ));
        }
        let grain = Grain {
            id: Uuid::new_v4(),
            page_id: new.page_id,
            position: new.position,
            content: new.content,
        };
        t.grains.insert(grain.id, grain.clone());
        Ok(grain)
    }

    async fn get_grain(&self, id: Uuid) -> Result<Option<Grain>> {
        Ok(self.tables.read().await.grains.get(&id).cloned())
    }

    async fn list_grains(&self, page_id: Uuid) -> Result<Vec<Grain>> {
        let t = self.tables.read().await;
        Ok(sorted_by_position(
            t.grains.values().filter(|g| g.page_id == page_id).cloned(),
            |g| g.position,
        ))
    }

    async fn update_grain(&self, grain: &Grain) -> Result<()> {
        let mut t = self.tables.write().await;
        let row = t
            .grains
            .get_mut(&grain.id)
            .ok_or_else(|| anyhow!("grain {} does not exist", grain.id))?;
        *row = grain.clone();
        Ok(())
    }
}
