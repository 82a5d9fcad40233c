//! Content store backed by PostgreSQL.

use super::ContentStore;
use crate::domain::model::{
    Course, Grain, GrainContent, GrainPattern, Lesson, Module, NewCourse, NewGrain, NewLesson,
    NewModule, NewPage, Page,
};
use crate::domain::structure::{PageTemplate, StructureSpec};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Schema statements, in dependency order. Every child row cascades with its parent.
/// The `ALTER` upgrades `courses` tables created before templates were stored.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS courses (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        cover_image_url TEXT,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        creator_id UUID NOT NULL,
        structure_created BOOLEAN NOT NULL DEFAULT FALSE,
        modules_count INTEGER,
        lessons_per_module INTEGER,
        pages_per_lesson INTEGER,
        structure_template JSONB,
        build_stage TEXT NOT NULL DEFAULT 'not_started',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "ALTER TABLE courses ADD COLUMN IF NOT EXISTS structure_template JSONB",
    "CREATE TABLE IF NOT EXISTS modules (
        id UUID PRIMARY KEY,
        course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        position INTEGER NOT NULL,
        UNIQUE (course_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS lessons (
        id UUID PRIMARY KEY,
        module_id UUID NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        position INTEGER NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        UNIQUE (module_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS pages (
        id UUID PRIMARY KEY,
        lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        position INTEGER NOT NULL,
        page_type TEXT NOT NULL,
        grain_pattern JSONB,
        UNIQUE (lesson_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS grains (
        id UUID PRIMARY KEY,
        page_id UUID NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
        position INTEGER NOT NULL CHECK (position BETWEEN 1 AND 15),
        grain_type TEXT NOT NULL,
        content JSONB NOT NULL,
        UNIQUE (page_id, position)
    )",
];

/// Tables this store owns, as checked by the preflight binary.
pub const CONTENT_TABLES: &[&str] = &["courses", "modules", "lessons", "pages", "grains"];

#[derive(Clone)]
pub struct PostgresContentStore {
    pool: PgPool,
}

impl PostgresContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the content tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Names of the content tables missing from the `public` schema.
    pub async fn missing_tables(&self) -> Result<Vec<String>> {
        let present: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables
             WHERE table_schema = 'public' AND table_name = ANY($1)",
        )
        .bind(CONTENT_TABLES.iter().map(|t| t.to_string()).collect::<Vec<String>>())
        .fetch_all(&self.pool)
        .await?;
        Ok(CONTENT_TABLES
            .iter()
            .filter(|t| !present.iter().any(|p| p == *t))
            .map(|t| t.to_string())
            .collect())
    }
}

fn to_db_position(position: u32) -> Result<i32> {
    i32::try_from(position).with_context(|| format!("position {} does not fit the schema", position))
}

fn from_db_position(row: &PgRow) -> Result<u32> {
    let raw: i32 = row.try_get("position")?;
    u32::try_from(raw).with_context(|| format!("negative position {} in database", raw))
}

fn course_from_row(row: &PgRow) -> Result<Course> {
    let counts: (Option<i32>, Option<i32>, Option<i32>) = (
        row.try_get("modules_count")?,
        row.try_get("lessons_per_module")?,
        row.try_get("pages_per_lesson")?,
    );
    let structure_spec = match counts {
        (Some(m), Some(l), Some(p)) => Some(StructureSpec::new(
            u32::try_from(m)?,
            u32::try_from(l)?,
            u32::try_from(p)?,
        )),
        _ => None,
    };
    let structure_template: Option<Json<PageTemplate>> = row.try_get("structure_template")?;
    let build_stage: String = row.try_get("build_stage")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    Ok(Course {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        cover_image_url: row.try_get("cover_image_url")?,
        published: row.try_get("published")?,
        creator_id: row.try_get("creator_id")?,
        structure_created: row.try_get("structure_created")?,
        structure_spec,
        structure_template: structure_template.map(|Json(t)| t),
        build_stage: build_stage.parse()?,
        created_at,
        updated_at,
    })
}

fn module_from_row(row: &PgRow) -> Result<Module> {
    Ok(Module {
        id: row.try_get("id")?,
        course_id: row.try_get("course_id")?,
        title: row.try_get("title")?,
        position: from_db_position(row)?,
    })
}

fn lesson_from_row(row: &PgRow) -> Result<Lesson> {
    Ok(Lesson {
        id: row.try_get("id")?,
        module_id: row.try_get("module_id")?,
        title: row.try_get("title")?,
        position: from_db_position(row)?,
        content: row.try_get("content")?,
    })
}

fn page_from_row(row: &PgRow) -> Result<Page> {
    let page_type: String = row.try_get("page_type")?;
    let grain_pattern: Option<Json<GrainPattern>> = row.try_get("grain_pattern")?;
    Ok(Page {
        id: row.try_get("id")?,
        lesson_id: row.try_get("lesson_id")?,
        title: row.try_get("title")?,
        position: from_db_position(row)?,
        page_type: page_type.parse()?,
        grain_pattern: grain_pattern.map(|Json(p)| p),
    })
}

fn grain_from_row(row: &PgRow) -> Result<Grain> {
    let Json(content): Json<GrainContent> = row.try_get("content")?;
    Ok(Grain {
        id: row.try_get("id")?,
        page_id: row.try_get("page_id")?,
        position: from_db_position(row)?,
        content,
    })
}

fn spec_columns(spec: Option<StructureSpec>) -> Result<[Option<i32>; 3]> {
    Ok(match spec {
        Some(s) => [
            Some(i32::try_from(s.modules_count)?),
            Some(i32::try_from(s.lessons_per_module)?),
            Some(i32::try_from(s.pages_per_lesson)?),
        ],
        None => [None, None, None],
    })
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO courses (id, title, description, cover_image_url, creator_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.cover_image_url)
        .bind(new.creator_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        course_from_row(&row)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
        let row = sqlx::query("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let [modules_count, lessons_per_module, pages_per_lesson] =
            spec_columns(course.structure_spec)?;
        let result = sqlx::query(
            "UPDATE courses SET title = $2, description = $3, cover_image_url = $4, published = $5,
                structure_created = $6, modules_count = $7, lessons_per_module = $8,
                pages_per_lesson = $9, build_stage = $10, structure_template = $11,
                updated_at = now()
             WHERE id = $1",
        )
        .bind(course.id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.cover_image_url)
        .bind(course.published)
        .bind(course.structure_created)
        .bind(modules_count)
        .bind(lessons_per_module)
        .bind(pages_per_lesson)
        .bind(course.build_stage.as_str())
        .bind(course.structure_template.map(Json))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("course {} does not exist", course.id));
        }
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_module(&self, new: NewModule) -> Result<Module> {
        let row = sqlx::query(
            "INSERT INTO modules (id, course_id, title, position) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.course_id)
        .bind(&new.title)
        .bind(to_db_position(new.position)?)
        .fetch_one(&self.pool)
        .await?;
        module_from_row(&row)
    }

    async fn list_modules(&self, course_id: Uuid) -> Result<Vec<Module>> {
        let rows = sqlx::query("SELECT * FROM modules WHERE course_id = $1 ORDER BY position ASC")
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(module_from_row).collect()
    }

    async fn create_lesson(&self, new: NewLesson) -> Result<Lesson> {
        let row = sqlx::query(
            "INSERT INTO lessons (id, module_id, title, position, content)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.module_id)
        .bind(&new.title)
        .bind(to_db_position(new.position)?)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await?;
        lesson_from_row(&row)
    }

    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>> {
        let rows = sqlx::query("SELECT * FROM lessons WHERE module_id = $1 ORDER BY position ASC")
            .bind(module_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(lesson_from_row).collect()
    }

    async fn create_page(&self, new: NewPage) -> Result<Page> {
        let row = sqlx::query(
            "INSERT INTO pages (id, lesson_id, title, position, page_type, grain_pattern)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.lesson_id)
        .bind(&new.title)
        .bind(to_db_position(new.position)?)
        .bind(new.page_type.as_str())
        .bind(new.grain_pattern.map(Json))
        .fetch_one(&self.pool)
        .await?;
        page_from_row(&row)
    }

    async fn get_page(&self, id: Uuid) -> Result<Option<Page>> {
        let row = sqlx::query("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(page_from_row).transpose()
    }

    async fn list_pages(&self, lesson_id: Uuid) -> Result<Vec<Page>> {
        let rows = sqlx::query("SELECT * FROM pages WHERE lesson_id = $1 ORDER BY position ASC")
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(page_from_row).collect()
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        let result = sqlx::query(
            "UPDATE pages SET title = $2, position = $3, page_type = $4, grain_pattern = $5 WHERE id = $1",
        )
        .bind(page.id)
        .bind(&page.title)
        .bind(to_db_position(page.position)?)
        .bind(page.page_type.as_str())
        .bind(page.grain_pattern.map(Json))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("page {} does not exist", page.id));
        }
        Ok(())
    }

    async fn create_grain(&self, new: NewGrain) -> Result<Grain> {
        let row = sqlx::query(
            "INSERT INTO grains (id, page_id, position, grain_type, content)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.page_id)
        .bind(to_db_position(new.position)?)
        .bind(new.content.grain_type().as_str())
        .bind(Json(&new.content))
        .fetch_one(&self.pool)
        .await?;
        grain_from_row(&row)
    }

    async fn get_grain(&self, id: Uuid) -> Result<Option<Grain>> {
        let row = sqlx::query("SELECT * FROM grains WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(grain_from_row).transpose()
    }

    async fn list_grains(&self, page_id: Uuid) -> Result<Vec<Grain>> {
        let rows = sqlx::query("SELECT * FROM grains WHERE page_id = $1 ORDER BY position ASC")
            .bind(page_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(grain_from_row).collect()
    }

    async fn update_grain(&self, grain: &Grain) -> Result<()> {
        let result = sqlx::query(
            "UPDATE grains SET grain_type = $2, content = $3 WHERE id = $1",
        )
        .bind(grain.id)
        .bind(grain.grain_type().as_str())
        .bind(Json(&grain.content))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("grain {} does not exist", grain.id));
        }
        Ok(())
    }
}
