//! Domain model for the course content tree.
//!
//! Course → Module → Lesson → Page → Grain. Every child carries the id of its
//! owning parent and a 1-based `position` that defines sibling order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod content;

pub use content::{
    AudioToGuess, ContentViolation, GrainContent, ImagePair, ImagesToGuess, PairsOfImage,
    PairsOfText, TestQuestion, TextPair, TextToComplete, TextToGuess,
};

use crate::domain::structure::{PageTemplate, StructureSpec};

/// Every page holds exactly this many grains.
pub const GRAINS_PER_PAGE: usize = 15;

/// Ordered grain types for the 15 slots of a page.
pub type GrainPattern = [GrainType; GRAINS_PER_PAGE];

/// Exercise kinds a grain can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum GrainType {
    TextToComplete,
    TestQuestion,
    ImagesToGuess,
    TextToGuess,
    AudioToGuess,
    PairsOfText,
    PairsOfImage,
}

impl GrainType {
    pub const ALL: [GrainType; 7] = [
        GrainType::TextToComplete,
        GrainType::TestQuestion,
        GrainType::ImagesToGuess,
        GrainType::TextToGuess,
        GrainType::AudioToGuess,
        GrainType::PairsOfText,
        GrainType::PairsOfImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrainType::TextToComplete => "textToComplete",
            GrainType::TestQuestion => "testQuestion",
            GrainType::ImagesToGuess => "imagesToGuess",
            GrainType::TextToGuess => "textToGuess",
            GrainType::AudioToGuess => "audioToGuess",
            GrainType::PairsOfText => "pairsOfText",
            GrainType::PairsOfImage => "pairsOfImage",
        }
    }
}

impl fmt::Display for GrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrainType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrainType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown grain type '{}'", s))
    }
}

/// Template selector for a page. `LegacyText` is a deprecated free-form value
/// kept readable for old data; new builds never produce it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum PageType {
    #[default]
    Introduction,
    Booster,
    Comparation,
    Review,
    Custom,
    #[serde(rename = "text")]
    LegacyText,
}

impl PageType {
    /// Page types with a fixed pattern in the catalog.
    pub const PREDEFINED: [PageType; 4] = [
        PageType::Introduction,
        PageType::Booster,
        PageType::Comparation,
        PageType::Review,
    ];

    pub fn is_predefined(&self) -> bool {
        Self::PREDEFINED.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Introduction => "Introduction",
            PageType::Booster => "Booster",
            PageType::Comparation => "Comparation",
            PageType::Review => "Review",
            PageType::Custom => "Custom",
            PageType::LegacyText => "text",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Introduction" => Ok(PageType::Introduction),
            "Booster" => Ok(PageType::Booster),
            "Comparation" => Ok(PageType::Comparation),
            "Review" => Ok(PageType::Review),
            "Custom" => Ok(PageType::Custom),
            "text" => Ok(PageType::LegacyText),
            other => Err(anyhow::anyhow!("Unknown page type '{}'", other)),
        }
    }
}

/// Checkpoint persisted on the course while its structure is being built.
///
/// Stages only move forward; a retry reads it to report where the previous
/// run stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    #[default]
    NotStarted,
    ModulesDone,
    LessonsDone,
    PagesDone,
    Complete,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::NotStarted => "not_started",
            BuildStage::ModulesDone => "modules_done",
            BuildStage::LessonsDone => "lessons_done",
            BuildStage::PagesDone => "pages_done",
            BuildStage::Complete => "complete",
        }
    }
}

impl FromStr for BuildStage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(BuildStage::NotStarted),
            "modules_done" => Ok(BuildStage::ModulesDone),
            "lessons_done" => Ok(BuildStage::LessonsDone),
            "pages_done" => Ok(BuildStage::PagesDone),
            "complete" => Ok(BuildStage::Complete),
            other => Err(anyhow::anyhow!("Unknown build stage '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub creator_id: Uuid,
    pub structure_created: bool,
    /// Persisted on the first build attempt, immutable afterwards.
    pub structure_spec: Option<StructureSpec>,
    /// Page template of the first build attempt, persisted with the spec.
    pub structure_template: Option<PageTemplate>,
    pub build_stage: BuildStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: u32,
}

#[derive(Debug, Clone)]
pub struct NewModule {
    pub course_id: Uuid,
    pub title: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: u32,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub module_id: Uuid,
    pub title: String,
    pub position: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub position: u32,
    pub page_type: PageType,
    /// Only populated for `Custom` pages.
    pub grain_pattern: Option<GrainPattern>,
}

#[derive(Debug, Clone)]
pub struct NewPage {
    pub lesson_id: Uuid,
    pub title: String,
    pub position: u32,
    pub page_type: PageType,
    pub grain_pattern: Option<GrainPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grain {
    pub id: Uuid,
    pub page_id: Uuid,
    /// 1..=15, unique within the page.
    pub position: u32,
    pub content: GrainContent,
}

impl Grain {
    pub fn grain_type(&self) -> GrainType {
        self.content.grain_type()
    }
}

#[derive(Debug, Clone)]
pub struct NewGrain {
    pub page_id: Uuid,
    pub position: u32,
    pub content: GrainContent,
}

/// Converts a caller-supplied list into a 15-slot pattern.
pub fn pattern_from_slice(types: &[GrainType]) -> Result<GrainPattern, String> {
    types.try_into().map_err(|_| {
        format!(
            "grain pattern must list exactly {} grain types, got {}",
            GRAINS_PER_PAGE,
            types.len()
        )
    })
}
