#![allow(dead_code)]

use course_tree_engine::domain::model::{
    AudioToGuess, GrainContent, GrainType, ImagePair, ImagesToGuess, NewCourse, PairsOfImage,
    PairsOfText, TestQuestion, TextPair, TextToComplete, TextToGuess,
};
use course_tree_engine::{
    BuildContext, ContentError, CourseService, MemoryContentStore, PageTemplate, PatternCatalog,
    StructureSpec,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn setup() -> (Arc<MemoryContentStore>, Arc<CourseService>) {
    let store = Arc::new(MemoryContentStore::new());
    let service = Arc::new(CourseService::new(
        store.clone(),
        Arc::new(PatternCatalog::builtin()),
        8,
    ));
    (store, service)
}

pub async fn built_course(
    service: &CourseService,
    spec: StructureSpec,
    template: PageTemplate,
) -> Result<Uuid, ContentError> {
    let course = service
        .create_course(NewCourse {
            title: "Spanish for travellers".to_string(),
            description: String::new(),
            cover_image_url: None,
            creator_id: Uuid::new_v4(),
        })
        .await?;
    service
        .build_structure(course.id, spec, template, &BuildContext::new())
        .await?;
    Ok(course.id)
}

fn three(prefix: &str) -> Vec<String> {
    (1..=3).map(|i| format!("{} {}", prefix, i)).collect()
}

/// Content that passes the save-time validation for `grain_type`.
pub fn authored(grain_type: GrainType) -> GrainContent {
    match grain_type {
        GrainType::TextToComplete => GrainContent::TextToComplete(TextToComplete {
            phrase: "Yo ___ de Madrid".to_string(),
            correct_answer: "soy".to_string(),
            false_alternatives: three("estoy"),
        }),
        GrainType::TestQuestion => GrainContent::TestQuestion(TestQuestion {
            question: "How do you say 'thank you'?".to_string(),
            correct_answer: "gracias".to_string(),
            false_alternatives: three("hola"),
        }),
        GrainType::ImagesToGuess => GrainContent::ImagesToGuess(ImagesToGuess {
            correct_image_url: "https://cdn.example.test/cat.png".to_string(),
            false_image_urls: three("https://cdn.example.test/dog"),
            correct_word: "gato".to_string(),
        }),
        GrainType::TextToGuess => GrainContent::TextToGuess(TextToGuess {
            image_url: "https://cdn.example.test/house.png".to_string(),
            correct_answer: "casa".to_string(),
            false_alternatives: three("coche"),
        }),
        GrainType::AudioToGuess => GrainContent::AudioToGuess(AudioToGuess {
            correct_word: "agua".to_string(),
            correct_audio_url: "https://cdn.example.test/agua.mp3".to_string(),
            false_audio_urls: three("https://cdn.example.test/other"),
        }),
        GrainType::PairsOfText => GrainContent::PairsOfText(PairsOfText {
            pairs: ["uno", "dos", "tres", "cuatro"]
                .iter()
                .zip(["one", "two", "three", "four"])
                .map(|(l, r)| TextPair {
                    left: l.to_string(),
                    right: r.to_string(),
                })
                .collect(),
        }),
        GrainType::PairsOfImage => GrainContent::PairsOfImage(PairsOfImage {
            pairs: ["sol", "luna", "mar", "cielo"]
                .iter()
                .map(|w| ImagePair {
                    image_url: format!("https://cdn.example.test/{}.png", w),
                    text: w.to_string(),
                })
                .collect(),
        }),
    }
}
