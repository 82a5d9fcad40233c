//! Structure builds against the in-memory store: exact counts, grain types
//! in pattern order, resume after failure, cancellation and rejections.

use course_tree_engine::domain::model::{BuildStage, Grain, GrainType, NewCourse, GRAINS_PER_PAGE};
use course_tree_engine::{
    BuildContext, ContentError, ContentStore, CourseService, MemoryContentStore, PageTemplate,
    PageType, PageUpdate, PatternCatalog, StructureSpec, TreeBuilder,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn setup(concurrency: usize) -> (Arc<MemoryContentStore>, CourseService) {
    let store = Arc::new(MemoryContentStore::new());
    let service = CourseService::new(
        store.clone(),
        Arc::new(PatternCatalog::builtin()),
        concurrency,
    );
    (store, service)
}

async fn new_course(service: &CourseService, title: &str) -> Result<Uuid, ContentError> {
    let course = service
        .create_course(NewCourse {
            title: title.to_string(),
            description: "built by tests".to_string(),
            cover_image_url: None,
            creator_id: Uuid::new_v4(),
        })
        .await?;
    Ok(course.id)
}

/// Every grain of the course, pages visited in (module, lesson, page) order.
async fn grains_by_page(
    store: &MemoryContentStore,
    course_id: Uuid,
) -> Result<Vec<Vec<Grain>>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    for module in store.list_modules(course_id).await? {
        for lesson in store.list_lessons(module.id).await? {
            for page in store.list_pages(lesson.id).await? {
                out.push(store.list_grains(page.id).await?);
            }
        }
    }
    Ok(out)
}

#[tokio::test]
async fn test_counts_match_the_spec() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_counts_match_the_spec ---");

    for (m, l, p) in [(1, 1, 1), (2, 3, 1), (3, 2, 4), (1, 4, 2)] {
        let (store, service) = setup(8);
        let course_id = new_course(&service, "counts").await?;
        let spec = StructureSpec::new(m, l, p);

        let report = service
            .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
            .await?;

        let totals = spec.totals();
        let counts = store.counts().await;
        assert_eq!(counts.modules as u64, totals.modules);
        assert_eq!(counts.lessons as u64, totals.lessons);
        assert_eq!(counts.pages as u64, totals.pages);
        assert_eq!(counts.grains as u64, totals.grains);
        assert_eq!(totals.grains, u64::from(m * l * p) * GRAINS_PER_PAGE as u64);
        assert_eq!(report.grains.created, totals.grains);
        assert_eq!(report.grains.reused, 0);

        let course = service.get_course(course_id).await?;
        assert!(course.structure_created);
        assert_eq!(course.build_stage, BuildStage::Complete);
        assert_eq!(course.structure_spec, Some(spec));
    }
    Ok(())
}

#[tokio::test]
async fn test_single_introduction_page_follows_the_catalog() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_single_introduction_page_follows_the_catalog ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "intro").await?;

    service
        .build_structure(
            course_id,
            StructureSpec::new(1, 1, 1),
            PageTemplate::Predefined(PageType::Introduction),
            &BuildContext::new(),
        )
        .await?;

    let modules = store.list_modules(course_id).await?;
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].title, "Module 1");
    let lessons = store.list_lessons(modules[0].id).await?;
    assert_eq!(lessons.len(), 1);
    let pages = store.list_pages(lessons[0].id).await?;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_type, PageType::Introduction);
    assert_eq!(pages[0].grain_pattern, None);

    let grains = store.list_grains(pages[0].id).await?;
    let positions: Vec<u32> = grains.iter().map(|g| g.position).collect();
    assert_eq!(positions, (1..=15).collect::<Vec<u32>>());

    let expected = PatternCatalog::builtin()
        .pattern_for(PageType::Introduction)
        .copied()
        .ok_or("no introduction pattern")?;
    let types: Vec<GrainType> = grains.iter().map(|g| g.grain_type()).collect();
    assert_eq!(types, expected.to_vec());
    assert_eq!(types[7], GrainType::PairsOfText);
    assert_eq!(types[14], GrainType::PairsOfText);

    // Fresh grains are placeholders, not authored content.
    assert!(grains.iter().all(|g| !g.content.has_any_content()));
    Ok(())
}

#[tokio::test]
async fn test_custom_pattern_is_used_for_every_slot() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_custom_pattern_is_used_for_every_slot ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "custom").await?;

    let pattern = [GrainType::TestQuestion; GRAINS_PER_PAGE];
    service
        .build_structure(
            course_id,
            StructureSpec::new(1, 2, 2),
            PageTemplate::Custom(pattern),
            &BuildContext::new(),
        )
        .await?;

    let pages = grains_by_page(&store, course_id).await?;
    assert_eq!(pages.len(), 4);
    for grains in pages {
        assert_eq!(grains.len(), GRAINS_PER_PAGE);
        assert!(grains.iter().all(|g| g.grain_type() == GrainType::TestQuestion));
    }

    let enforcer = service.enforcer();
    for position in 1..=15 {
        assert_eq!(
            enforcer.required_type(PageType::Custom, Some(&pattern), position)?,
            Some(GrainType::TestQuestion)
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_resume_after_store_failure() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_resume_after_store_failure ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "resume").await?;
    let spec = StructureSpec::new(2, 2, 2);

    // 2 modules + 4 lessons + 8 pages go through, then a handful of grains.
    store.fail_creates_after(20);
    let err = service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Persistence(_)), "got {:?}", err);

    let course = service.get_course(course_id).await?;
    assert!(!course.structure_created);
    assert_eq!(course.build_stage, BuildStage::PagesDone);
    assert_eq!(course.structure_spec, Some(spec));
    let partial = store.counts().await;
    assert_eq!((partial.modules, partial.lessons, partial.pages), (2, 4, 8));
    assert!(partial.grains <= 6);

    store.clear_create_failures();
    let report = service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await?;

    assert_eq!(report.modules.reused, 2);
    assert_eq!(report.modules.created, 0);
    assert_eq!(report.pages.reused, 8);
    assert_eq!(report.grains.total(), 120);
    assert_eq!(report.grains.reused, partial.grains as u64);

    let counts = store.counts().await;
    assert_eq!((counts.modules, counts.lessons, counts.pages, counts.grains), (2, 4, 8, 120));
    for grains in grains_by_page(&store, course_id).await? {
        let positions: HashSet<u32> = grains.iter().map(|g| g.position).collect();
        assert_eq!(positions.len(), GRAINS_PER_PAGE, "duplicate grain positions");
    }

    let course = service.get_course(course_id).await?;
    assert!(course.structure_created);
    assert_eq!(course.build_stage, BuildStage::Complete);
    Ok(())
}

#[tokio::test]
async fn test_failure_at_module_level_leaves_flag_unset() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_failure_at_module_level_leaves_flag_unset ---");
    let (store, service) = setup(1);
    let course_id = new_course(&service, "early failure").await?;

    store.fail_creates_after(1);
    let result = service
        .build_structure(
            course_id,
            StructureSpec::new(3, 1, 1),
            PageTemplate::default(),
            &BuildContext::new(),
        )
        .await;
    assert!(result.is_err());

    let course = service.get_course(course_id).await?;
    assert!(!course.structure_created);
    assert_eq!(course.build_stage, BuildStage::NotStarted);
    assert_eq!(store.counts().await.lessons, 0);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_build_creates_nothing() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_cancelled_build_creates_nothing ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "cancelled").await?;

    let ctx = BuildContext::new();
    ctx.cancel();
    let err = service
        .build_structure(course_id, StructureSpec::new(2, 2, 2), PageTemplate::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Cancelled));

    let course = service.get_course(course_id).await?;
    assert!(!course.structure_created);
    assert_eq!(store.counts().await.modules, 0);

    // A fresh context resumes normally.
    service
        .build_structure(
            course_id,
            StructureSpec::new(2, 2, 2),
            PageTemplate::default(),
            &BuildContext::new(),
        )
        .await?;
    assert_eq!(store.counts().await.grains, 120);
    Ok(())
}

#[tokio::test]
async fn test_invalid_and_repeated_builds_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_invalid_and_repeated_builds_are_rejected ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "rejections").await?;
    let ctx = BuildContext::new();

    for spec in [
        StructureSpec::new(0, 1, 1),
        StructureSpec::new(1, 0, 1),
        StructureSpec::new(1, 1, 0),
    ] {
        let err = service
            .build_structure(course_id, spec, PageTemplate::default(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)), "got {:?}", err);
    }

    let err = service
        .build_structure(
            course_id,
            StructureSpec::new(1, 1, 1),
            PageTemplate::Predefined(PageType::LegacyText),
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));
    assert_eq!(store.counts().await.modules, 0);

    let err = service
        .build_structure(Uuid::new_v4(), StructureSpec::new(1, 1, 1), PageTemplate::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound { entity: "course", .. }));

    service
        .build_structure(course_id, StructureSpec::new(1, 1, 1), PageTemplate::default(), &ctx)
        .await?;
    let err = service
        .build_structure(course_id, StructureSpec::new(1, 1, 1), PageTemplate::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::StructureAlreadyCreated(id) if id == course_id));
    assert_eq!(store.counts().await.grains, 15);
    Ok(())
}

#[tokio::test]
async fn test_spec_cannot_change_on_resume() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_spec_cannot_change_on_resume ---");
    let store = Arc::new(MemoryContentStore::new());
    let builder = TreeBuilder::new(store.clone(), Arc::new(PatternCatalog::builtin()), 2);
    let service = CourseService::new(store.clone(), Arc::new(PatternCatalog::builtin()), 2);
    let course_id = new_course(&service, "immutable spec").await?;

    store.fail_creates_after(3);
    assert!(builder
        .build(course_id, StructureSpec::new(2, 2, 1), PageTemplate::default(), &BuildContext::new())
        .await
        .is_err());
    store.clear_create_failures();

    let err = builder
        .build(course_id, StructureSpec::new(3, 2, 1), PageTemplate::default(), &BuildContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)), "got {:?}", err);

    builder
        .build(course_id, StructureSpec::new(2, 2, 1), PageTemplate::default(), &BuildContext::new())
        .await?;
    assert_eq!(store.counts().await.pages, 4);
    Ok(())
}

#[tokio::test]
async fn test_page_template_cannot_change_on_resume() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_page_template_cannot_change_on_resume ---");
    let (store, service) = setup(2);
    let course_id = new_course(&service, "immutable template").await?;
    let spec = StructureSpec::new(1, 2, 1);
    let review = PageTemplate::Predefined(PageType::Review);

    // module + 2 lessons, then at most one of the 2 pages.
    store.fail_creates_after(4);
    assert!(service
        .build_structure(course_id, spec, review, &BuildContext::new())
        .await
        .is_err());
    store.clear_create_failures();
    assert_eq!(service.get_course(course_id).await?.structure_template, Some(review));
    let partial_pages = store.counts().await.pages;
    assert!(partial_pages <= 1);

    for other in [
        PageTemplate::Predefined(PageType::Booster),
        PageTemplate::default(),
        PageTemplate::Custom([GrainType::TestQuestion; GRAINS_PER_PAGE]),
    ] {
        let err = service
            .build_structure(course_id, spec, other, &BuildContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)), "got {:?}", err);
    }
    assert_eq!(store.counts().await.pages, partial_pages);

    service
        .build_structure(course_id, spec, review, &BuildContext::new())
        .await?;
    let mut page_types = Vec::new();
    for module in store.list_modules(course_id).await? {
        for lesson in store.list_lessons(module.id).await? {
            for page in store.list_pages(lesson.id).await? {
                page_types.push(page.page_type);
            }
        }
    }
    assert_eq!(page_types, vec![PageType::Review, PageType::Review]);
    Ok(())
}

#[tokio::test]
async fn test_oversized_spec_is_rejected_before_any_write() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_oversized_spec_is_rejected_before_any_write ---");
    let (store, service) = setup(4);
    let course_id = new_course(&service, "too big").await?;

    let err = service
        .build_structure(
            course_id,
            StructureSpec::new(1 << 21, 1 << 21, 1 << 21),
            PageTemplate::default(),
            &BuildContext::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)), "got {:?}", err);

    let course = service.get_course(course_id).await?;
    assert_eq!(course.structure_spec, None);
    assert_eq!(store.counts().await.modules, 0);
    Ok(())
}

#[tokio::test]
async fn test_custom_page_without_pattern_cannot_stall_a_resume() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_custom_page_without_pattern_cannot_stall_a_resume ---");
    let (store, service) = setup(2);
    let course_id = new_course(&service, "edited mid build").await?;
    let spec = StructureSpec::new(1, 1, 2);

    // module + lesson + both pages, no grains yet.
    store.fail_creates_after(4);
    assert!(service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await
        .is_err());
    store.clear_create_failures();

    let module = store.list_modules(course_id).await?.remove(0);
    let lesson = store.list_lessons(module.id).await?.remove(0);
    let pages = store.list_pages(lesson.id).await?;
    assert_eq!(pages.len(), 2);
    assert_eq!(store.list_grains(pages[0].id).await?.len(), 0);

    let err = service
        .update_page(
            pages[0].id,
            PageUpdate {
                page_type: Some(PageType::Custom),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)), "got {:?}", err);
    assert_eq!(store.get_page(pages[0].id).await?.ok_or("page vanished")?, pages[0]);

    service
        .update_page(
            pages[0].id,
            PageUpdate {
                page_type: Some(PageType::Custom),
                grain_pattern: Some(vec![GrainType::TestQuestion; GRAINS_PER_PAGE]),
                ..Default::default()
            },
        )
        .await?;

    service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await?;
    assert!(service.get_course(course_id).await?.structure_created);
    let grains = store.list_grains(pages[0].id).await?;
    assert_eq!(grains.len(), GRAINS_PER_PAGE);
    assert!(grains.iter().all(|g| g.grain_type() == GrainType::TestQuestion));
    Ok(())
}

#[tokio::test]
async fn test_resume_skips_pages_whose_grains_all_exist() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_resume_skips_pages_whose_grains_all_exist ---");
    let (store, service) = setup(2);
    let course_id = new_course(&service, "free page").await?;
    let spec = StructureSpec::new(1, 1, 1);
    service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await?;

    // A fully grained page turned into a pattern-less Custom page, with the
    // course rolled back to before the grain level finished.
    let module = store.list_modules(course_id).await?.remove(0);
    let lesson = store.list_lessons(module.id).await?.remove(0);
    let mut page = store.list_pages(lesson.id).await?.remove(0);
    page.page_type = PageType::Custom;
    page.grain_pattern = None;
    store.update_page(&page).await?;
    let mut course = service.get_course(course_id).await?;
    course.structure_created = false;
    course.build_stage = BuildStage::PagesDone;
    store.update_course(&course).await?;

    let report = service
        .build_structure(course_id, spec, PageTemplate::default(), &BuildContext::new())
        .await?;
    assert_eq!(report.grains.created, 0);
    assert_eq!(report.grains.reused, GRAINS_PER_PAGE as u64);
    assert!(service.get_course(course_id).await?.structure_created);
    Ok(())
}

#[tokio::test]
async fn test_delete_course_removes_the_tree() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_delete_course_removes_the_tree ---");
    let (store, service) = setup(4);
    let keep = new_course(&service, "keep").await?;
    let drop_me = new_course(&service, "drop").await?;
    for id in [keep, drop_me] {
        service
            .build_structure(id, StructureSpec::new(1, 1, 2), PageTemplate::default(), &BuildContext::new())
            .await?;
    }

    service.delete_course(drop_me).await?;
    let counts = store.counts().await;
    assert_eq!((counts.courses, counts.modules, counts.pages, counts.grains), (1, 1, 2, 30));
    assert!(matches!(
        service.delete_course(drop_me).await,
        Err(ContentError::NotFound { .. })
    ));
    Ok(())
}
